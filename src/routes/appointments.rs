use actix_web::{delete, get, post, put, web, HttpResponse};

use crate::error::ApiResult;
use crate::middleware::AuthDoctor;
use crate::models::dto::{ApiResponse, CreateAppointmentRequest, UpdateAppointmentRequest, UpdateStatusRequest};
use crate::services::AppointmentLedger;

/// POST /appointments - Créer un rendez-vous
#[post("")]
pub async fn create_appointment(
    auth: AuthDoctor,
    body: web::Json<CreateAppointmentRequest>,
    ledger: web::Data<AppointmentLedger>,
) -> ApiResult<HttpResponse> {
    let request = body.into_inner();
    if let Some(doctor_id) = request.doctor_id {
        auth.ensure_owner(doctor_id)?;
    }

    let record = ledger.create(request).await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(record).with_message("Appointment created successfully")))
}

/// GET /appointments/doctor/{doctor_id} - Agenda du médecin
#[get("/doctor/{doctor_id}")]
pub async fn list_by_doctor(
    auth: AuthDoctor,
    path: web::Path<i32>,
    ledger: web::Data<AppointmentLedger>,
) -> ApiResult<HttpResponse> {
    let doctor_id = path.into_inner();
    auth.ensure_owner(doctor_id)?;

    let agenda = ledger.list_by_doctor(doctor_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(agenda)))
}

/// PUT /appointments/{id}/status - Changer le statut
#[put("/{id}/status")]
pub async fn update_status(
    auth: AuthDoctor,
    path: web::Path<i32>,
    body: web::Json<UpdateStatusRequest>,
    ledger: web::Data<AppointmentLedger>,
) -> ApiResult<HttpResponse> {
    let record = ledger
        .update_status(auth.doctor_id, path.into_inner(), &body.status)
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(record).with_message("Status updated successfully")))
}

/// PUT /appointments/{id} - Modification partielle
#[put("/{id}")]
pub async fn update_appointment(
    auth: AuthDoctor,
    path: web::Path<i32>,
    body: web::Json<UpdateAppointmentRequest>,
    ledger: web::Data<AppointmentLedger>,
) -> ApiResult<HttpResponse> {
    let record = ledger
        .update(auth.doctor_id, path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(record).with_message("Appointment updated successfully")))
}

/// DELETE /appointments/{id}
#[delete("/{id}")]
pub async fn delete_appointment(
    auth: AuthDoctor,
    path: web::Path<i32>,
    ledger: web::Data<AppointmentLedger>,
) -> ApiResult<HttpResponse> {
    ledger.delete(auth.doctor_id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::acknowledge("Appointment deleted successfully")))
}

pub fn appointment_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/appointments")
            .service(create_appointment)
            .service(list_by_doctor)
            .service(update_status)
            .service(update_appointment)
            .service(delete_appointment),
    );
}
