use actix_web::{delete, get, post, put, web, HttpResponse};

use crate::error::ApiResult;
use crate::middleware::AuthDoctor;
use crate::models::dto::{
    ApiResponse, CreatePatientRequest, DeleteOutcome, DeletePatientResponse, SearchQuery,
    UpdatePatientRequest,
};
use crate::services::PatientDirectory;

/// GET /patient/details/{patient_id} - Fiche patient + compteurs
#[get("/details/{patient_id}")]
pub async fn get_details(
    auth: AuthDoctor,
    path: web::Path<i32>,
    directory: web::Data<PatientDirectory>,
) -> ApiResult<HttpResponse> {
    let details = directory.get_by_id(auth.doctor_id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(details)))
}

/// GET /patient/stats/{doctor_id} - Statistiques des patients
#[get("/stats/{doctor_id}")]
pub async fn get_stats(
    auth: AuthDoctor,
    path: web::Path<i32>,
    directory: web::Data<PatientDirectory>,
) -> ApiResult<HttpResponse> {
    let doctor_id = path.into_inner();
    auth.ensure_owner(doctor_id)?;

    let stats = directory.stats(doctor_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(stats)))
}

/// POST /patient/add - Ajouter un patient
#[post("/add")]
pub async fn add_patient(
    auth: AuthDoctor,
    body: web::Json<CreatePatientRequest>,
    directory: web::Data<PatientDirectory>,
) -> ApiResult<HttpResponse> {
    let request = body.into_inner();
    if let Some(doctor_id) = request.doctor_id {
        auth.ensure_owner(doctor_id)?;
    }

    let patient = directory.create(request).await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(patient).with_message("Patient added successfully")))
}

/// GET /patient/{doctor_id}?search= - Liste (et recherche) des patients
#[get("/{doctor_id}")]
pub async fn list_patients(
    auth: AuthDoctor,
    path: web::Path<i32>,
    query: web::Query<SearchQuery>,
    directory: web::Data<PatientDirectory>,
) -> ApiResult<HttpResponse> {
    let doctor_id = path.into_inner();
    auth.ensure_owner(doctor_id)?;

    let patients = directory.list(doctor_id, query.search.as_deref()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(patients)))
}

/// PUT /patient/{patient_id} - Modification partielle
#[put("/{patient_id}")]
pub async fn update_patient(
    auth: AuthDoctor,
    path: web::Path<i32>,
    body: web::Json<UpdatePatientRequest>,
    directory: web::Data<PatientDirectory>,
) -> ApiResult<HttpResponse> {
    let patient = directory
        .update(auth.doctor_id, path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(patient).with_message("Patient updated successfully")))
}

/// DELETE /patient/{patient_id} - Suppression (logique si le patient a des rendez-vous)
#[delete("/{patient_id}")]
pub async fn delete_patient(
    auth: AuthDoctor,
    path: web::Path<i32>,
    directory: web::Data<PatientDirectory>,
) -> ApiResult<HttpResponse> {
    let outcome = directory.delete(auth.doctor_id, path.into_inner()).await?;
    let message = match outcome {
        DeleteOutcome::SoftDeleted => "Patient has appointments and was marked inactive",
        DeleteOutcome::Deleted => "Patient deleted successfully",
    };
    Ok(HttpResponse::Ok().json(ApiResponse::ok(DeletePatientResponse { outcome }).with_message(message)))
}

pub fn patient_routes(cfg: &mut web::ServiceConfig) {
    // Routes à segment fixe avant /{doctor_id}
    cfg.service(
        web::scope("/patient")
            .service(get_details)
            .service(get_stats)
            .service(add_patient)
            .service(list_patients)
            .service(update_patient)
            .service(delete_patient),
    );
}
