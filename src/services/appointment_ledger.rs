use chrono::NaiveDate;
use sea_orm::sea_query::Expr;
use sea_orm::*;
use tracing::{info, instrument};
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::models::appointments::{self, AppointmentStatus};
use crate::models::dto::{
    AppointmentRecord, AppointmentWithPatient, CreateAppointmentRequest, UpdateAppointmentRequest,
};
use crate::models::patients;
use crate::services::patch::{apply_patch, Assignment, Patch};
use crate::utils::{time_tag, validation};

/// Patch validé d'un rendez-vous (construit depuis UpdateAppointmentRequest)
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AppointmentPatch {
    pub appointment_date: Option<NaiveDate>,
    pub visit_type: Option<String>,
    pub status: Option<AppointmentStatus>,
    pub notes: Option<Option<String>>,
    pub appointment_time: Option<Option<String>>,
}

impl AppointmentPatch {
    pub fn from_request(request: UpdateAppointmentRequest) -> ApiResult<Self> {
        let appointment_date = request
            .appointment_date
            .filter(|d| !d.is_empty())
            .map(|d| validation::parse_date("appointment_date", &d))
            .transpose()?;

        let status = request
            .status
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<AppointmentStatus>().map_err(ApiError::Validation))
            .transpose()?;

        // "" ou null : on efface l'heure
        let appointment_time = match request.appointment_time {
            Some(Some(time)) if !time.is_empty() => {
                time_tag::ensure_time(&time)?;
                Some(Some(time))
            }
            Some(_) => Some(None),
            None => None,
        };

        Ok(Self {
            appointment_date,
            visit_type: request.visit_type.filter(|v| !v.is_empty()),
            status,
            notes: request.notes,
            appointment_time,
        })
    }
}

impl Patch for AppointmentPatch {
    type Entity = appointments::Entity;

    fn assignments(&self) -> Vec<Assignment<appointments::Entity>> {
        let mut out: Vec<Assignment<appointments::Entity>> = Vec::new();
        if let Some(v) = self.appointment_date {
            out.push((appointments::Column::AppointmentDate, Expr::value(v)));
        }
        if let Some(v) = &self.visit_type {
            out.push((appointments::Column::VisitType, Expr::value(v.clone())));
        }
        if let Some(v) = &self.status {
            out.push((appointments::Column::Status, Expr::value(v.as_str())));
        }
        if let Some(v) = &self.notes {
            out.push((appointments::Column::Notes, Expr::value(v.clone())));
        }
        if let Some(v) = &self.appointment_time {
            out.push((appointments::Column::AppointmentTime, Expr::value(v.clone())));
        }
        out
    }
}

/// Rendez-vous d'un médecin : création, agenda, statut, modification, suppression
pub struct AppointmentLedger {
    db: DatabaseConnection,
}

impl AppointmentLedger {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Crée un rendez-vous pour un patient du médecin
    #[instrument(skip_all, fields(doctor_id = ?request.doctor_id, patient_id = ?request.patient_id))]
    pub async fn create(&self, request: CreateAppointmentRequest) -> ApiResult<AppointmentRecord> {
        // 1. Champs obligatoires
        request.validate()?;
        let (Some(doctor_id), Some(patient_id), Some(cabinet_id), Some(date)) = (
            request.doctor_id,
            request.patient_id,
            request.cabinet_id,
            request.appointment_date.as_deref(),
        ) else {
            return Err(ApiError::validation(
                "patient_id, doctor_id, cabinet_id and appointment_date are required",
            ));
        };
        let appointment_date = validation::parse_date("appointment_date", date)?;

        let appointment_time = match request.appointment_time.filter(|t| !t.is_empty()) {
            Some(time) => {
                time_tag::ensure_time(&time)?;
                Some(time)
            }
            None => None,
        };

        // Statut inconnu ou absent : "nouveau"
        let status = request
            .status
            .as_deref()
            .and_then(|s| s.parse::<AppointmentStatus>().ok())
            .unwrap_or_default();

        // 2. Le patient doit appartenir au médecin
        let patient = patients::Entity::find_by_id(patient_id)
            .filter(patients::Column::DoctorId.eq(doctor_id))
            .one(&self.db)
            .await?;
        if patient.is_none() {
            return Err(ApiError::not_found("Patient not found"));
        }

        // 3. Insérer
        let appointment = appointments::ActiveModel {
            doctor_id: Set(doctor_id),
            patient_id: Set(patient_id),
            cabinet_id: Set(cabinet_id),
            appointment_date: Set(appointment_date),
            appointment_time: Set(appointment_time),
            status: Set(status.as_str().to_string()),
            visit_type: Set(request.visit_type),
            notes: Set(request.notes),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        info!(appointment_id = appointment.id, status = status.as_str(), "appointment created");
        Ok(into_record(appointment))
    }

    /// Agenda du médecin, du plus récent au plus ancien
    pub async fn list_by_doctor(&self, doctor_id: i32) -> ApiResult<Vec<AppointmentWithPatient>> {
        let rows = appointments::Entity::find()
            .find_also_related(patients::Entity)
            .filter(appointments::Column::DoctorId.eq(doctor_id))
            .order_by_desc(appointments::Column::AppointmentDate)
            .order_by_desc(appointments::Column::CreatedAt)
            .order_by_desc(appointments::Column::Id)
            .all(&self.db)
            .await?;

        let agenda = rows
            .into_iter()
            .filter_map(|(appointment, patient)| {
                // FK : un rendez-vous sans patient ne peut pas exister
                let patient = patient?;
                let time = time_tag::resolve_time(
                    appointment.appointment_time.as_deref(),
                    appointment.notes.as_deref(),
                );
                Some(AppointmentWithPatient {
                    appointment,
                    patient_first_name: patient.first_name,
                    patient_last_name: patient.last_name,
                    patient_phone: patient.phone,
                    patient_email: patient.email,
                    patient_gender: patient.gender,
                    time,
                })
            })
            .collect();

        Ok(agenda)
    }

    /// Change uniquement le statut
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        doctor_id: i32,
        appointment_id: i32,
        status: &str,
    ) -> ApiResult<AppointmentRecord> {
        let status = status.parse::<AppointmentStatus>().map_err(ApiError::Validation)?;
        let patch = AppointmentPatch {
            status: Some(status),
            ..Default::default()
        };
        self.apply(doctor_id, appointment_id, &patch).await
    }

    /// Mise à jour partielle d'un rendez-vous
    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        doctor_id: i32,
        appointment_id: i32,
        request: UpdateAppointmentRequest,
    ) -> ApiResult<AppointmentRecord> {
        let patch = AppointmentPatch::from_request(request)?;
        if patch.is_empty() {
            return Err(ApiError::validation("No data to update"));
        }
        self.apply(doctor_id, appointment_id, &patch).await
    }

    /// Suppression définitive
    #[instrument(skip(self))]
    pub async fn delete(&self, doctor_id: i32, appointment_id: i32) -> ApiResult<()> {
        let result = appointments::Entity::delete_many()
            .filter(owned_by(doctor_id, appointment_id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(ApiError::not_found("Appointment not found"));
        }
        info!("appointment deleted");
        Ok(())
    }

    async fn apply(
        &self,
        doctor_id: i32,
        appointment_id: i32,
        patch: &AppointmentPatch,
    ) -> ApiResult<AppointmentRecord> {
        let updated = apply_patch(&self.db, patch, owned_by(doctor_id, appointment_id)).await?;
        if updated == 0 {
            return Err(ApiError::not_found("Appointment not found"));
        }

        let appointment = appointments::Entity::find()
            .filter(owned_by(doctor_id, appointment_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| ApiError::not_found("Appointment not found"))?;
        Ok(into_record(appointment))
    }
}

fn into_record(appointment: appointments::Model) -> AppointmentRecord {
    let time = time_tag::resolve_time(
        appointment.appointment_time.as_deref(),
        appointment.notes.as_deref(),
    );
    AppointmentRecord { appointment, time }
}

fn owned_by(doctor_id: i32, appointment_id: i32) -> Condition {
    Condition::all()
        .add(appointments::Column::Id.eq(appointment_id))
        .add(appointments::Column::DoctorId.eq(doctor_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    fn booking(doctor_id: i32, patient_id: i32, date: &str) -> CreateAppointmentRequest {
        CreateAppointmentRequest {
            patient_id: Some(patient_id),
            doctor_id: Some(doctor_id),
            cabinet_id: Some(1),
            appointment_date: Some(date.to_string()),
            appointment_time: None,
            visit_type: "consultation".to_string(),
            notes: None,
            status: None,
        }
    }

    #[actix_web::test]
    async fn test_create_stores_time_in_its_column() {
        let db = test_support::memory_db().await;
        let doctor = test_support::seed_doctor(&db, "house@clinic.test").await;
        let patient = test_support::seed_patient(&db, doctor.id, "0600000000").await;
        let ledger = AppointmentLedger::new(db.clone());

        let mut request = booking(doctor.id, patient.id, "2025-12-20");
        request.appointment_time = Some("14:30".to_string());
        request.notes = Some("Contrôle annuel".to_string());
        let record = ledger.create(request).await.unwrap();

        assert_eq!(record.time, "14:30");
        assert_eq!(record.appointment.appointment_time.as_deref(), Some("14:30"));
        assert_eq!(record.appointment.notes.as_deref(), Some("Contrôle annuel"));
        assert_eq!(record.appointment.status, "nouveau");

        let agenda = ledger.list_by_doctor(doctor.id).await.unwrap();
        assert_eq!(agenda.len(), 1);
        assert_eq!(agenda[0].time, "14:30");
        assert_eq!(agenda[0].patient_phone, "0600000000");
    }

    #[actix_web::test]
    async fn test_create_status_and_validation() {
        let db = test_support::memory_db().await;
        let doctor = test_support::seed_doctor(&db, "house@clinic.test").await;
        let patient = test_support::seed_patient(&db, doctor.id, "0600000000").await;
        let ledger = AppointmentLedger::new(db.clone());

        let mut confirmed = booking(doctor.id, patient.id, "2025-12-20");
        confirmed.status = Some("confirme".to_string());
        assert_eq!(ledger.create(confirmed).await.unwrap().appointment.status, "confirme");

        let mut unknown = booking(doctor.id, patient.id, "2025-12-21");
        unknown.status = Some("done".to_string());
        assert_eq!(ledger.create(unknown).await.unwrap().appointment.status, "nouveau");

        let mut bad_time = booking(doctor.id, patient.id, "2025-12-20");
        bad_time.appointment_time = Some("25:00".to_string());
        assert!(matches!(ledger.create(bad_time).await, Err(ApiError::Validation(_))));

        let bad_date = booking(doctor.id, patient.id, "20/12/2025");
        assert!(matches!(ledger.create(bad_date).await, Err(ApiError::Validation(_))));

        let mut no_cabinet = booking(doctor.id, patient.id, "2025-12-20");
        no_cabinet.cabinet_id = None;
        assert!(matches!(ledger.create(no_cabinet).await, Err(ApiError::Validation(_))));

        let mut no_visit = booking(doctor.id, patient.id, "2025-12-20");
        no_visit.visit_type = String::new();
        assert!(matches!(ledger.create(no_visit).await, Err(ApiError::Validation(_))));
    }

    #[actix_web::test]
    async fn test_create_requires_patient_of_the_doctor() {
        let db = test_support::memory_db().await;
        let doctor = test_support::seed_doctor(&db, "house@clinic.test").await;
        let other = test_support::seed_doctor(&db, "wilson@clinic.test").await;
        let foreign = test_support::seed_patient(&db, other.id, "0600000000").await;
        let ledger = AppointmentLedger::new(db.clone());

        let result = ledger.create(booking(doctor.id, foreign.id, "2025-12-20")).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
        let result = ledger.create(booking(doctor.id, 9999, "2025-12-20")).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[actix_web::test]
    async fn test_list_reads_legacy_time_and_orders_by_date() {
        let db = test_support::memory_db().await;
        let doctor = test_support::seed_doctor(&db, "house@clinic.test").await;
        let patient = test_support::seed_patient(&db, doctor.id, "0600000000").await;
        let ledger = AppointmentLedger::new(db.clone());

        appointments::ActiveModel {
            doctor_id: Set(doctor.id),
            patient_id: Set(patient.id),
            cabinet_id: Set(1),
            appointment_date: Set(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()),
            status: Set("termine".to_string()),
            visit_type: Set("consultation".to_string()),
            notes: Set(Some("[Time: 9:15] Douleurs lombaires".to_string())),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();
        ledger.create(booking(doctor.id, patient.id, "2025-01-10")).await.unwrap();

        let agenda = ledger.list_by_doctor(doctor.id).await.unwrap();
        assert_eq!(agenda.len(), 2);
        assert_eq!(agenda[0].appointment.appointment_date, NaiveDate::from_ymd_opt(2025, 1, 10).unwrap());
        assert_eq!(agenda[0].time, time_tag::DEFAULT_TIME);
        assert_eq!(agenda[1].time, "9:15");
        assert_eq!(agenda[1].patient_first_name, patient.first_name);

        let other = test_support::seed_doctor(&db, "wilson@clinic.test").await;
        assert!(ledger.list_by_doctor(other.id).await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_update_status() {
        let db = test_support::memory_db().await;
        let doctor = test_support::seed_doctor(&db, "house@clinic.test").await;
        let patient = test_support::seed_patient(&db, doctor.id, "0600000000").await;
        let ledger = AppointmentLedger::new(db.clone());
        let record = ledger.create(booking(doctor.id, patient.id, "2025-12-20")).await.unwrap();
        let id = record.appointment.id;

        let updated = ledger.update_status(doctor.id, id, "confirme").await.unwrap();
        assert_eq!(updated.appointment.status, "confirme");

        assert!(matches!(ledger.update_status(doctor.id, id, "done").await, Err(ApiError::Validation(_))));
        assert!(matches!(ledger.update_status(doctor.id, 9999, "confirme").await, Err(ApiError::NotFound(_))));

        let other = test_support::seed_doctor(&db, "wilson@clinic.test").await;
        assert!(matches!(ledger.update_status(other.id, id, "absent").await, Err(ApiError::NotFound(_))));
    }

    #[actix_web::test]
    async fn test_update_partial_fields() {
        let db = test_support::memory_db().await;
        let doctor = test_support::seed_doctor(&db, "house@clinic.test").await;
        let patient = test_support::seed_patient(&db, doctor.id, "0600000000").await;
        let ledger = AppointmentLedger::new(db.clone());

        let mut request = booking(doctor.id, patient.id, "2025-12-20");
        request.appointment_time = Some("14:30".to_string());
        request.notes = Some("Première visite".to_string());
        let id = ledger.create(request).await.unwrap().appointment.id;

        // visit_type vide : ignoré ; notes "" : écrasé ; heure null : effacée
        let update: UpdateAppointmentRequest = serde_json::from_str(
            r#"{"appointment_date":"2025-12-22","visit_type":"","notes":"","appointment_time":null}"#,
        )
        .unwrap();
        let updated = ledger.update(doctor.id, id, update).await.unwrap();

        assert_eq!(updated.appointment.appointment_date, NaiveDate::from_ymd_opt(2025, 12, 22).unwrap());
        assert_eq!(updated.appointment.visit_type, "consultation");
        assert_eq!(updated.appointment.notes.as_deref(), Some(""));
        assert_eq!(updated.appointment.appointment_time, None);
        assert_eq!(updated.time, time_tag::DEFAULT_TIME);
    }

    #[actix_web::test]
    async fn test_update_empty_body_leaves_row_unchanged() {
        let db = test_support::memory_db().await;
        let doctor = test_support::seed_doctor(&db, "house@clinic.test").await;
        let patient = test_support::seed_patient(&db, doctor.id, "0600000000").await;
        let ledger = AppointmentLedger::new(db.clone());
        let record = ledger.create(booking(doctor.id, patient.id, "2025-12-20")).await.unwrap();

        let empty: UpdateAppointmentRequest = serde_json::from_str(r#"{"visit_type":""}"#).unwrap();
        let result = ledger.update(doctor.id, record.appointment.id, empty).await;
        assert!(matches!(result, Err(ApiError::Validation(_))));

        let stored = appointments::Entity::find_by_id(record.appointment.id).one(&db).await.unwrap().unwrap();
        assert_eq!(stored, record.appointment);

        let rename = UpdateAppointmentRequest {
            visit_type: Some("suivi".to_string()),
            ..Default::default()
        };
        assert!(matches!(ledger.update(doctor.id, 9999, rename).await, Err(ApiError::NotFound(_))));
    }

    #[actix_web::test]
    async fn test_delete() {
        let db = test_support::memory_db().await;
        let doctor = test_support::seed_doctor(&db, "house@clinic.test").await;
        let other = test_support::seed_doctor(&db, "wilson@clinic.test").await;
        let patient = test_support::seed_patient(&db, doctor.id, "0600000000").await;
        let ledger = AppointmentLedger::new(db.clone());
        let id = ledger.create(booking(doctor.id, patient.id, "2025-12-20")).await.unwrap().appointment.id;

        assert!(matches!(ledger.delete(other.id, id).await, Err(ApiError::NotFound(_))));
        ledger.delete(doctor.id, id).await.unwrap();
        assert!(appointments::Entity::find_by_id(id).one(&db).await.unwrap().is_none());
        assert!(matches!(ledger.delete(doctor.id, id).await, Err(ApiError::NotFound(_))));
    }
}
