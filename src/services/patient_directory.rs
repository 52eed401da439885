use chrono::{Duration, NaiveDate, Utc};
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::*;
use tracing::{info, instrument};
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::models::appointments::{self, AppointmentStatus};
use crate::models::dto::{CreatePatientRequest, DeleteOutcome, PatientDetails, PatientStats, UpdatePatientRequest};
use crate::models::patients::{self, Gender, PatientStatus};
use crate::services::patch::{apply_patch, Assignment, Patch};
use crate::utils::validation;

/// Patch validé d'un patient (construit depuis UpdatePatientRequest)
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PatientPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<Option<String>>,
    pub phone: Option<String>,
    pub birth_date: Option<Option<NaiveDate>>,
    pub gender: Option<Gender>,
    pub status: Option<PatientStatus>,
}

impl PatientPatch {
    /// Règles : prénom, nom, téléphone et genre seulement s'ils sont non vides ;
    /// email, birthday et status dès qu'ils sont présents (null/"" efface email et birthday)
    pub fn from_request(request: UpdatePatientRequest) -> ApiResult<Self> {
        let non_empty = |value: Option<String>| value.filter(|v| !v.is_empty());

        let email = match request.email {
            Some(Some(email)) if !email.is_empty() => {
                validation::ensure_email(&email)?;
                Some(Some(email))
            }
            Some(_) => Some(None),
            None => None,
        };

        let birth_date = match request.birthday {
            Some(Some(day)) if !day.is_empty() => Some(Some(validation::parse_date("birthday", &day)?)),
            Some(_) => Some(None),
            None => None,
        };

        let gender = non_empty(request.gender)
            .map(|g| g.parse::<Gender>().map_err(ApiError::Validation))
            .transpose()?;

        let status = match request.status {
            Some(Some(status)) => Some(status.parse::<PatientStatus>().map_err(ApiError::Validation)?),
            Some(None) => return Err(ApiError::validation("status cannot be null")),
            None => None,
        };

        Ok(Self {
            first_name: non_empty(request.first_name),
            last_name: non_empty(request.last_name),
            email,
            phone: non_empty(request.phone),
            birth_date,
            gender,
            status,
        })
    }
}

impl Patch for PatientPatch {
    type Entity = patients::Entity;

    fn assignments(&self) -> Vec<Assignment<patients::Entity>> {
        let mut out: Vec<Assignment<patients::Entity>> = Vec::new();
        if let Some(v) = &self.first_name {
            out.push((patients::Column::FirstName, Expr::value(v.clone())));
        }
        if let Some(v) = &self.last_name {
            out.push((patients::Column::LastName, Expr::value(v.clone())));
        }
        if let Some(v) = &self.email {
            out.push((patients::Column::Email, Expr::value(v.clone())));
        }
        if let Some(v) = &self.phone {
            out.push((patients::Column::Phone, Expr::value(v.clone())));
        }
        if let Some(v) = &self.birth_date {
            out.push((patients::Column::BirthDate, Expr::value(*v)));
        }
        if let Some(v) = &self.gender {
            out.push((patients::Column::Gender, Expr::value(v.as_str())));
        }
        if let Some(v) = &self.status {
            out.push((patients::Column::Status, Expr::value(v.as_str())));
        }
        out
    }
}

/// Ligne brute de l'agrégat COUNT(CASE ...) de `stats`
#[derive(Debug, Default, FromQueryResult)]
struct StatsRow {
    total_patients: i64,
    active_patients: i64,
    inactive_patients: i64,
    new_patients_last_month: i64,
    male_patients: i64,
    female_patients: i64,
}

impl From<StatsRow> for PatientStats {
    fn from(row: StatsRow) -> Self {
        let count = |n: i64| u64::try_from(n).unwrap_or(0);
        Self {
            total_patients: count(row.total_patients),
            active_patients: count(row.active_patients),
            inactive_patients: count(row.inactive_patients),
            new_patients_last_month: count(row.new_patients_last_month),
            male_patients: count(row.male_patients),
            female_patients: count(row.female_patients),
        }
    }
}

/// Patients d'un médecin : recherche, CRUD, statistiques
pub struct PatientDirectory {
    db: DatabaseConnection,
}

impl PatientDirectory {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Liste les patients du médecin, filtrés par un terme de recherche optionnel
    /// (insensible à la casse, sur prénom / nom / email / téléphone)
    pub async fn list(&self, doctor_id: i32, search: Option<&str>) -> ApiResult<Vec<patients::Model>> {
        let mut query = patients::Entity::find().filter(patients::Column::DoctorId.eq(doctor_id));

        if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
            let pattern = format!("%{}%", term.to_lowercase());
            let matches = [
                patients::Column::FirstName,
                patients::Column::LastName,
                patients::Column::Email,
                patients::Column::Phone,
            ]
            .into_iter()
            .fold(Condition::any(), |cond, column| {
                cond.add(Expr::expr(Func::lower(Expr::col(column))).like(pattern.clone()))
            });
            query = query.filter(matches);
        }

        let patients = query
            .order_by_asc(patients::Column::LastName)
            .order_by_asc(patients::Column::FirstName)
            .order_by_asc(patients::Column::Id)
            .all(&self.db)
            .await?;
        Ok(patients)
    }

    /// Ajoute un patient (genre "M" et statut "active" par défaut)
    #[instrument(skip_all, fields(doctor_id = ?request.doctor_id))]
    pub async fn create(&self, request: CreatePatientRequest) -> ApiResult<patients::Model> {
        request.validate()?;
        let doctor_id = request
            .doctor_id
            .ok_or_else(|| ApiError::validation("doctorId is required"))?;

        let email = request.email.filter(|e| !e.is_empty());
        if let Some(email) = &email {
            validation::ensure_email(email)?;
        }

        let birth_date = match request.birthday.as_deref().filter(|b| !b.is_empty()) {
            Some(day) => Some(validation::parse_date("birthday", day)?),
            None => None,
        };

        let gender = match request.gender.as_deref().filter(|g| !g.is_empty()) {
            Some(g) => g.parse::<Gender>().map_err(ApiError::Validation)?,
            None => Gender::default(),
        };

        // Même email ou même téléphone chez ce médecin ?
        let mut same_identity = Condition::any().add(patients::Column::Phone.eq(&request.phone));
        if let Some(email) = &email {
            same_identity = same_identity.add(patients::Column::Email.eq(email));
        }
        let existing = patients::Entity::find()
            .filter(patients::Column::DoctorId.eq(doctor_id))
            .filter(same_identity)
            .one(&self.db)
            .await?;
        if existing.is_some() {
            return Err(ApiError::Conflict(
                "A patient with this email or phone already exists".to_string(),
            ));
        }

        let patient = patients::ActiveModel {
            doctor_id: Set(doctor_id),
            first_name: Set(request.first_name),
            last_name: Set(request.last_name),
            email: Set(email),
            phone: Set(request.phone),
            birth_date: Set(birth_date),
            gender: Set(gender.as_str().to_string()),
            status: Set(PatientStatus::Active.as_str().to_string()),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        info!(patient_id = patient.id, "patient created");
        Ok(patient)
    }

    /// Patient + compteurs de rendez-vous calculés à la lecture
    pub async fn get_by_id(&self, doctor_id: i32, patient_id: i32) -> ApiResult<PatientDetails> {
        let patient = self.find_owned(doctor_id, patient_id).await?;

        let of_patient = || {
            appointments::Entity::find()
                .filter(appointments::Column::PatientId.eq(patient_id))
                .filter(appointments::Column::DoctorId.eq(doctor_id))
        };
        let completed = AppointmentStatus::COMPLETED.as_str();
        let cancelled = AppointmentStatus::CANCELLED.as_str();
        let upcoming = AppointmentStatus::UPCOMING.map(|s| s.as_str());
        let today = Utc::now().date_naive();

        let total_appointments = of_patient().count(&self.db).await?;
        let completed_appointments = of_patient()
            .filter(appointments::Column::Status.eq(completed))
            .count(&self.db)
            .await?;
        let cancelled_appointments = of_patient()
            .filter(appointments::Column::Status.eq(cancelled))
            .count(&self.db)
            .await?;
        let last_visit = of_patient()
            .filter(appointments::Column::Status.eq(completed))
            .order_by_desc(appointments::Column::AppointmentDate)
            .one(&self.db)
            .await?
            .map(|a| a.appointment_date);
        let next_visit = of_patient()
            .filter(appointments::Column::Status.is_in(upcoming))
            .filter(appointments::Column::AppointmentDate.gte(today))
            .order_by_asc(appointments::Column::AppointmentDate)
            .one(&self.db)
            .await?
            .map(|a| a.appointment_date);

        Ok(PatientDetails {
            patient,
            total_appointments,
            completed_appointments,
            cancelled_appointments,
            last_visit,
            next_visit,
        })
    }

    /// Mise à jour partielle ; un seul UPDATE conditionné par id + doctor_id
    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        doctor_id: i32,
        patient_id: i32,
        request: UpdatePatientRequest,
    ) -> ApiResult<patients::Model> {
        let patch = PatientPatch::from_request(request)?;
        if patch.is_empty() {
            return Err(ApiError::validation("No data to update"));
        }

        let updated = apply_patch(&self.db, &patch, owned_by(doctor_id, patient_id)).await?;
        if updated == 0 {
            return Err(ApiError::not_found("Patient not found"));
        }

        self.find_owned(doctor_id, patient_id).await
    }

    /// Supprime un patient sans rendez-vous ; sinon le passe en "inactive"
    #[instrument(skip(self))]
    pub async fn delete(&self, doctor_id: i32, patient_id: i32) -> ApiResult<DeleteOutcome> {
        let txn = self.db.begin().await?;

        let appointment_count = appointments::Entity::find()
            .filter(appointments::Column::PatientId.eq(patient_id))
            .filter(appointments::Column::DoctorId.eq(doctor_id))
            .count(&txn)
            .await?;

        let (affected, outcome) = if appointment_count > 0 {
            let soft = PatientPatch {
                status: Some(PatientStatus::Inactive),
                ..Default::default()
            };
            let affected = apply_patch(&txn, &soft, owned_by(doctor_id, patient_id)).await?;
            (affected, DeleteOutcome::SoftDeleted)
        } else {
            let result = patients::Entity::delete_many()
                .filter(owned_by(doctor_id, patient_id))
                .exec(&txn)
                .await?;
            (result.rows_affected, DeleteOutcome::Deleted)
        };

        if affected == 0 {
            txn.rollback().await?;
            return Err(ApiError::not_found("Patient not found"));
        }
        txn.commit().await?;

        info!(?outcome, appointment_count, "patient removed");
        Ok(outcome)
    }

    /// Statistiques agrégées des patients d'un médecin (une seule requête)
    pub async fn stats(&self, doctor_id: i32) -> ApiResult<PatientStats> {
        let month_ago = Utc::now() - Duration::days(30);
        let count_when =
            |condition: SimpleExpr| -> SimpleExpr {
                Func::count(Expr::case(Condition::all().add(condition), Expr::value(1))).into()
            };

        let row = patients::Entity::find()
            .select_only()
            .column_as(Expr::col(patients::Column::Id).count(), "total_patients")
            .column_as(
                count_when(patients::Column::Status.eq(PatientStatus::Active.as_str())),
                "active_patients",
            )
            .column_as(
                count_when(patients::Column::Status.eq(PatientStatus::Inactive.as_str())),
                "inactive_patients",
            )
            .column_as(
                count_when(patients::Column::CreatedAt.gte(month_ago)),
                "new_patients_last_month",
            )
            .column_as(
                count_when(patients::Column::Gender.eq(Gender::Male.as_str())),
                "male_patients",
            )
            .column_as(
                count_when(patients::Column::Gender.eq(Gender::Female.as_str())),
                "female_patients",
            )
            .filter(patients::Column::DoctorId.eq(doctor_id))
            .into_model::<StatsRow>()
            .one(&self.db)
            .await?
            .unwrap_or_default();

        Ok(row.into())
    }

    async fn find_owned(&self, doctor_id: i32, patient_id: i32) -> ApiResult<patients::Model> {
        patients::Entity::find()
            .filter(owned_by(doctor_id, patient_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| ApiError::not_found("Patient not found"))
    }
}

fn owned_by(doctor_id: i32, patient_id: i32) -> Condition {
    Condition::all()
        .add(patients::Column::Id.eq(patient_id))
        .add(patients::Column::DoctorId.eq(doctor_id))
}
