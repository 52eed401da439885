// Requêtes et réponses de l'API
//
// Les noms de champs suivent ceux attendus par le frontend existant :
//   - auth, settings et patients (requêtes) : camelCase
//   - rendez-vous et lignes patients (réponses) : snake_case

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use crate::models::{appointments, patients};

// ---------------------------------------------------------------------------
// Enveloppe commune : {success, message?, data?, error?}
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            error: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
            error: None,
        }
    }
}

impl ApiResponse<()> {
    /// Succès sans données (ex: déconnexion, mise à jour du statut)
    pub fn acknowledge(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
            error: None,
        }
    }
}

/// Distingue un champ absent (None) d'un champ explicitement null (Some(None))
fn deserialize_present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "firstName is required"))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "lastName is required"))]
    pub last_name: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "email is required"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "phone is required"))]
    pub phone: String,
    pub specialty: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SignInRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Email and password are required"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Email and password are required"))]
    pub password: String,
}

/// Réponse après signup/signin
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub doctor_id: i32,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub specialty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    pub token: String,
}

// ---------------------------------------------------------------------------
// Profile settings
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSettingsRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Please fill in all required fields"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Please fill in all required fields"))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Please fill in all required fields"))]
    pub last_name: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Please fill in all required fields"))]
    pub phone: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Please fill in all required fields"))]
    pub specialty: String,
}

/// Projection du médecin renvoyée après mise à jour (jamais le hash)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorProfile {
    pub doctor_id: i32,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub specialty: Option<String>,
}

/// Compte du médecin connecté (GET /auth/me), avec ses dates
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorAccount {
    pub doctor_id: i32,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub specialty: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Patients
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePatientRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "firstName is required"))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "lastName is required"))]
    pub last_name: String,
    pub email: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, message = "phone is required"))]
    pub phone: String,
    pub birthday: Option<String>, // Format: "1990-05-21"
    pub gender: Option<String>,   // "M" par défaut
    #[validate(required(message = "doctorId is required"))]
    pub doctor_id: Option<i32>,
}

/// Mise à jour partielle : seuls les champs présents sont modifiés.
/// email, birthday et status sont appliqués dès qu'ils sont présents (null inclus)
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePatientRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_present")]
    pub email: Option<Option<String>>,
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "deserialize_present")]
    pub birthday: Option<Option<String>>,
    pub gender: Option<String>,
    #[serde(default, deserialize_with = "deserialize_present")]
    pub status: Option<Option<String>>,
}

/// Patient + compteurs calculés à la lecture
#[derive(Debug, Serialize)]
pub struct PatientDetails {
    #[serde(flatten)]
    pub patient: patients::Model,
    pub total_appointments: u64,
    pub completed_appointments: u64,
    pub cancelled_appointments: u64,
    pub last_visit: Option<NaiveDate>,
    pub next_visit: Option<NaiveDate>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct PatientStats {
    pub total_patients: u64,
    pub active_patients: u64,
    pub inactive_patients: u64,
    pub new_patients_last_month: u64,
    pub male_patients: u64,
    pub female_patients: u64,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    /// Le patient a des rendez-vous : passé en "inactive"
    SoftDeleted,
    Deleted,
}

#[derive(Debug, Serialize)]
pub struct DeletePatientResponse {
    pub outcome: DeleteOutcome,
}

// ---------------------------------------------------------------------------
// Rendez-vous
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAppointmentRequest {
    #[validate(required(message = "patient_id is required"))]
    pub patient_id: Option<i32>,
    #[validate(required(message = "doctor_id is required"))]
    pub doctor_id: Option<i32>,
    #[validate(required(message = "cabinet_id is required"))]
    pub cabinet_id: Option<i32>,
    #[validate(required(message = "appointment_date is required"))]
    pub appointment_date: Option<String>, // Format: "2025-12-20"
    pub appointment_time: Option<String>, // Format: "14:30"
    #[serde(default)]
    #[validate(length(min = 1, message = "visit_type is required"))]
    pub visit_type: String,
    pub notes: Option<String>,
    pub status: Option<String>, // "nouveau" si absent ou invalide
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: String,
}

/// appointment_date, visit_type et status : appliqués seulement si non vides.
/// notes et appointment_time : appliqués dès qu'ils sont présents.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub appointment_date: Option<String>,
    pub visit_type: Option<String>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "deserialize_present")]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_present")]
    pub appointment_time: Option<Option<String>>,
}

/// Rendez-vous avec l'heure résolue (colonne dédiée ou ancien tag dans notes)
#[derive(Debug, Serialize)]
pub struct AppointmentRecord {
    #[serde(flatten)]
    pub appointment: appointments::Model,
    pub time: String,
}

/// Ligne de l'agenda du médecin : rendez-vous + identité du patient
#[derive(Debug, Serialize)]
pub struct AppointmentWithPatient {
    #[serde(flatten)]
    pub appointment: appointments::Model,
    pub patient_first_name: String,
    pub patient_last_name: String,
    pub patient_phone: String,
    pub patient_email: Option<String>,
    pub patient_gender: String,
    pub time: String,
}
