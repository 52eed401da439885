// Outils partagés par les tests : base SQLite en mémoire et jeux de données

use chrono::{Duration, NaiveDate};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};

use crate::db;
use crate::models::appointments::{self, AppointmentStatus};
use crate::models::{doctors, patients};
use crate::services::CredentialStore;
use crate::utils::jwt::TokenService;
use crate::utils::password::PasswordHasher;

pub const TEST_SECRET: &str = "test-secret";
pub const TEST_PASSWORD: &str = "Secret123";

/// Une seule connexion : chaque connexion sqlite::memory: a sa propre base
pub async fn memory_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    db::sync_schema(&db).await.unwrap();
    db
}

pub fn token_service() -> TokenService {
    TokenService::new(TEST_SECRET, Duration::days(7))
}

/// Peu d'itérations : les tests restent rapides
pub fn hasher() -> PasswordHasher {
    PasswordHasher::new(1_000)
}

pub fn credential_store(db: &DatabaseConnection) -> CredentialStore {
    CredentialStore::new(db.clone(), token_service(), hasher())
}

pub fn bearer(doctor: &doctors::Model) -> String {
    let token = token_service().generate_token(doctor.id, &doctor.email).unwrap();
    format!("Bearer {}", token)
}

/// Médecin avec le mot de passe TEST_PASSWORD
pub async fn seed_doctor(db: &DatabaseConnection, email: &str) -> doctors::Model {
    doctors::ActiveModel {
        email: Set(email.to_string()),
        password_hash: Set(hasher().hash(TEST_PASSWORD).unwrap()),
        first_name: Set("Gregory".to_string()),
        last_name: Set("House".to_string()),
        phone: Set("0600000000".to_string()),
        specialty: Set(Some("Diagnostics".to_string())),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn seed_patient(db: &DatabaseConnection, doctor_id: i32, phone: &str) -> patients::Model {
    patients::ActiveModel {
        doctor_id: Set(doctor_id),
        first_name: Set("Alice".to_string()),
        last_name: Set("Martin".to_string()),
        phone: Set(phone.to_string()),
        gender: Set("F".to_string()),
        status: Set("active".to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn seed_appointment(
    db: &DatabaseConnection,
    doctor_id: i32,
    patient_id: i32,
    date: NaiveDate,
    status: AppointmentStatus,
) -> appointments::Model {
    appointments::ActiveModel {
        doctor_id: Set(doctor_id),
        patient_id: Set(patient_id),
        cabinet_id: Set(1),
        appointment_date: Set(date),
        status: Set(status.as_str().to_string()),
        visit_type: Set("consultation".to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}
