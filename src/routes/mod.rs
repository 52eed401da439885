pub mod appointments;
pub mod auth;
pub mod health;
pub mod patient;
pub mod setting;

use actix_web::web;
use sea_orm::DatabaseConnection;

use crate::error::ApiError;
use crate::services::{AppointmentLedger, CredentialStore, PatientDirectory, ProfileSettings};
use crate::utils::jwt::TokenService;
use crate::utils::password::PasswordHasher;

/// Services partagés + routes ; appelé pour chaque worker HTTP
pub fn app_config(
    db: DatabaseConnection,
    tokens: TokenService,
    hasher: PasswordHasher,
) -> impl Fn(&mut web::ServiceConfig) + Clone + Send + 'static {
    move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(web::Data::new(CredentialStore::new(db.clone(), tokens.clone(), hasher)))
            .app_data(web::Data::new(PatientDirectory::new(db.clone())))
            .app_data(web::Data::new(AppointmentLedger::new(db.clone())))
            .app_data(web::Data::new(ProfileSettings::new(db.clone())))
            .app_data(web::Data::new(tokens.clone()))
            .app_data(web::Data::new(db.clone()));
        configure_routes(cfg);
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    // JSON invalide et ids non numériques : enveloppe 400 au lieu de la réponse texte d'actix
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        ApiError::validation(format!("Invalid JSON body: {}", err)).into()
    }))
    .app_data(web::PathConfig::default().error_handler(|err, _req| {
        ApiError::validation(format!("Invalid path parameter: {}", err)).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        ApiError::validation(format!("Invalid query string: {}", err)).into()
    }))
    .service(health::health_check);

    auth::auth_routes(cfg);
    setting::setting_routes(cfg);
    patient::patient_routes(cfg);
    appointments::appointment_routes(cfg);
}
