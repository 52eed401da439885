use actix_web::{get, web, HttpResponse};
use chrono::Utc;
use sea_orm::DatabaseConnection;

use crate::models::health::HealthResponse;

/// GET /health - Sonde de vie (PUBLIC), vérifie aussi la base
#[get("/health")]
pub async fn health_check(db: web::Data<DatabaseConnection>) -> HttpResponse {
    let database_up = db.ping().await.is_ok();
    if !database_up {
        tracing::warn!("health check: database unreachable");
    }

    let response = HealthResponse {
        status: if database_up { "ok" } else { "degraded" }.to_string(),
        database: if database_up { "up" } else { "down" }.to_string(),
        time: Utc::now(),
    };

    HttpResponse::Ok().json(response)
}
