mod config;
mod db;
mod error;
mod middleware;
mod models;
mod routes;
mod services;
mod utils;
#[cfg(test)]
mod test_support;

use actix_web::{middleware::{from_fn, Logger}, web, App, HttpServer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::middleware::{request_timeout, RequestTimeout};
use crate::utils::jwt::TokenService;
use crate::utils::password::PasswordHasher;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env().map_err(|e| {
        tracing::error!(%e, "invalid configuration");
        std::io::Error::other(e)
    })?;
    error::expose_internal_details(config.exposes_error_details());

    info!("Connecting to database...");
    let db = db::establish_connection(&config).await.map_err(|e| {
        tracing::error!(%e, "failed to connect to database");
        std::io::Error::other(e)
    })?;
    info!("Database connected");

    if config.auto_migrate {
        db::sync_schema(&db).await.map_err(std::io::Error::other)?;
    }

    let tokens = TokenService::new(&config.jwt_secret, chrono::Duration::days(config.token_ttl_days));
    let hasher = PasswordHasher::new(config.password_hash_iterations);
    let timeout = RequestTimeout(config.request_timeout);
    let app_config = routes::app_config(db, tokens, hasher);

    info!(host = %config.host, port = config.port, environment = ?config.environment, "Starting server");

    HttpServer::new(move || {
        App::new()
            .wrap(from_fn(request_timeout))
            .wrap(Logger::default())
            .app_data(web::Data::new(timeout))
            .configure(app_config.clone())
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
