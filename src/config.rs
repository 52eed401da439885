// ============================================================================
// CONFIGURATION
// ============================================================================
//
// Description:
//   Paramètres du serveur lus depuis l'environnement (fichier .env chargé
//   par dotenv dans main.rs).
//
// Variables:
//   - DATABASE_URL (obligatoire)
//   - JWT_SECRET (obligatoire en production)
//   - HOST / PORT : adresse d'écoute (127.0.0.1:8080 par défaut)
//   - APP_ENV : "development" (défaut) ou "production"
//   - TOKEN_TTL_DAYS : durée de vie des tokens (7 jours)
//   - DB_MAX_CONNECTIONS / DB_MIN_CONNECTIONS / DB_CONNECT_TIMEOUT_SECS
//   - REQUEST_TIMEOUT_SECS : timeout appliqué à chaque requête HTTP
//   - PASSWORD_HASH_ITERATIONS : itérations PBKDF2 pour les nouveaux hashs
//     (au moins 100 000 en production)
//   - AUTO_MIGRATE : crée les tables au démarrage si "true"
//
// ============================================================================

use std::time::Duration;

use thiserror::Error;

const DEV_JWT_SECRET: &str = "default-insecure-key-change-this";

/// Coût PBKDF2 minimal accepté en production
pub const MIN_PRODUCTION_HASH_ITERATIONS: u32 = 100_000;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub database_url: String,
    pub jwt_secret: String,
    pub token_ttl_days: i64,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_connect_timeout: Duration,
    pub request_timeout: Duration,
    pub password_hash_iterations: u32,
    pub auto_migrate: bool,
}

impl AppConfig {
    /// Charge la configuration depuis les variables d'environnement
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Construit la configuration à partir d'une fonction de lecture des clés
    /// (permet de tester sans toucher aux variables du processus)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("APP_ENV") {
            Some(value) => Environment::parse(&value).ok_or(ConfigError::Invalid {
                key: "APP_ENV",
                value,
            })?,
            None => Environment::Development,
        };

        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let jwt_secret = match lookup("JWT_SECRET") {
            Some(secret) if !secret.is_empty() => secret,
            _ if environment == Environment::Production => {
                return Err(ConfigError::Missing("JWT_SECRET"));
            }
            _ => {
                tracing::warn!("JWT_SECRET not set, using the development key (INSECURE)");
                DEV_JWT_SECRET.to_string()
            }
        };

        let db_max_connections = parse_or(&lookup, "DB_MAX_CONNECTIONS", 10)?;
        let db_min_connections = parse_or(&lookup, "DB_MIN_CONNECTIONS", 1)?;
        if db_min_connections > db_max_connections {
            return Err(ConfigError::Invalid {
                key: "DB_MIN_CONNECTIONS",
                value: db_min_connections.to_string(),
            });
        }

        let password_hash_iterations: u32 = parse_or(&lookup, "PASSWORD_HASH_ITERATIONS", 260_000)?;
        let too_cheap = password_hash_iterations == 0
            || (environment == Environment::Production
                && password_hash_iterations < MIN_PRODUCTION_HASH_ITERATIONS);
        if too_cheap {
            return Err(ConfigError::Invalid {
                key: "PASSWORD_HASH_ITERATIONS",
                value: password_hash_iterations.to_string(),
            });
        }

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or(&lookup, "PORT", 8080)?,
            environment,
            database_url,
            jwt_secret,
            token_ttl_days: parse_or(&lookup, "TOKEN_TTL_DAYS", 7)?,
            db_max_connections,
            db_min_connections,
            db_connect_timeout: Duration::from_secs(parse_or(&lookup, "DB_CONNECT_TIMEOUT_SECS", 8)?),
            request_timeout: Duration::from_secs(parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 30)?),
            password_hash_iterations,
            auto_migrate: parse_or(&lookup, "AUTO_MIGRATE", false)?,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Le détail des erreurs internes n'est renvoyé au client qu'hors production
    pub fn exposes_error_details(&self) -> bool {
        !self.is_production()
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}
