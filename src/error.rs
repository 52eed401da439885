// Erreurs de l'API et conversion vers l'enveloppe JSON {success, message, error}

use std::sync::atomic::{AtomicBool, Ordering};

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

use crate::models::dto::ApiResponse;

/// Active l'exposition du détail des erreurs internes (hors production)
static EXPOSE_INTERNAL_DETAILS: AtomicBool = AtomicBool::new(false);

pub fn expose_internal_details(enabled: bool) {
    EXPOSE_INTERNAL_DETAILS.store(enabled, Ordering::Relaxed);
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Auth(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{message}")]
    Internal { message: String, detail: String },

    #[error("Request timed out")]
    Timeout,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn internal(message: impl Into<String>, detail: impl ToString) -> Self {
        Self::Internal {
            message: message.into(),
            detail: detail.to_string(),
        }
    }
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                ApiError::Conflict("A record with the same unique fields already exists".to_string())
            }
            _ => ApiError::internal("Database error", err),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("{} is invalid", field),
                })
            })
            .collect();
        messages.sort();
        messages.dedup();
        ApiError::Validation(messages.join("; "))
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Internal { message, detail } = self {
            tracing::error!(%detail, "{}", message);
        }

        let body = self.envelope(EXPOSE_INTERNAL_DETAILS.load(Ordering::Relaxed));
        HttpResponse::build(self.status_code()).json(body)
    }
}

impl ApiError {
    /// Corps de la réponse ; le détail d'une erreur interne n'apparaît que si `expose_detail`
    pub fn envelope(&self, expose_detail: bool) -> ApiResponse<()> {
        let mut body = ApiResponse::<()>::failure(self.to_string());
        if let ApiError::Internal { detail, .. } = self {
            if expose_detail {
                body.error = Some(detail.clone());
            }
        }
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::validation("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Auth("x".into()).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden("x".into()).status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(ApiError::internal("x", "y").status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ApiError::Timeout.status_code(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[actix_web::test]
    async fn test_error_envelope() {
        let response = ApiError::not_found("Patient not found").error_response();
        let bytes = to_bytes(response.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Patient not found");
        assert!(body.get("data").is_none());
        assert!(body.get("error").is_none());
    }

    #[test]
    fn test_internal_detail_hidden_in_production() {
        let err = ApiError::internal("Database error", "connection refused");
        let body = serde_json::to_value(err.envelope(false)).unwrap();

        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Database error");
        assert!(body.get("error").is_none());
    }

    #[test]
    fn test_internal_detail_exposed_outside_production() {
        let err = ApiError::internal("Database error", "connection refused");
        let body = serde_json::to_value(err.envelope(true)).unwrap();

        assert_eq!(body["message"], "Database error");
        assert_eq!(body["error"], "connection refused");
    }

    #[test]
    fn test_detail_only_for_internal_errors() {
        let body = serde_json::to_value(ApiError::Conflict("taken".into()).envelope(true)).unwrap();
        assert!(body.get("error").is_none());
    }

    #[test]
    fn test_db_error_is_internal() {
        let err: ApiError = DbErr::Custom("boom".to_string()).into();
        assert!(matches!(err, ApiError::Internal { .. }));
    }
}
