use std::time::Duration;

use actix_web::{
    body::{EitherBody, MessageBody},
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
    web, Error, ResponseError,
};

use crate::error::ApiError;

/// Durée maximale d'une requête (REQUEST_TIMEOUT_SECS), partagée via web::Data
#[derive(Debug, Clone, Copy)]
pub struct RequestTimeout(pub Duration);

impl Default for RequestTimeout {
    fn default() -> Self {
        Self(Duration::from_secs(30))
    }
}

/// Middleware : coupe la requête (504) si le handler dépasse le timeout
pub async fn request_timeout<B: MessageBody>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<EitherBody<B>>, Error> {
    let limit = req
        .app_data::<web::Data<RequestTimeout>>()
        .map(|t| t.0)
        .unwrap_or_else(|| RequestTimeout::default().0);
    let http_req = req.request().clone();

    match tokio::time::timeout(limit, next.call(req)).await {
        Ok(response) => response.map(ServiceResponse::map_into_left_body),
        Err(_) => {
            tracing::warn!(path = %http_req.path(), timeout_ms = limit.as_millis() as u64, "request timed out");
            let response = ApiError::Timeout.error_response();
            Ok(ServiceResponse::new(http_req, response).map_into_right_body())
        }
    }
}
