use actix_web::{dev::Payload, web, Error, FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::utils::jwt::TokenService;

/// Structure qui contient les infos du médecin authentifié
/// Utilisée comme extracteur dans les routes protégées
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthDoctor {
    pub doctor_id: i32,
    pub email: String,
}

impl AuthDoctor {
    /// Refuse l'accès aux données d'un autre médecin
    pub fn ensure_owner(&self, doctor_id: i32) -> Result<(), ApiError> {
        if self.doctor_id == doctor_id {
            Ok(())
        } else {
            Err(ApiError::Forbidden(
                "Access to another doctor's records is forbidden".to_string(),
            ))
        }
    }
}

/// Implémentation de FromRequest pour AuthDoctor
/// Cela permet à Actix-Web d'extraire automatiquement AuthDoctor des requêtes
impl FromRequest for AuthDoctor {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req).map_err(Error::from))
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthDoctor, ApiError> {
    // 1. Extraire le header Authorization
    let auth_header = req
        .headers()
        .get("Authorization")
        .ok_or_else(|| ApiError::Auth("Missing Authorization header".to_string()))?;

    // 2. Convertir le header en string
    let auth_str = auth_header
        .to_str()
        .map_err(|_| ApiError::Auth("Invalid Authorization header".to_string()))?;

    // 3. Extraire le token (format: "Bearer <token>")
    let token = auth_str
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            ApiError::Auth("Invalid Authorization format (expected: Bearer <token>)".to_string())
        })?;

    // 4. Vérifier le token JWT
    let tokens = req
        .app_data::<web::Data<TokenService>>()
        .ok_or_else(|| ApiError::internal("Authentication unavailable", "TokenService not registered"))?;
    let claims = tokens.verify_token(token)?;

    // 5. Créer et retourner AuthDoctor
    Ok(AuthDoctor {
        doctor_id: claims.doctor_id,
        email: claims.email,
    })
}
