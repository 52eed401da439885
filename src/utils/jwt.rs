use jsonwebtoken::{encode, decode, Header, Validation, EncodingKey, DecodingKey, Algorithm};
use serde::{Deserialize, Serialize};
use chrono::{Utc, Duration};

use crate::error::ApiError;

/// Contenu du token : identité du médecin + expiration
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "doctorId")]
    pub doctor_id: i32,
    pub email: String,
    pub iat: i64, // émis à
    pub exp: i64, // expiration timestamp
}

/// Émet et vérifie les JWT (HS256).
/// Construit une seule fois au démarrage à partir de la config puis partagé via web::Data.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Génère un JWT token pour un médecin
    pub fn generate_token(&self, doctor_id: i32, email: &str) -> Result<String, ApiError> {
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| ApiError::internal("Failed to generate token", "expiration overflow"))?;

        let claims = Claims {
            doctor_id,
            email: email.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| ApiError::internal("Failed to generate token", e))
    }

    /// Vérifie et décode un JWT token (signature + expiration)
    pub fn verify_token(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|e| ApiError::Auth(format!("Invalid token: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-secret", Duration::days(7))
    }

    #[test]
    fn test_generate_and_verify_token() {
        let token = service().generate_token(123, "house@clinic.test").unwrap();
        let claims = service().verify_token(&token).unwrap();

        assert_eq!(claims.doctor_id, 123);
        assert_eq!(claims.email, "house@clinic.test");
        assert_eq!(claims.exp - claims.iat, Duration::days(7).num_seconds());
    }

    #[test]
    fn test_invalid_token() {
        let result = service().verify_token("invalid.token.here");
        assert!(matches!(result, Err(ApiError::Auth(_))));
    }

    #[test]
    fn test_expired_token() {
        let expired = TokenService::new("test-secret", Duration::days(-1));
        let token = expired.generate_token(1, "a@b.co").unwrap();
        assert!(matches!(service().verify_token(&token), Err(ApiError::Auth(_))));
    }

    #[test]
    fn test_wrong_secret() {
        let token = TokenService::new("other-secret", Duration::days(7))
            .generate_token(1, "a@b.co")
            .unwrap();
        assert!(matches!(service().verify_token(&token), Err(ApiError::Auth(_))));
    }
}
