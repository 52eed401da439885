use sea_orm::*;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::models::doctors;
use crate::models::dto::{AuthSession, SignInRequest, SignUpRequest};
use crate::utils::jwt::{Claims, TokenService};
use crate::utils::password::{self, PasswordHasher};
use crate::utils::validation;

/// Même message pour email inconnu et mauvais mot de passe (pas de fuite d'info)
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Comptes médecins : inscription, connexion, vérification des tokens
pub struct CredentialStore {
    db: DatabaseConnection,
    tokens: TokenService,
    hasher: PasswordHasher,
    /// Hash de référence vérifié quand l'email est inconnu : les deux chemins
    /// de refus paient la même dérivation PBKDF2
    decoy_hash: String,
}

impl CredentialStore {
    pub fn new(db: DatabaseConnection, tokens: TokenService, hasher: PasswordHasher) -> Self {
        let decoy_hash = hasher.decoy_hash();
        Self {
            db,
            tokens,
            hasher,
            decoy_hash,
        }
    }

    /// Crée un compte médecin et retourne un token
    #[instrument(skip_all, fields(email = %request.email))]
    pub async fn register(&self, request: SignUpRequest) -> ApiResult<AuthSession> {
        // 1. Valider les champs
        request.validate()?;
        validation::ensure_email(&request.email)?;
        validation::ensure_strong_password(&request.password)?;

        // 2. Vérifier si l'email existe déjà
        let existing = doctors::Entity::find()
            .filter(doctors::Column::Email.eq(&request.email))
            .one(&self.db)
            .await?;
        if existing.is_some() {
            return Err(ApiError::Conflict("Email already in use".to_string()));
        }

        // 3. Hash le mot de passe (hors du runtime async, PBKDF2 est coûteux)
        let password_hash = self.hash_password(request.password).await?;

        // 4. Créer le médecin (l'index unique sur email tranche les inscriptions simultanées)
        let specialty = request.specialty.filter(|s| !s.is_empty());
        let doctor = doctors::ActiveModel {
            email: Set(request.email),
            password_hash: Set(password_hash),
            first_name: Set(request.first_name),
            last_name: Set(request.last_name),
            phone: Set(request.phone),
            specialty: Set(specialty),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|e| match ApiError::from(e) {
            ApiError::Conflict(_) => ApiError::Conflict("Email already in use".to_string()),
            other => other,
        })?;

        // 5. Générer le JWT
        let token = self.tokens.generate_token(doctor.id, &doctor.email)?;
        info!(doctor_id = doctor.id, "doctor account created");

        Ok(AuthSession {
            doctor_id: doctor.id,
            email: doctor.email,
            first_name: doctor.first_name,
            last_name: doctor.last_name,
            phone: None,
            specialty: doctor.specialty,
            created_at: None,
            token,
        })
    }

    /// Connexion : vérifie le mot de passe et émet un nouveau token
    #[instrument(skip_all, fields(email = %request.email))]
    pub async fn authenticate(&self, request: SignInRequest) -> ApiResult<AuthSession> {
        request.validate()?;

        // 1. Trouver le médecin
        let doctor = doctors::Entity::find()
            .filter(doctors::Column::Email.eq(&request.email))
            .one(&self.db)
            .await?;

        let Some(doctor) = doctor else {
            // Même coût qu'un mauvais mot de passe, résultat ignoré
            let _ = self.check_password(request.password, self.decoy_hash.clone()).await;
            warn!("sign-in rejected");
            return Err(ApiError::Auth(INVALID_CREDENTIALS.to_string()));
        };

        // 2. Vérifier le mot de passe
        let is_valid = self
            .check_password(request.password, doctor.password_hash.clone())
            .await?;

        if !is_valid {
            warn!(doctor_id = doctor.id, "sign-in rejected");
            return Err(ApiError::Auth(INVALID_CREDENTIALS.to_string()));
        }

        // 3. Générer le JWT
        let token = self.tokens.generate_token(doctor.id, &doctor.email)?;

        Ok(AuthSession {
            doctor_id: doctor.id,
            email: doctor.email,
            first_name: doctor.first_name,
            last_name: doctor.last_name,
            phone: Some(doctor.phone),
            specialty: doctor.specialty,
            created_at: Some(doctor.created_at),
            token,
        })
    }

    /// Vérifie un token et retourne son contenu
    pub fn verify(&self, token: &str) -> ApiResult<Claims> {
        self.tokens.verify_token(token)
    }

    /// Déconnexion sans état : rien n'est invalidé côté serveur,
    /// le token reste valable jusqu'à son expiration.
    pub fn revoke(&self, doctor_id: i32) {
        info!(doctor_id, "doctor signed out (token left to expire)");
    }

    /// Profil du médecin connecté (GET /auth/me)
    pub async fn current_doctor(&self, doctor_id: i32) -> ApiResult<doctors::Model> {
        doctors::Entity::find_by_id(doctor_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ApiError::not_found("Doctor not found"))
    }

    async fn check_password(&self, plain: String, stored_hash: String) -> ApiResult<bool> {
        actix_web::web::block(move || password::verify_password(&plain, &stored_hash))
            .await
            .map_err(|e| ApiError::internal("Password verification error", e))?
            .map_err(|e| ApiError::internal("Password verification error", e))
    }

    async fn hash_password(&self, plain: String) -> ApiResult<String> {
        let hasher = self.hasher;
        actix_web::web::block(move || hasher.hash(&plain))
            .await
            .map_err(|e| ApiError::internal("Failed to hash password", e))?
            .map_err(|e| ApiError::internal("Failed to hash password", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;
    use std::time::{Duration, Instant};

    fn sign_up(email: &str, password: &str) -> SignUpRequest {
        SignUpRequest {
            first_name: "Gregory".to_string(),
            last_name: "House".to_string(),
            email: email.to_string(),
            password: password.to_string(),
            phone: "0600000000".to_string(),
            specialty: Some("Diagnostics".to_string()),
        }
    }

    fn sign_in(email: &str, password: &str) -> SignInRequest {
        SignInRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[actix_web::test]
    async fn test_register_issues_verifiable_token() {
        let db = test_support::memory_db().await;
        let store = test_support::credential_store(&db);

        let session = store.register(sign_up("house@clinic.test", "Secret123")).await.unwrap();
        let claims = store.verify(&session.token).unwrap();
        assert_eq!(claims.doctor_id, session.doctor_id);
        assert_eq!(claims.email, "house@clinic.test");

        let stored = doctors::Entity::find_by_id(session.doctor_id).one(&db).await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "Secret123");
        assert!(password::verify_password("Secret123", &stored.password_hash).unwrap());
    }

    #[actix_web::test]
    async fn test_register_rejects_duplicate_email() {
        let db = test_support::memory_db().await;
        let store = test_support::credential_store(&db);

        store.register(sign_up("house@clinic.test", "Secret123")).await.unwrap();
        let result = store.register(sign_up("house@clinic.test", "Other1234")).await;
        assert!(matches!(result, Err(ApiError::Conflict(_))));
    }

    #[actix_web::test]
    async fn test_register_validates_input() {
        let db = test_support::memory_db().await;
        let store = test_support::credential_store(&db);

        let weak = store.register(sign_up("house@clinic.test", "secret")).await;
        assert!(matches!(weak, Err(ApiError::Validation(_))));

        let bad_email = store.register(sign_up("house-at-clinic", "Secret123")).await;
        assert!(matches!(bad_email, Err(ApiError::Validation(_))));

        let mut missing = sign_up("house@clinic.test", "Secret123");
        missing.last_name = String::new();
        assert!(matches!(store.register(missing).await, Err(ApiError::Validation(_))));

        let count = doctors::Entity::find().count(&db).await.unwrap();
        assert_eq!(count, 0);
    }

    #[actix_web::test]
    async fn test_authenticate() {
        let db = test_support::memory_db().await;
        let store = test_support::credential_store(&db);
        let created = store.register(sign_up("house@clinic.test", "Secret123")).await.unwrap();

        let session = store.authenticate(sign_in("house@clinic.test", "Secret123")).await.unwrap();
        assert_eq!(session.doctor_id, created.doctor_id);
        assert_eq!(session.phone.as_deref(), Some("0600000000"));
        assert_eq!(store.verify(&session.token).unwrap().doctor_id, created.doctor_id);
    }

    #[actix_web::test]
    async fn test_wrong_password_and_unknown_email_look_the_same() {
        let db = test_support::memory_db().await;
        let store = test_support::credential_store(&db);
        store.register(sign_up("house@clinic.test", "Secret123")).await.unwrap();

        let wrong_password = store.authenticate(sign_in("house@clinic.test", "Wrong1234")).await;
        let unknown_email = store.authenticate(sign_in("nobody@clinic.test", "Secret123")).await;

        match (wrong_password, unknown_email) {
            (Err(ApiError::Auth(a)), Err(ApiError::Auth(b))) => {
                assert_eq!(a, b);
                assert_eq!(a, INVALID_CREDENTIALS);
            }
            other => panic!("expected two auth errors, got {:?}", other),
        }
    }

    #[test]
    fn test_decoy_hash_uses_configured_cost() {
        let hasher = PasswordHasher::new(1_000);
        let decoy = hasher.decoy_hash();
        assert!(decoy.starts_with("pbkdf2:sha256:1000$"));
        // Format valide : la vérification dérive vraiment la clé et échoue
        assert_eq!(password::verify_password("Secret123", &decoy), Ok(false));
    }

    #[actix_web::test]
    async fn test_unknown_email_costs_as_much_as_wrong_password() {
        let db = test_support::memory_db().await;
        let store = CredentialStore::new(
            db.clone(),
            test_support::token_service(),
            PasswordHasher::new(20_000),
        );
        store.register(sign_up("house@clinic.test", "Secret123")).await.unwrap();

        // Meilleur de trois essais pour lisser le bruit de l'ordonnanceur
        let mut wrong_password = Duration::MAX;
        let mut unknown_email = Duration::MAX;
        for _ in 0..3 {
            let started = Instant::now();
            let _ = store.authenticate(sign_in("house@clinic.test", "Wrong1234")).await;
            wrong_password = wrong_password.min(started.elapsed());

            let started = Instant::now();
            let _ = store.authenticate(sign_in("nobody@clinic.test", "Wrong1234")).await;
            unknown_email = unknown_email.min(started.elapsed());
        }

        assert!(
            unknown_email * 4 >= wrong_password,
            "unknown email answered in {:?}, wrong password in {:?}",
            unknown_email,
            wrong_password
        );
    }

    #[actix_web::test]
    async fn test_current_doctor_not_found() {
        let db = test_support::memory_db().await;
        let store = test_support::credential_store(&db);
        assert!(matches!(store.current_doctor(42).await, Err(ApiError::NotFound(_))));
    }
}
