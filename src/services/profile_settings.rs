use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::*;
use tracing::{info, instrument};
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::models::doctors;
use crate::models::dto::{DoctorAccount, DoctorProfile, ProfileSettingsRequest};
use crate::services::patch::{apply_patch, Assignment, Patch};
use crate::utils::validation;

/// Tous les champs du profil sont réécrits ensemble
#[derive(Debug, Clone)]
struct ProfilePatch {
    email: String,
    first_name: String,
    last_name: String,
    phone: String,
    specialty: String,
    updated_at: DateTime<Utc>,
}

impl Patch for ProfilePatch {
    type Entity = doctors::Entity;

    fn assignments(&self) -> Vec<Assignment<doctors::Entity>> {
        vec![
            (doctors::Column::Email, Expr::value(self.email.clone())),
            (doctors::Column::FirstName, Expr::value(self.first_name.clone())),
            (doctors::Column::LastName, Expr::value(self.last_name.clone())),
            (doctors::Column::Phone, Expr::value(self.phone.clone())),
            (doctors::Column::Specialty, Expr::value(self.specialty.clone())),
            // update_many ne passe pas par before_save
            (doctors::Column::UpdatedAt, Expr::value(self.updated_at)),
        ]
    }
}

impl From<doctors::Model> for DoctorAccount {
    fn from(doctor: doctors::Model) -> Self {
        Self {
            doctor_id: doctor.id,
            email: doctor.email,
            first_name: doctor.first_name,
            last_name: doctor.last_name,
            phone: doctor.phone,
            specialty: doctor.specialty,
            created_at: doctor.created_at,
            updated_at: doctor.updated_at,
        }
    }
}

impl From<doctors::Model> for DoctorProfile {
    fn from(doctor: doctors::Model) -> Self {
        Self {
            doctor_id: doctor.id,
            email: doctor.email,
            first_name: doctor.first_name,
            last_name: doctor.last_name,
            phone: doctor.phone,
            specialty: doctor.specialty,
        }
    }
}

/// Paramètres du profil du médecin connecté
pub struct ProfileSettings {
    db: DatabaseConnection,
}

impl ProfileSettings {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request))]
    pub async fn update_profile(
        &self,
        doctor_id: i32,
        request: ProfileSettingsRequest,
    ) -> ApiResult<DoctorProfile> {
        // 1. Valider
        request.validate()?;
        validation::ensure_email(&request.email)?;
        validation::ensure_phone(&request.phone)?;

        // 2. Email déjà pris par un autre médecin ?
        let taken = doctors::Entity::find()
            .filter(doctors::Column::Email.eq(&request.email))
            .filter(doctors::Column::Id.ne(doctor_id))
            .one(&self.db)
            .await?;
        if taken.is_some() {
            return Err(ApiError::Conflict("Email already in use".to_string()));
        }

        // 3. Appliquer (l'index unique sur email reste l'arbitre final)
        let patch = ProfilePatch {
            email: request.email,
            first_name: request.first_name,
            last_name: request.last_name,
            phone: request.phone,
            specialty: request.specialty,
            updated_at: Utc::now(),
        };
        let scope = Condition::all().add(doctors::Column::Id.eq(doctor_id));
        let updated = apply_patch(&self.db, &patch, scope)
            .await
            .map_err(|e| match ApiError::from(e) {
                ApiError::Conflict(_) => ApiError::Conflict("Email already in use".to_string()),
                other => other,
            })?;
        if updated == 0 {
            return Err(ApiError::not_found("Doctor not found"));
        }

        let doctor = doctors::Entity::find_by_id(doctor_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ApiError::not_found("Doctor not found"))?;

        info!("profile updated");
        Ok(DoctorProfile::from(doctor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    fn settings(email: &str, phone: &str) -> ProfileSettingsRequest {
        ProfileSettingsRequest {
            email: email.to_string(),
            first_name: "Lisa".to_string(),
            last_name: "Cuddy".to_string(),
            phone: phone.to_string(),
            specialty: "Endocrinology".to_string(),
        }
    }

    #[actix_web::test]
    async fn test_update_profile() {
        let db = test_support::memory_db().await;
        let doctor = test_support::seed_doctor(&db, "house@clinic.test").await;
        let service = ProfileSettings::new(db.clone());

        let profile = service
            .update_profile(doctor.id, settings("cuddy@clinic.test", "0611223344"))
            .await
            .unwrap();
        assert_eq!(profile.doctor_id, doctor.id);
        assert_eq!(profile.email, "cuddy@clinic.test");
        assert_eq!(profile.specialty.as_deref(), Some("Endocrinology"));

        let stored = doctors::Entity::find_by_id(doctor.id).one(&db).await.unwrap().unwrap();
        assert_eq!(stored.first_name, "Lisa");
        assert_eq!(stored.password_hash, doctor.password_hash);
        assert!(stored.updated_at >= doctor.updated_at);
    }

    #[actix_web::test]
    async fn test_keeping_own_email_is_allowed() {
        let db = test_support::memory_db().await;
        let doctor = test_support::seed_doctor(&db, "house@clinic.test").await;
        let service = ProfileSettings::new(db.clone());

        let profile = service
            .update_profile(doctor.id, settings("house@clinic.test", "0611223344"))
            .await
            .unwrap();
        assert_eq!(profile.email, "house@clinic.test");
    }

    #[actix_web::test]
    async fn test_email_of_another_doctor_conflicts() {
        let db = test_support::memory_db().await;
        let doctor = test_support::seed_doctor(&db, "house@clinic.test").await;
        test_support::seed_doctor(&db, "wilson@clinic.test").await;
        let service = ProfileSettings::new(db.clone());

        let result = service
            .update_profile(doctor.id, settings("wilson@clinic.test", "0611223344"))
            .await;
        assert!(matches!(result, Err(ApiError::Conflict(_))));
    }

    #[actix_web::test]
    async fn test_unique_email_index_maps_to_conflict() {
        let db = test_support::memory_db().await;
        let doctor = test_support::seed_doctor(&db, "house@clinic.test").await;
        test_support::seed_doctor(&db, "wilson@clinic.test").await;

        // Écriture directe, sans la vérification préalable du service
        let patch = ProfilePatch {
            email: "wilson@clinic.test".to_string(),
            first_name: "Lisa".to_string(),
            last_name: "Cuddy".to_string(),
            phone: "0611223344".to_string(),
            specialty: "Endocrinology".to_string(),
            updated_at: Utc::now(),
        };
        let scope = Condition::all().add(doctors::Column::Id.eq(doctor.id));
        let err = apply_patch(&db, &patch, scope).await.unwrap_err();
        assert!(matches!(ApiError::from(err), ApiError::Conflict(_)));

        let stored = doctors::Entity::find_by_id(doctor.id).one(&db).await.unwrap().unwrap();
        assert_eq!(stored.email, "house@clinic.test");
    }

    #[actix_web::test]
    async fn test_validation() {
        let db = test_support::memory_db().await;
        let doctor = test_support::seed_doctor(&db, "house@clinic.test").await;
        let service = ProfileSettings::new(db.clone());

        let short_phone = service.update_profile(doctor.id, settings("a@b.co", "06123")).await;
        assert!(matches!(short_phone, Err(ApiError::Validation(_))));

        let bad_email = service.update_profile(doctor.id, settings("not-an-email", "0611223344")).await;
        assert!(matches!(bad_email, Err(ApiError::Validation(_))));

        let mut missing = settings("a@b.co", "0611223344");
        missing.specialty = String::new();
        assert!(matches!(service.update_profile(doctor.id, missing).await, Err(ApiError::Validation(_))));
    }

    #[actix_web::test]
    async fn test_unknown_doctor() {
        let db = test_support::memory_db().await;
        let service = ProfileSettings::new(db.clone());
        let result = service.update_profile(42, settings("a@b.co", "0611223344")).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }
}
