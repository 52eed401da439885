use actix_web::{put, web, HttpResponse};

use crate::error::ApiResult;
use crate::middleware::AuthDoctor;
use crate::models::dto::{ApiResponse, ProfileSettingsRequest};
use crate::services::ProfileSettings;

/// PUT /setting/handleSendProfilSetting - Modifier son profil (PROTÉGÉ)
#[put("/handleSendProfilSetting")]
pub async fn update_profile(
    auth: AuthDoctor,
    body: web::Json<ProfileSettingsRequest>,
    settings: web::Data<ProfileSettings>,
) -> ApiResult<HttpResponse> {
    let profile = settings.update_profile(auth.doctor_id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(profile).with_message("Profile updated successfully")))
}

pub fn setting_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/setting").service(update_profile));
}
