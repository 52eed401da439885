use actix_web::{get, post, web, HttpResponse};

use crate::error::ApiResult;
use crate::middleware::AuthDoctor;
use crate::models::dto::{ApiResponse, DoctorAccount, SignInRequest, SignUpRequest};
use crate::services::CredentialStore;

/// POST /auth/signup - Créer un compte médecin (PUBLIC)
#[post("/signup")]
pub async fn signup(
    body: web::Json<SignUpRequest>,
    store: web::Data<CredentialStore>,
) -> ApiResult<HttpResponse> {
    let session = store.register(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(session).with_message("Doctor registered successfully")))
}

/// POST /auth/signin - Se connecter (PUBLIC)
#[post("/signin")]
pub async fn signin(
    body: web::Json<SignInRequest>,
    store: web::Data<CredentialStore>,
) -> ApiResult<HttpResponse> {
    let session = store.authenticate(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(session).with_message("Signed in successfully")))
}

/// POST /auth/signout - Se déconnecter (PROTÉGÉ)
/// Le token n'est pas invalidé : le client doit l'oublier
#[post("/signout")]
pub async fn signout(auth: AuthDoctor, store: web::Data<CredentialStore>) -> HttpResponse {
    store.revoke(auth.doctor_id);
    HttpResponse::Ok().json(ApiResponse::acknowledge("Signed out successfully"))
}

/// GET /auth/me - Médecin connecté (PROTÉGÉ)
#[get("/me")]
pub async fn me(auth: AuthDoctor, store: web::Data<CredentialStore>) -> ApiResult<HttpResponse> {
    let doctor = store.current_doctor(auth.doctor_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(DoctorAccount::from(doctor))))
}

pub fn auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(signup)
            .service(signin)
            .service(signout)
            .service(me),
    );
}
