use actix_web::{web, HttpResponse};

use crate::services::auth_service::{
    self, CreateAccountRequest, EmailRequest, LoginRequest, LoginResponse, MessageResponse, NewPasswordRequest,
    TokenRequest,
};
use crate::state::AppState;
use crate::utils::AppResult;

#[utoipa::path(
    post,
    path = "/auth/create-account",
    tag = "Auth",
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Account created, confirmation code emailed", body = MessageResponse),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Email already in use")
    )
)]
pub async fn create_account(
    state: web::Data<AppState>,
    request: web::Json<CreateAccountRequest>,
) -> AppResult<HttpResponse> {
    log::info!("📝 POST /auth/create-account - email: {}", request.email);
    let response = auth_service::create_account(&state, &request).await?;
    Ok(HttpResponse::Created().json(response))
}

#[utoipa::path(
    post,
    path = "/auth/confirm-account",
    tag = "Auth",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Account confirmed", body = MessageResponse),
        (status = 404, description = "Invalid or expired token")
    )
)]
pub async fn confirm_account(
    state: web::Data<AppState>,
    request: web::Json<TokenRequest>,
) -> AppResult<HttpResponse> {
    log::info!("✉️  POST /auth/confirm-account");
    let response = auth_service::confirm_account(&state, &request).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Wrong password or account not confirmed"),
        (status = 404, description = "Unknown email")
    )
)]
pub async fn login(state: web::Data<AppState>, request: web::Json<LoginRequest>) -> AppResult<HttpResponse> {
    log::info!("🔐 POST /auth/login - email: {}", request.email);

    match auth_service::login(&state, &request).await {
        Ok(response) => {
            log::info!("✅ Login successful: {}", request.email);
            Ok(HttpResponse::Ok().json(response))
        }
        Err(e) => {
            log::warn!("❌ Login failed: {} - {}", request.email, e);
            Err(e)
        }
    }
}

#[utoipa::path(
    post,
    path = "/auth/request-code",
    tag = "Auth",
    request_body = EmailRequest,
    responses(
        (status = 200, description = "New confirmation code emailed", body = MessageResponse),
        (status = 403, description = "Account already confirmed"),
        (status = 404, description = "Unknown email")
    )
)]
pub async fn request_code(state: web::Data<AppState>, request: web::Json<EmailRequest>) -> AppResult<HttpResponse> {
    log::info!("🔁 POST /auth/request-code - email: {}", request.email);
    let response = auth_service::request_confirmation_code(&state, &request).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[utoipa::path(
    post,
    path = "/auth/forgot-password",
    tag = "Auth",
    request_body = EmailRequest,
    responses(
        (status = 200, description = "Reset code emailed", body = MessageResponse),
        (status = 404, description = "Unknown email")
    )
)]
pub async fn forgot_password(
    state: web::Data<AppState>,
    request: web::Json<EmailRequest>,
) -> AppResult<HttpResponse> {
    log::info!("🔑 POST /auth/forgot-password - email: {}", request.email);
    let response = auth_service::forgot_password(&state, &request).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[utoipa::path(
    post,
    path = "/auth/validate-token",
    tag = "Auth",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Token is valid", body = MessageResponse),
        (status = 404, description = "Invalid or expired token")
    )
)]
pub async fn validate_token(state: web::Data<AppState>, request: web::Json<TokenRequest>) -> AppResult<HttpResponse> {
    let response = auth_service::validate_token(&state, &request).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[utoipa::path(
    post,
    path = "/auth/update-password/{token}",
    tag = "Auth",
    params(("token" = String, Path, description = "Six-digit reset code")),
    request_body = NewPasswordRequest,
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 404, description = "Invalid or expired token")
    )
)]
pub async fn update_password_with_token(
    state: web::Data<AppState>,
    path: web::Path<String>,
    request: web::Json<NewPasswordRequest>,
) -> AppResult<HttpResponse> {
    let response = auth_service::update_password_with_token(&state, &path, &request).await?;
    Ok(HttpResponse::Ok().json(response))
}
