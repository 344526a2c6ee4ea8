use actix_web::{web, HttpResponse};

use crate::middleware::auth::Claims;
use crate::models::UserSummary;
use crate::services::access::current_user;
use crate::services::auth_service::MessageResponse;
use crate::services::profile_service::{self, CheckPasswordRequest, ProfileRequest, UpdatePasswordRequest};
use crate::state::AppState;
use crate::utils::AppResult;

#[utoipa::path(
    get,
    path = "/auth/user",
    tag = "Profile",
    responses(
        (status = 200, description = "Current user", body = UserSummary),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_user(state: web::Data<AppState>, claims: web::ReqData<Claims>) -> AppResult<HttpResponse> {
    let user = current_user(state.store.as_ref(), &claims).await?;
    Ok(HttpResponse::Ok().json(profile_service::current_profile(&user)))
}

#[utoipa::path(
    put,
    path = "/auth/profile",
    tag = "Profile",
    request_body = ProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = MessageResponse),
        (status = 409, description = "Email belongs to another account")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_profile(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    request: web::Json<ProfileRequest>,
) -> AppResult<HttpResponse> {
    let user = current_user(state.store.as_ref(), &claims).await?;
    let response = profile_service::update_profile(&state, user, &request).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[utoipa::path(
    post,
    path = "/auth/update-password",
    tag = "Profile",
    request_body = UpdatePasswordRequest,
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 401, description = "Current password is incorrect")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_password(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    request: web::Json<UpdatePasswordRequest>,
) -> AppResult<HttpResponse> {
    let user = current_user(state.store.as_ref(), &claims).await?;
    let response = profile_service::update_password(&state, user, &request).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[utoipa::path(
    post,
    path = "/auth/check-password",
    tag = "Profile",
    request_body = CheckPasswordRequest,
    responses(
        (status = 200, description = "Password is correct", body = MessageResponse),
        (status = 401, description = "Password is incorrect")
    ),
    security(("bearer_auth" = []))
)]
pub async fn check_password(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    request: web::Json<CheckPasswordRequest>,
) -> AppResult<HttpResponse> {
    let user = current_user(state.store.as_ref(), &claims).await?;
    let response = profile_service::check_password(&user, &request)?;
    Ok(HttpResponse::Ok().json(response))
}
