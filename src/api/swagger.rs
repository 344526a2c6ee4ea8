use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "UpTask API",
        version = "1.0.0",
        description = "Project and task management API.\n\n**Authentication:** everything except `/auth/*` account endpoints and `/health` requires a JWT Bearer token obtained from `/auth/login`."
    ),
    paths(
        // Auth
        crate::api::auth::create_account,
        crate::api::auth::confirm_account,
        crate::api::auth::login,
        crate::api::auth::request_code,
        crate::api::auth::forgot_password,
        crate::api::auth::validate_token,
        crate::api::auth::update_password_with_token,

        // Profile
        crate::api::profile::get_user,
        crate::api::profile::update_profile,
        crate::api::profile::update_password,
        crate::api::profile::check_password,

        // Health
        crate::api::health::health_check,
    ),
    components(
        schemas(
            crate::services::auth_service::CreateAccountRequest,
            crate::services::auth_service::TokenRequest,
            crate::services::auth_service::LoginRequest,
            crate::services::auth_service::EmailRequest,
            crate::services::auth_service::NewPasswordRequest,
            crate::services::auth_service::MessageResponse,
            crate::services::auth_service::LoginResponse,
            crate::services::profile_service::ProfileRequest,
            crate::services::profile_service::UpdatePasswordRequest,
            crate::services::profile_service::CheckPasswordRequest,
            crate::models::UserSummary,
            crate::api::health::HealthResponse,
        )
    ),
    tags(
        (name = "Auth", description = "Account creation, email confirmation, login and password reset with emailed six-digit codes."),
        (name = "Profile", description = "Authenticated profile and password management."),
        (name = "Health", description = "Liveness check including database reachability."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT returned by /auth/login"))
                        .build(),
                ),
            );
        }
    }
}
