pub mod auth;
pub mod health;
pub mod notes;
pub mod profile;
pub mod projects;
pub mod swagger;
pub mod tasks;
pub mod team;

#[cfg(test)]
mod tests;

use actix_web::{error, web};

use crate::middleware::AuthMiddleware;
use crate::utils::AppError;

/// Malformed or mistyped JSON bodies answer as a validation error on `body`
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let message = match &err {
            error::JsonPayloadError::ContentType => "Expected a JSON body".to_string(),
            error::JsonPayloadError::Deserialize(e) => format!("Invalid request body: {}", e),
            other => other.to_string(),
        };
        AppError::validation("body", &message).into()
    })
}

/// Every route of the service except Swagger UI
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .route("/health", web::get().to(health::health_check))
        .service(
            web::scope("/auth")
                .route("/create-account", web::post().to(auth::create_account))
                .route("/confirm-account", web::post().to(auth::confirm_account))
                .route("/login", web::post().to(auth::login))
                .route("/request-code", web::post().to(auth::request_code))
                .route("/forgot-password", web::post().to(auth::forgot_password))
                .route("/validate-token", web::post().to(auth::validate_token))
                .route("/update-password/{token}", web::post().to(auth::update_password_with_token))
                // Protected endpoints requiring JWT authentication
                .service(
                    web::resource("/user")
                        .wrap(AuthMiddleware)
                        .route(web::get().to(profile::get_user)),
                )
                .service(
                    web::resource("/profile")
                        .wrap(AuthMiddleware)
                        .route(web::put().to(profile::update_profile)),
                )
                .service(
                    web::resource("/update-password")
                        .wrap(AuthMiddleware)
                        .route(web::post().to(profile::update_password)),
                )
                .service(
                    web::resource("/check-password")
                        .wrap(AuthMiddleware)
                        .route(web::post().to(profile::check_password)),
                ),
        )
        .service(
            web::scope("/projects")
                .wrap(AuthMiddleware)
                .service(projects::list_projects)
                .service(projects::create_project)
                .service(projects::get_project)
                .service(projects::update_project)
                .service(projects::delete_project)
                .service(tasks::create_task)
                .service(tasks::list_tasks)
                .service(tasks::get_task)
                .service(tasks::update_task)
                .service(tasks::delete_task)
                .service(tasks::update_status)
                .service(team::find_member)
                .service(team::list_team)
                .service(team::add_member)
                .service(team::remove_member)
                .service(notes::create_note)
                .service(notes::list_notes)
                .service(notes::delete_note),
        );
}
