mod api;
mod config;
mod database;
mod middleware;
mod models;
mod services;
mod state;
mod utils;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::io;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::state::AppState;

fn startup_error(message: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, message.to_string())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| {
        log::error!("❌ Invalid configuration: {}", e);
        startup_error(e)
    })?;

    log::info!("🚀 Starting UpTask service...");

    let store = database::connect(&config).await.map_err(|e| {
        log::error!("❌ Failed to connect to the database: {}", e);
        startup_error(e)
    })?;
    let mailer = services::email_service::build_mailer(&config.mail).map_err(startup_error)?;

    let host = config.host.clone();
    let port = config.port;
    let state = web::Data::new(AppState::new(store, mailer, config));

    log::info!("🌐 Server starting on {}:{}", host, port);
    log::info!("🔓 CORS origin: {}", state.config.frontend_url);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", host, port);
    log::info!("📄 OpenAPI spec at: http://{}:{}/api-docs/openapi.json", host, port);

    // Start HTTP server
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&state.config.frontend_url)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
            ])
            .expose_headers(vec![actix_web::http::header::CONTENT_TYPE])
            .supports_credentials()
            .max_age(3600);

        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(state.clone())
            .wrap(cors)
            .wrap(middleware::SecurityHeaders)
            .wrap(Logger::default())
            .service(SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi))
            .configure(api::configure)
    })
    .bind(format!("{}:{}", host, port))?
    .run()
    .await
}
