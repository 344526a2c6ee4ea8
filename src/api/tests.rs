use actix_web::{http::StatusCode, test, web, App};
use mongodb::bson::oid::ObjectId;
use serde_json::{json, Value};
use std::sync::Arc;

use super::configure;
use crate::config::Config;
use crate::database::{MemoryStore, Store};
use crate::middleware::SecurityHeaders;
use crate::services::auth_service::{self, CreateAccountRequest, LoginRequest, TokenRequest};
use crate::services::email_service::testing::RecordingMailer;
use crate::state::AppState;

struct Harness {
    state: AppState,
    store: Arc<MemoryStore>,
    mailer: Arc<RecordingMailer>,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let mailer = Arc::new(RecordingMailer::default());
    let state = AppState::new(store.clone(), mailer.clone(), Config::for_tests());
    Harness { state, store, mailer }
}

macro_rules! init_app {
    ($h:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($h.state.clone()))
                .wrap(SecurityHeaders)
                .configure(configure),
        )
        .await
    };
}

/// Sends the request and returns the status with the JSON body (Null if empty)
macro_rules! send {
    ($app:expr, $req:expr) => {{
        let res = test::call_service(&$app, $req.to_request()).await;
        let status = res.status();
        let bytes = test::read_body(res).await;
        let body: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }};
}

/// Registers, confirms and logs in a user; returns its id and JWT
async fn confirmed_user(h: &Harness, name: &str, email: &str) -> (ObjectId, String) {
    auth_service::create_account(
        &h.state,
        &CreateAccountRequest {
            name: name.into(),
            email: email.into(),
            password: "password123".into(),
            password_confirmation: "password123".into(),
        },
    )
    .await
    .unwrap();
    let token = h.mailer.last_token_for(email).unwrap();
    auth_service::confirm_account(&h.state, &TokenRequest { token }).await.unwrap();

    let jwt = auth_service::login(
        &h.state,
        &LoginRequest {
            email: email.into(),
            password: "password123".into(),
        },
    )
    .await
    .unwrap()
    .token;
    let user = h.store.find_user_by_email(email).await.unwrap().unwrap();
    (user.id, jwt)
}

fn bearer(jwt: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", jwt))
}

fn project_body(name: &str) -> Value {
    json!({ "projectName": name, "clientName": "ACME", "description": "Website" })
}

fn task_body(name: &str) -> Value {
    json!({ "name": name, "description": "Do it" })
}

#[actix_web::test]
async fn test_account_lifecycle() {
    let h = harness();
    let app = init_app!(h);
    let account = json!({
        "name": "Ana",
        "email": "ana@example.com",
        "password": "password123",
        "password_confirmation": "password123"
    });

    let (status, body) = send!(app, test::TestRequest::post().uri("/auth/create-account").set_json(&account));
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);

    let (status, _) = send!(app, test::TestRequest::post().uri("/auth/create-account").set_json(&account));
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(h.store.user_count().await, 1);

    let credentials = json!({ "email": "ana@example.com", "password": "password123" });
    let (status, body) = send!(app, test::TestRequest::post().uri("/auth/login").set_json(&credentials));
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(h.mailer.sent().len(), 2);

    let token = h.mailer.last_token_for("ana@example.com").unwrap();
    let (status, _) = send!(
        app,
        test::TestRequest::post()
            .uri("/auth/confirm-account")
            .set_json(json!({ "token": token }))
    );
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send!(
        app,
        test::TestRequest::post()
            .uri("/auth/confirm-account")
            .set_json(json!({ "token": token }))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send!(app, test::TestRequest::post().uri("/auth/login").set_json(&credentials));
    assert_eq!(status, StatusCode::OK);
    let jwt = body["token"].as_str().unwrap().to_string();

    let (status, body) = send!(app, test::TestRequest::get().uri("/auth/user").insert_header(bearer(&jwt)));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "ana@example.com");
    assert!(body.get("password").is_none());

    let (status, body) = send!(app, test::TestRequest::get().uri("/auth/user"));
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

#[actix_web::test]
async fn test_validation_errors_list_fields() {
    let h = harness();
    let app = init_app!(h);

    let (status, body) = send!(
        app,
        test::TestRequest::post().uri("/auth/create-account").set_json(json!({
            "name": "Ana",
            "email": "not-an-email",
            "password": "short",
            "password_confirmation": "other"
        }))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|e| e["field"].as_str())
        .collect();
    assert!(fields.contains(&"email"));
    assert!(fields.contains(&"password"));
    assert!(fields.contains(&"password_confirmation"));

    let (status, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/auth/login")
            .insert_header(("Content-Type", "application/json"))
            .set_payload("{not json")
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["errors"][0]["field"], "body");
    assert!(body["errors"][0]["message"]
        .as_str()
        .unwrap()
        .starts_with("Invalid request body"));
}

#[actix_web::test]
async fn test_expired_reset_token_is_rejected() {
    let h = harness();
    let app = init_app!(h);
    confirmed_user(&h, "Ana", "ana@example.com").await;

    let (status, _) = send!(
        app,
        test::TestRequest::post()
            .uri("/auth/forgot-password")
            .set_json(json!({ "email": "ana@example.com" }))
    );
    assert_eq!(status, StatusCode::OK);
    let token = h.mailer.last_token_for("ana@example.com").unwrap();
    h.store.age_token(&token, 11).await;

    let (status, _) = send!(
        app,
        test::TestRequest::post()
            .uri("/auth/validate-token")
            .set_json(json!({ "token": token }))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send!(
        app,
        test::TestRequest::post()
            .uri(&format!("/auth/update-password/{}", token))
            .set_json(json!({ "password": "brand-new-pass", "password_confirmation": "brand-new-pass" }))
    );
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_team_permissions() {
    let h = harness();
    let app = init_app!(h);
    let (_, manager) = confirmed_user(&h, "Manager", "manager@example.com").await;
    let (member_id, member) = confirmed_user(&h, "Member", "member@example.com").await;
    let (_, outsider) = confirmed_user(&h, "Outsider", "outsider@example.com").await;

    let (status, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/projects")
            .insert_header(bearer(&manager))
            .set_json(project_body("Site"))
    );
    assert_eq!(status, StatusCode::CREATED);
    let project_id = body["project"]["id"].as_str().unwrap().to_string();
    let team_uri = format!("/projects/{}/team", project_id);

    let (status, body) = send!(
        app,
        test::TestRequest::post()
            .uri(&format!("{}/find", team_uri))
            .insert_header(bearer(&manager))
            .set_json(json!({ "email": "member@example.com" }))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], member_id.to_hex());

    let add = json!({ "id": member_id.to_hex() });
    let (status, _) = send!(
        app,
        test::TestRequest::post().uri(&team_uri).insert_header(bearer(&manager)).set_json(&add)
    );
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send!(
        app,
        test::TestRequest::post().uri(&team_uri).insert_header(bearer(&manager)).set_json(&add)
    );
    assert_eq!(status, StatusCode::CONFLICT);

    let project_uri = format!("/projects/{}", project_id);
    let (status, _) = send!(
        app,
        test::TestRequest::put()
            .uri(&project_uri)
            .insert_header(bearer(&member))
            .set_json(project_body("Hijacked"))
    );
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send!(app, test::TestRequest::delete().uri(&project_uri).insert_header(bearer(&member)));
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send!(
        app,
        test::TestRequest::get()
            .uri(&format!("{}/tasks", project_uri))
            .insert_header(bearer(&member))
    );
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send!(app, test::TestRequest::get().uri(&team_uri).insert_header(bearer(&member)));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["team"].as_array().unwrap().len(), 1);

    let (status, _) = send!(app, test::TestRequest::get().uri(&project_uri).insert_header(bearer(&outsider)));
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send!(app, test::TestRequest::get().uri("/projects").insert_header(bearer(&member)));
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);

    let (status, _) = send!(
        app,
        test::TestRequest::delete()
            .uri(&format!("{}/{}", team_uri, member_id.to_hex()))
            .insert_header(bearer(&manager))
    );
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send!(app, test::TestRequest::get().uri(&project_uri).insert_header(bearer(&member)));
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_project_id_resolution() {
    let h = harness();
    let app = init_app!(h);
    let (_, jwt) = confirmed_user(&h, "Ana", "ana@example.com").await;

    let (status, body) = send!(app, test::TestRequest::get().uri("/projects/not-an-id").insert_header(bearer(&jwt)));
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "project_id");

    let uri = format!("/projects/{}", ObjectId::new().to_hex());
    let (status, _) = send!(app, test::TestRequest::get().uri(&uri).insert_header(bearer(&jwt)));
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_task_lifecycle_keeps_project_in_sync() {
    let h = harness();
    let app = init_app!(h);
    let (_, jwt) = confirmed_user(&h, "Ana", "ana@example.com").await;

    let (_, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/projects")
            .insert_header(bearer(&jwt))
            .set_json(project_body("Site"))
    );
    let project_id = body["project"]["id"].as_str().unwrap().to_string();
    let tasks_uri = format!("/projects/{}/tasks", project_id);

    let (status, body) = send!(
        app,
        test::TestRequest::post()
            .uri(&tasks_uri)
            .insert_header(bearer(&jwt))
            .set_json(task_body("Design"))
    );
    assert_eq!(status, StatusCode::CREATED);
    let task_id = body["task"]["id"].as_str().unwrap().to_string();
    let task_uri = format!("{}/{}", tasks_uri, task_id);

    let (status, body) = send!(
        app,
        test::TestRequest::post()
            .uri(&format!("{}/status", task_uri))
            .insert_header(bearer(&jwt))
            .set_json(json!({ "status": "underReview" }))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["task"]["status"], "underReview");

    let (status, _) = send!(
        app,
        test::TestRequest::post()
            .uri(&format!("{}/status", task_uri))
            .insert_header(bearer(&jwt))
            .set_json(json!({ "status": "done" }))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send!(
        app,
        test::TestRequest::get()
            .uri(&format!("/projects/{}", project_id))
            .insert_header(bearer(&jwt))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["project"]["tasks"][0]["id"], task_id);

    let (status, _) = send!(app, test::TestRequest::delete().uri(&task_uri).insert_header(bearer(&jwt)));
    assert_eq!(status, StatusCode::OK);

    let project = h
        .store
        .find_project(&ObjectId::parse_str(&project_id).unwrap())
        .await
        .unwrap()
        .unwrap();
    assert!(project.tasks.is_empty());
    let (status, _) = send!(app, test::TestRequest::get().uri(&task_uri).insert_header(bearer(&jwt)));
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_create_task_failure_leaves_no_orphan() {
    let h = harness();
    let app = init_app!(h);
    let (_, jwt) = confirmed_user(&h, "Ana", "ana@example.com").await;

    let (_, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/projects")
            .insert_header(bearer(&jwt))
            .set_json(project_body("Site"))
    );
    let project_id = body["project"]["id"].as_str().unwrap().to_string();

    h.store.fail_on("push_project_task");
    let (status, body) = send!(
        app,
        test::TestRequest::post()
            .uri(&format!("/projects/{}/tasks", project_id))
            .insert_header(bearer(&jwt))
            .set_json(task_body("Design"))
    );
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "An internal error occurred");

    let id = ObjectId::parse_str(&project_id).unwrap();
    assert!(h.store.find_tasks_for_project(&id).await.unwrap().is_empty());
}

#[actix_web::test]
async fn test_task_from_another_project_is_invalid_action() {
    let h = harness();
    let app = init_app!(h);
    let (_, jwt) = confirmed_user(&h, "Ana", "ana@example.com").await;

    let mut project_ids = Vec::new();
    for name in ["One", "Two"] {
        let (_, body) = send!(
            app,
            test::TestRequest::post()
                .uri("/projects")
                .insert_header(bearer(&jwt))
                .set_json(project_body(name))
        );
        project_ids.push(body["project"]["id"].as_str().unwrap().to_string());
    }

    let (_, body) = send!(
        app,
        test::TestRequest::post()
            .uri(&format!("/projects/{}/tasks", project_ids[0]))
            .insert_header(bearer(&jwt))
            .set_json(task_body("Design"))
    );
    let task_id = body["task"]["id"].as_str().unwrap().to_string();

    let (status, body) = send!(
        app,
        test::TestRequest::get()
            .uri(&format!("/projects/{}/tasks/{}", project_ids[1], task_id))
            .insert_header(bearer(&jwt))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid action");
}

#[actix_web::test]
async fn test_notes_are_deleted_by_their_author_only() {
    let h = harness();
    let app = init_app!(h);
    let (_, manager) = confirmed_user(&h, "Manager", "manager@example.com").await;
    let (member_id, member) = confirmed_user(&h, "Member", "member@example.com").await;

    let (_, body) = send!(
        app,
        test::TestRequest::post()
            .uri("/projects")
            .insert_header(bearer(&manager))
            .set_json(project_body("Site"))
    );
    let project_id = body["project"]["id"].as_str().unwrap().to_string();
    send!(
        app,
        test::TestRequest::post()
            .uri(&format!("/projects/{}/team", project_id))
            .insert_header(bearer(&manager))
            .set_json(json!({ "id": member_id.to_hex() }))
    );
    let (_, body) = send!(
        app,
        test::TestRequest::post()
            .uri(&format!("/projects/{}/tasks", project_id))
            .insert_header(bearer(&manager))
            .set_json(task_body("Design"))
    );
    let task_id = body["task"]["id"].as_str().unwrap().to_string();
    let notes_uri = format!("/projects/{}/tasks/{}/notes", project_id, task_id);

    let (status, body) = send!(
        app,
        test::TestRequest::post()
            .uri(&notes_uri)
            .insert_header(bearer(&member))
            .set_json(json!({ "content": "Needs a logo" }))
    );
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["note"]["createdBy"]["email"], "member@example.com");
    let note_id = body["note"]["id"].as_str().unwrap().to_string();

    let (status, body) = send!(
        app,
        test::TestRequest::get()
            .uri(&format!("/projects/{}/tasks/{}", project_id, task_id))
            .insert_header(bearer(&manager))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["task"]["notes"][0]["content"], "Needs a logo");

    let note_uri = format!("{}/{}", notes_uri, note_id);
    let (status, _) = send!(app, test::TestRequest::delete().uri(&note_uri).insert_header(bearer(&manager)));
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send!(app, test::TestRequest::delete().uri(&note_uri).insert_header(bearer(&member)));
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send!(app, test::TestRequest::get().uri(&notes_uri).insert_header(bearer(&member)));
    assert!(body["notes"].as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn test_health_reports_store_and_sets_headers() {
    let h = harness();
    let app = init_app!(h);

    let res = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers().get("x-content-type-options").unwrap(), "nosniff");

    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["status"], "healthy");

    h.store.fail_on("ping");
    let (status, body) = send!(app, test::TestRequest::get().uri("/health"));
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");
}
