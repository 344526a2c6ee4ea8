use actix_web::{delete, get, post, put, web, HttpResponse};

use crate::middleware::auth::Claims;
use crate::models::ProjectRequest;
use crate::services::access::current_user;
use crate::services::project_service;
use crate::state::AppState;
use crate::utils::AppResult;

/// GET /projects - projetos em que o usuário é gerente ou membro
#[get("")]
pub async fn list_projects(state: web::Data<AppState>, claims: web::ReqData<Claims>) -> AppResult<HttpResponse> {
    let user = current_user(state.store.as_ref(), &claims).await?;
    let projects = project_service::list_projects(&state, &user.id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "projects": projects,
        "total": projects.len()
    })))
}

/// POST /projects
#[post("")]
pub async fn create_project(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    request: web::Json<ProjectRequest>,
) -> AppResult<HttpResponse> {
    let user = current_user(state.store.as_ref(), &claims).await?;
    let project = project_service::create_project(&state, &user.id, &request).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "message": "Project created",
        "project": project
    })))
}

/// GET /projects/{project_id} - inclui as tarefas
#[get("/{project_id}")]
pub async fn get_project(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let user = current_user(state.store.as_ref(), &claims).await?;
    let project = project_service::get_project(&state, &user.id, &path).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "project": project
    })))
}

#[put("/{project_id}")]
pub async fn update_project(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
    request: web::Json<ProjectRequest>,
) -> AppResult<HttpResponse> {
    let user = current_user(state.store.as_ref(), &claims).await?;
    let project = project_service::update_project(&state, &user.id, &path, &request).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Project updated",
        "project": project
    })))
}

#[delete("/{project_id}")]
pub async fn delete_project(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let user = current_user(state.store.as_ref(), &claims).await?;
    project_service::delete_project(&state, &user.id, &path).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Project deleted"
    })))
}
