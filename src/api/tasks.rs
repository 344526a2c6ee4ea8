use actix_web::{delete, get, post, put, web, HttpResponse};

use crate::middleware::auth::Claims;
use crate::models::{StatusRequest, TaskRequest};
use crate::services::access::current_user;
use crate::services::task_service;
use crate::state::AppState;
use crate::utils::AppResult;

#[post("/{project_id}/tasks")]
pub async fn create_task(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
    request: web::Json<TaskRequest>,
) -> AppResult<HttpResponse> {
    let user = current_user(state.store.as_ref(), &claims).await?;
    let task = task_service::create_task(&state, &user.id, &path, &request).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "message": "Task created",
        "task": task
    })))
}

#[get("/{project_id}/tasks")]
pub async fn list_tasks(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let user = current_user(state.store.as_ref(), &claims).await?;
    let tasks = task_service::list_tasks(&state, &user.id, &path).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "tasks": tasks,
        "total": tasks.len()
    })))
}

/// GET /projects/{project_id}/tasks/{task_id} - histórico e notas com usuários
#[get("/{project_id}/tasks/{task_id}")]
pub async fn get_task(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    path: web::Path<(String, String)>,
) -> AppResult<HttpResponse> {
    let (project_id, task_id) = path.into_inner();
    let user = current_user(state.store.as_ref(), &claims).await?;
    let task = task_service::get_task(&state, &user.id, &project_id, &task_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "task": task
    })))
}

#[put("/{project_id}/tasks/{task_id}")]
pub async fn update_task(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    path: web::Path<(String, String)>,
    request: web::Json<TaskRequest>,
) -> AppResult<HttpResponse> {
    let (project_id, task_id) = path.into_inner();
    let user = current_user(state.store.as_ref(), &claims).await?;
    let task = task_service::update_task(&state, &user.id, &project_id, &task_id, &request).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Task updated",
        "task": task
    })))
}

#[delete("/{project_id}/tasks/{task_id}")]
pub async fn delete_task(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    path: web::Path<(String, String)>,
) -> AppResult<HttpResponse> {
    let (project_id, task_id) = path.into_inner();
    let user = current_user(state.store.as_ref(), &claims).await?;
    task_service::delete_task(&state, &user.id, &project_id, &task_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Task deleted"
    })))
}

#[post("/{project_id}/tasks/{task_id}/status")]
pub async fn update_status(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    path: web::Path<(String, String)>,
    request: web::Json<StatusRequest>,
) -> AppResult<HttpResponse> {
    let (project_id, task_id) = path.into_inner();
    let user = current_user(state.store.as_ref(), &claims).await?;
    let task = task_service::update_status(&state, &user.id, &project_id, &task_id, &request).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Task status updated",
        "task": task
    })))
}
