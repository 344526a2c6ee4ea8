use actix_web::{delete, get, post, web, HttpResponse};

use crate::middleware::auth::Claims;
use crate::models::NoteRequest;
use crate::services::access::current_user;
use crate::services::note_service;
use crate::state::AppState;
use crate::utils::AppResult;

#[post("/{project_id}/tasks/{task_id}/notes")]
pub async fn create_note(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    path: web::Path<(String, String)>,
    request: web::Json<NoteRequest>,
) -> AppResult<HttpResponse> {
    let (project_id, task_id) = path.into_inner();
    let user = current_user(state.store.as_ref(), &claims).await?;
    let note = note_service::create_note(&state, &user.id, &project_id, &task_id, &request).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "message": "Note created",
        "note": note
    })))
}

#[get("/{project_id}/tasks/{task_id}/notes")]
pub async fn list_notes(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    path: web::Path<(String, String)>,
) -> AppResult<HttpResponse> {
    let (project_id, task_id) = path.into_inner();
    let user = current_user(state.store.as_ref(), &claims).await?;
    let notes = note_service::list_notes(&state, &user.id, &project_id, &task_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "notes": notes
    })))
}

#[delete("/{project_id}/tasks/{task_id}/notes/{note_id}")]
pub async fn delete_note(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    path: web::Path<(String, String, String)>,
) -> AppResult<HttpResponse> {
    let (project_id, task_id, note_id) = path.into_inner();
    let user = current_user(state.store.as_ref(), &claims).await?;
    note_service::delete_note(&state, &user.id, &project_id, &task_id, &note_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Note deleted"
    })))
}
