use mongodb::bson::oid::ObjectId;

use crate::models::{Project, ProjectDetailResponse, ProjectRequest, ProjectResponse, TaskResponse};
use crate::services::access::{accessible_project, managed_project};
use crate::state::AppState;
use crate::utils::validation::validate_request;
use crate::utils::AppResult;

/// Projects the user manages or belongs to
pub async fn list_projects(state: &AppState, user_id: &ObjectId) -> AppResult<Vec<ProjectResponse>> {
    let projects = state.store.find_projects_for_user(user_id).await?;
    Ok(projects.into_iter().map(ProjectResponse::from).collect())
}

pub async fn create_project(state: &AppState, user_id: &ObjectId, request: &ProjectRequest) -> AppResult<ProjectResponse> {
    validate_request(request)?;

    let project = Project::new(request, *user_id);
    state.store.insert_project(&project).await?;

    log::info!("📁 Project created: {} by {}", project.id, user_id);
    Ok(ProjectResponse::from(project))
}

pub async fn get_project(state: &AppState, user_id: &ObjectId, project_id: &str) -> AppResult<ProjectDetailResponse> {
    let project = accessible_project(state.store.as_ref(), project_id, user_id).await?;
    let tasks = state.store.find_tasks_for_project(&project.id).await?;

    Ok(ProjectDetailResponse::new(
        project,
        tasks.into_iter().map(TaskResponse::from).collect(),
    ))
}

pub async fn update_project(
    state: &AppState,
    user_id: &ObjectId,
    project_id: &str,
    request: &ProjectRequest,
) -> AppResult<ProjectResponse> {
    let mut project = managed_project(state.store.as_ref(), project_id, user_id).await?;
    validate_request(request)?;

    project.project_name = request.project_name.trim().to_string();
    project.client_name = request.client_name.trim().to_string();
    project.description = request.description.trim().to_string();
    project.updated_at = chrono::Utc::now().timestamp();
    state.store.save_project_details(&project).await?;

    Ok(ProjectResponse::from(project))
}

/// Deletes the project first, then its tasks and their notes.
///
/// Once the project is gone its tasks and notes are unreachable, so a
/// failed cleanup is logged and the delete still succeeds.
pub async fn delete_project(state: &AppState, user_id: &ObjectId, project_id: &str) -> AppResult<()> {
    let project = managed_project(state.store.as_ref(), project_id, user_id).await?;

    let tasks = state.store.find_tasks_for_project(&project.id).await?;
    let task_ids: Vec<ObjectId> = tasks.iter().map(|t| t.id).collect();

    state.store.delete_project(&project.id).await?;

    if let Err(e) = state.store.delete_notes_for_tasks(&task_ids).await {
        log::error!("❌ Could not remove notes of deleted project {}: {}", project.id, e);
    }
    if let Err(e) = state.store.delete_tasks_for_project(&project.id).await {
        log::error!("❌ Could not remove tasks of deleted project {}: {}", project.id, e);
    }

    log::info!("🗑️  Project deleted: {} ({} tasks)", project.id, task_ids.len());
    Ok(())
}
