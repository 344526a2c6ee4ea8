use mongodb::bson::oid::ObjectId;
use std::collections::HashMap;

use crate::models::{
    NoteResponse, StatusChangeDetail, StatusRequest, Task, TaskDetailResponse, TaskRequest, TaskResponse, UserSummary,
};
use crate::services::access::{accessible_project, managed_project, project_task};
use crate::state::AppState;
use crate::utils::validation::validate_request;
use crate::utils::{AppError, AppResult};

/// Loads the given users once and indexes their public projection by id
pub async fn user_summaries(state: &AppState, ids: &[ObjectId]) -> AppResult<HashMap<ObjectId, UserSummary>> {
    let mut unique = ids.to_vec();
    unique.sort();
    unique.dedup();

    let users = state.store.find_users(&unique).await?;
    Ok(users.iter().map(|u| (u.id, UserSummary::from(u))).collect())
}

pub async fn create_task(
    state: &AppState,
    user_id: &ObjectId,
    project_id: &str,
    request: &TaskRequest,
) -> AppResult<TaskResponse> {
    let project = managed_project(state.store.as_ref(), project_id, user_id).await?;
    validate_request(request)?;

    let task = Task::new(request, project.id);
    state.store.insert_task(&task).await?;

    if let Err(e) = state.store.push_project_task(&project.id, &task.id).await {
        log::error!("❌ Could not attach task {} to project {}: {}", task.id, project.id, e);
        if let Err(undo) = state.store.delete_task(&task.id).await {
            log::error!("❌ Orphan task {} left behind: {}", task.id, undo);
        }
        return Err(e);
    }

    log::info!("📝 Task created: {} in project {}", task.id, project.id);
    Ok(TaskResponse::from(task))
}

pub async fn list_tasks(state: &AppState, user_id: &ObjectId, project_id: &str) -> AppResult<Vec<TaskResponse>> {
    let project = accessible_project(state.store.as_ref(), project_id, user_id).await?;
    let tasks = state.store.find_tasks_for_project(&project.id).await?;
    Ok(tasks.into_iter().map(TaskResponse::from).collect())
}

/// Task with its status history users and notes (with authors) resolved
pub async fn get_task(
    state: &AppState,
    user_id: &ObjectId,
    project_id: &str,
    task_id: &str,
) -> AppResult<TaskDetailResponse> {
    let project = accessible_project(state.store.as_ref(), project_id, user_id).await?;
    let task = project_task(state.store.as_ref(), &project, task_id).await?;
    let notes = state.store.find_notes_for_task(&task.id).await?;

    let mut ids: Vec<ObjectId> = task.completed_by.iter().map(|c| c.user).collect();
    ids.extend(notes.iter().map(|n| n.created_by));
    let users = user_summaries(state, &ids).await?;

    let completed_by = task
        .completed_by
        .iter()
        .map(|change| StatusChangeDetail {
            user: users.get(&change.user).cloned(),
            status: change.status,
            changed_at: change.changed_at,
        })
        .collect();
    let notes = notes
        .into_iter()
        .map(|note| {
            let author = users.get(&note.created_by).cloned();
            NoteResponse::new(note, author)
        })
        .collect();

    Ok(TaskDetailResponse {
        id: task.id.to_hex(),
        name: task.name,
        description: task.description,
        status: task.status,
        project: task.project.to_hex(),
        completed_by,
        notes,
        created_at: task.created_at,
        updated_at: task.updated_at,
    })
}

pub async fn update_task(
    state: &AppState,
    user_id: &ObjectId,
    project_id: &str,
    task_id: &str,
    request: &TaskRequest,
) -> AppResult<TaskResponse> {
    let project = managed_project(state.store.as_ref(), project_id, user_id).await?;
    let mut task = project_task(state.store.as_ref(), &project, task_id).await?;
    validate_request(request)?;

    task.name = request.name.trim().to_string();
    task.description = request.description.trim().to_string();
    task.updated_at = chrono::Utc::now().timestamp();
    state.store.save_task_details(&task).await?;

    Ok(TaskResponse::from(task))
}

/// Detaches the task from its project, then deletes its notes and the task.
/// The project link is restored if the deletes fail.
pub async fn delete_task(state: &AppState, user_id: &ObjectId, project_id: &str, task_id: &str) -> AppResult<()> {
    let project = managed_project(state.store.as_ref(), project_id, user_id).await?;
    let task = project_task(state.store.as_ref(), &project, task_id).await?;

    state.store.pull_project_task(&project.id, &task.id).await?;

    if let Err(e) = state.store.delete_task(&task.id).await {
        log::error!("❌ Task {} delete failed, re-attaching to project: {}", task.id, e);
        if let Err(undo) = state.store.push_project_task(&project.id, &task.id).await {
            log::error!("❌ Could not re-attach task {}: {}", task.id, undo);
        }
        return Err(e);
    }

    // Notas sem tarefa ficam inacessíveis, então a falha aqui não volta ao cliente
    if let Err(e) = state.store.delete_notes_for_tasks(&[task.id]).await {
        log::error!("❌ Could not remove notes of deleted task {}: {}", task.id, e);
    }

    log::info!("🗑️  Task deleted: {}", task.id);
    Ok(())
}

/// Any member may move a task; each change is appended to its history
pub async fn update_status(
    state: &AppState,
    user_id: &ObjectId,
    project_id: &str,
    task_id: &str,
    request: &StatusRequest,
) -> AppResult<TaskResponse> {
    let project = accessible_project(state.store.as_ref(), project_id, user_id).await?;
    let mut task = project_task(state.store.as_ref(), &project, task_id).await?;

    task.record_status(*user_id, request.status);
    let change = task
        .completed_by
        .last()
        .ok_or_else(|| AppError::Internal("Status change was not recorded".into()))?;
    state.store.push_task_status(&task.id, change).await?;

    log::info!("🔄 Task {} moved to {} by {}", task.id, request.status, user_id);
    Ok(TaskResponse::from(task))
}
