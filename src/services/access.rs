//! Resolves path ids to documents once per request and applies the
//! manager / team-member rules before a handler touches anything.

use mongodb::bson::oid::ObjectId;

use crate::database::Store;
use crate::middleware::auth::Claims;
use crate::models::{Project, Task, User};
use crate::utils::validation::parse_object_id;
use crate::utils::{AppError, AppResult};

/// Caller identity from the session credential; 401 if the account is gone
pub async fn current_user(store: &dyn Store, claims: &Claims) -> AppResult<User> {
    let user_id = claims.user_id()?;
    store
        .find_user(&user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid token".into()))
}

pub async fn find_project(store: &dyn Store, raw_id: &str) -> AppResult<Project> {
    let id = parse_object_id("project_id", raw_id)?;
    store
        .find_project(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".into()))
}

/// Manager or team member
pub fn require_access(project: &Project, user_id: &ObjectId) -> AppResult<()> {
    if project.can_access(user_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden("Access denied".into()))
    }
}

/// Manager only, regardless of team membership
pub fn require_manager(project: &Project, user_id: &ObjectId) -> AppResult<()> {
    if project.is_manager(user_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden("Only the project manager can do this".into()))
    }
}

/// Loads the project and checks the caller may see it
pub async fn accessible_project(store: &dyn Store, raw_id: &str, user_id: &ObjectId) -> AppResult<Project> {
    let project = find_project(store, raw_id).await?;
    require_access(&project, user_id)?;
    Ok(project)
}

/// Loads the project and checks the caller manages it
pub async fn managed_project(store: &dyn Store, raw_id: &str, user_id: &ObjectId) -> AppResult<Project> {
    let project = find_project(store, raw_id).await?;
    require_manager(&project, user_id)?;
    Ok(project)
}

/// Loads a task and verifies it belongs to `project`
pub async fn project_task(store: &dyn Store, project: &Project, raw_task_id: &str) -> AppResult<Task> {
    let id = parse_object_id("task_id", raw_task_id)?;
    let task = store
        .find_task(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;

    if task.project != project.id {
        return Err(AppError::BadRequest("Invalid action".into()));
    }
    Ok(task)
}
