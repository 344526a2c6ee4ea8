use mongodb::bson::oid::ObjectId;
use serde::Deserialize;
use validator::Validate;

use crate::models::{normalize_email, UserSummary};
use crate::services::access::{accessible_project, managed_project};
use crate::state::AppState;
use crate::utils::validation::{parse_object_id, valid_email, validate_with};
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize, Validate)]
pub struct FindMemberRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct MemberIdRequest {
    #[serde(default)]
    pub id: String,
}

pub async fn find_member_by_email(
    state: &AppState,
    user_id: &ObjectId,
    project_id: &str,
    request: &FindMemberRequest,
) -> AppResult<UserSummary> {
    managed_project(state.store.as_ref(), project_id, user_id).await?;
    validate_with(request, valid_email("email", &request.email).into_iter().collect())?;

    state
        .store
        .find_user_by_email(&normalize_email(&request.email))
        .await?
        .map(|user| UserSummary::from(&user))
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

pub async fn add_member(
    state: &AppState,
    user_id: &ObjectId,
    project_id: &str,
    request: &MemberIdRequest,
) -> AppResult<()> {
    let project = managed_project(state.store.as_ref(), project_id, user_id).await?;
    let member_id = parse_object_id("id", request.id.trim())?;

    let member = state
        .store
        .find_user(&member_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    if project.is_manager(&member.id) {
        return Err(AppError::Conflict("The manager already belongs to the project".into()));
    }
    if project.is_member(&member.id) {
        return Err(AppError::Conflict("User is already a team member".into()));
    }

    // $addToSet: se outra requisição ganhou a corrida, nada é duplicado
    if !state.store.add_team_member(&project.id, &member.id).await? {
        return Err(AppError::Conflict("User is already a team member".into()));
    }

    log::info!("👥 {} added to project {}", member.id, project.id);
    Ok(())
}

pub async fn remove_member(state: &AppState, user_id: &ObjectId, project_id: &str, member_id: &str) -> AppResult<()> {
    let project = managed_project(state.store.as_ref(), project_id, user_id).await?;
    let member_id = parse_object_id("user_id", member_id)?;

    if !project.is_member(&member_id) || !state.store.remove_team_member(&project.id, &member_id).await? {
        return Err(AppError::Conflict("User is not a team member".into()));
    }

    log::info!("👥 {} removed from project {}", member_id, project.id);
    Ok(())
}

pub async fn list_team(state: &AppState, user_id: &ObjectId, project_id: &str) -> AppResult<Vec<UserSummary>> {
    let project = accessible_project(state.store.as_ref(), project_id, user_id).await?;
    let users = state.store.find_users(&project.team).await?;
    Ok(users.iter().map(UserSummary::from).collect())
}
