use bcrypt::verify;
use serde::Deserialize;
use validator::Validate;

use crate::models::{normalize_email, User, UserSummary};
use crate::services::auth_service::{hash_password, MessageResponse};
use crate::state::AppState;
use crate::utils::validation::{password_confirmation, valid_email, validate_request, validate_with};
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct ProfileRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct UpdatePasswordRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    #[serde(default)]
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[serde(default)]
    pub password_confirmation: String,
}

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct CheckPasswordRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

pub fn current_profile(user: &User) -> UserSummary {
    UserSummary::from(user)
}

pub async fn update_profile(state: &AppState, mut user: User, request: &ProfileRequest) -> AppResult<MessageResponse> {
    validate_with(request, valid_email("email", &request.email).into_iter().collect())?;

    let email = normalize_email(&request.email);
    if let Some(owner) = state.store.find_user_by_email(&email).await? {
        if owner.id != user.id {
            return Err(AppError::Conflict("Email already in use".into()));
        }
    }

    user.name = request.name.trim().to_string();
    user.email = email;
    user.touch();
    state.store.save_user_profile(&user).await?;

    log::info!("👤 Profile updated: {}", user.id);
    Ok(MessageResponse::new("Profile updated successfully"))
}

pub async fn update_password(
    state: &AppState,
    mut user: User,
    request: &UpdatePasswordRequest,
) -> AppResult<MessageResponse> {
    validate_with(
        request,
        password_confirmation(&request.password, &request.password_confirmation)
            .into_iter()
            .collect(),
    )?;

    if !verify(&request.current_password, &user.password)? {
        return Err(AppError::Unauthorized("Current password is incorrect".into()));
    }

    user.password = hash_password(state, &request.password)?;
    user.touch();
    state.store.save_user_password(&user).await?;

    log::info!("🔑 Password changed: {}", user.id);
    Ok(MessageResponse::new("Password updated successfully"))
}

pub fn check_password(user: &User, request: &CheckPasswordRequest) -> AppResult<MessageResponse> {
    validate_request(request)?;

    if !verify(&request.password, &user.password)? {
        return Err(AppError::Unauthorized("Incorrect password".into()));
    }
    Ok(MessageResponse::new("Correct password"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::database::{MemoryStore, Store};
    use crate::services::email_service::LogMailer;
    use std::sync::Arc;

    async fn setup() -> (AppState, Arc<MemoryStore>, User) {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(store.clone(), Arc::new(LogMailer), Config::for_tests());
        let hash = hash_password(&state, "password123").unwrap();
        let user = User::new("Ana", "ana@example.com", hash);
        store.insert_user(&user).await.unwrap();
        (state, store, user)
    }

    #[tokio::test]
    async fn test_update_profile_email_conflict() {
        let (state, store, user) = setup().await;
        let other = User::new("Bob", "bob@example.com", "x".into());
        store.insert_user(&other).await.unwrap();

        let taken = ProfileRequest {
            name: "Ana".into(),
            email: "BOB@example.com".into(),
        };
        assert!(matches!(
            update_profile(&state, user.clone(), &taken).await,
            Err(AppError::Conflict(_))
        ));

        // keeping your own email is fine
        let same = ProfileRequest {
            name: "Ana Maria".into(),
            email: "ana@example.com".into(),
        };
        update_profile(&state, user.clone(), &same).await.unwrap();
        let saved = store.find_user(&user.id).await.unwrap().unwrap();
        assert_eq!(saved.name, "Ana Maria");
    }

    #[tokio::test]
    async fn test_update_password_requires_current() {
        let (state, store, user) = setup().await;
        let wrong = UpdatePasswordRequest {
            current_password: "nope".into(),
            password: "another-pass".into(),
            password_confirmation: "another-pass".into(),
        };
        assert!(matches!(
            update_password(&state, user.clone(), &wrong).await,
            Err(AppError::Unauthorized(_))
        ));

        let right = UpdatePasswordRequest {
            current_password: "password123".into(),
            ..wrong
        };
        update_password(&state, user.clone(), &right).await.unwrap();

        let saved = store.find_user(&user.id).await.unwrap().unwrap();
        let check = CheckPasswordRequest {
            password: "another-pass".into(),
        };
        assert!(check_password(&saved, &check).is_ok());
    }

    #[tokio::test]
    async fn test_profile_update_keeps_concurrent_password_change() {
        let (state, store, user) = setup().await;
        // both requests authenticated with the same snapshot
        let snapshot = user.clone();
        let id = user.id;

        let change = UpdatePasswordRequest {
            current_password: "password123".into(),
            password: "another-pass".into(),
            password_confirmation: "another-pass".into(),
        };
        update_password(&state, user, &change).await.unwrap();

        let profile = ProfileRequest {
            name: "Ana Maria".into(),
            email: " Ana.Maria@Example.com ".into(),
        };
        update_profile(&state, snapshot, &profile).await.unwrap();

        let saved = store.find_user(&id).await.unwrap().unwrap();
        assert_eq!(saved.name, "Ana Maria");
        assert_eq!(saved.email, "ana.maria@example.com");
        let check = CheckPasswordRequest {
            password: "another-pass".into(),
        };
        assert!(check_password(&saved, &check).is_ok());
    }

    #[tokio::test]
    async fn test_check_password() {
        let (_, _, user) = setup().await;
        let bad = CheckPasswordRequest {
            password: "wrong".into(),
        };
        assert!(matches!(check_password(&user, &bad), Err(AppError::Unauthorized(_))));
        assert_eq!(current_profile(&user).email, "ana@example.com");
    }
}
