use bcrypt::{hash, verify};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::middleware::auth::generate_jwt;
use crate::models::{normalize_email, token_cutoff, Token, User};
use crate::services::email_service::{self, Recipient};
use crate::state::AppState;
use crate::utils::token::generate_token;
use crate::utils::validation::{
    numeric_token, password_confirmation, valid_email, validate_request, validate_with,
};
use crate::utils::{AppError, AppResult};

// Request/Response structures
#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct CreateAccountRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[serde(default)]
    pub password_confirmation: String,
}

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct TokenRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,
}

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct EmailRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct NewPasswordRequest {
    #[serde(default)]
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[serde(default)]
    pub password_confirmation: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
}

pub fn hash_password(state: &AppState, password: &str) -> AppResult<String> {
    Ok(hash(password, state.config.bcrypt_cost)?)
}

const TOKEN_ATTEMPTS: usize = 5;

/// Issues a fresh token for `user` and stores it
async fn issue_token(state: &AppState, user: &User) -> AppResult<Token> {
    issue_token_with(state, user, generate_token).await
}

/// Codes are looked up by value alone, so a code still live for another
/// account is redrawn instead of stored twice.
async fn issue_token_with<G>(state: &AppState, user: &User, mut generate: G) -> AppResult<Token>
where
    G: FnMut() -> String,
{
    for _ in 0..TOKEN_ATTEMPTS {
        let token = Token::with_value(user.id, generate());
        match state.store.insert_token(&token).await {
            Ok(()) => return Ok(token),
            Err(AppError::Conflict(_)) => log::debug!("🔁 Token code already in use, drawing another"),
            Err(e) => return Err(e),
        }
    }
    Err(AppError::Internal("Could not issue a unique token".into()))
}

async fn send_confirmation(state: &AppState, user: &User, token: &Token) {
    let to = Recipient {
        email: &user.email,
        name: &user.name,
    };
    email_service::deliver(
        state.mailer.as_ref(),
        email_service::confirmation_email(&state.config, &to, &token.token),
    )
    .await;
}

async fn find_by_email(state: &AppState, email: &str) -> AppResult<User> {
    state
        .store
        .find_user_by_email(&normalize_email(email))
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

pub async fn create_account(state: &AppState, request: &CreateAccountRequest) -> AppResult<MessageResponse> {
    let extra = valid_email("email", &request.email)
        .into_iter()
        .chain(password_confirmation(&request.password, &request.password_confirmation))
        .collect();
    validate_with(request, extra)?;

    let email = normalize_email(&request.email);
    if state.store.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("Email already in use".into()));
    }

    let user = User::new(&request.name, &email, hash_password(state, &request.password)?);
    state.store.insert_user(&user).await?;

    let token = match issue_token(state, &user).await {
        Ok(token) => token,
        Err(e) => {
            // Sem token a conta nunca poderia ser confirmada
            log::error!("❌ Token insert failed for {}, removing account: {}", user.email, e);
            if let Err(undo) = state.store.delete_user(&user.id).await {
                log::error!("❌ Could not remove account {}: {}", user.id, undo);
            }
            return Err(AppError::Internal(format!("Account creation failed: {}", e)));
        }
    };

    send_confirmation(state, &user, &token).await;
    log::info!("✅ Account created: {}", user.email);
    Ok(MessageResponse::new("Account created, check your email to confirm it"))
}

/// What a redeemed token does to its owner
enum Redemption {
    Confirm,
    SetPassword(String),
}

/// Redeems `value` once and applies `action` to its owner; the token is
/// put back if the owner's write fails.
async fn redeem_token(state: &AppState, value: &str, action: Redemption) -> AppResult<User> {
    let cutoff = token_cutoff(state.config.token_ttl_minutes);
    let token = state
        .store
        .take_token(value, cutoff)
        .await?
        .ok_or_else(|| AppError::NotFound("Invalid token".into()))?;

    let owner = token.user;
    let result = async move {
        let mut user = state
            .store
            .find_user(&owner)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;
        user.touch();
        match action {
            Redemption::Confirm => {
                user.confirmed = true;
                state.store.confirm_user(&user).await?;
            }
            Redemption::SetPassword(password_hash) => {
                user.password = password_hash;
                state.store.save_user_password(&user).await?;
            }
        }
        Ok::<User, AppError>(user)
    }
    .await;

    if let Err(e) = &result {
        log::error!("❌ Token redemption failed, restoring token: {}", e);
        if let Err(undo) = state.store.insert_token(&token).await {
            log::error!("❌ Could not restore token: {}", undo);
        }
    }
    result
}

pub async fn confirm_account(state: &AppState, request: &TokenRequest) -> AppResult<MessageResponse> {
    validate_request(request)?;

    let user = redeem_token(state, request.token.trim(), Redemption::Confirm).await?;

    log::info!("✅ Account confirmed: {}", user.email);
    Ok(MessageResponse::new("Account confirmed successfully"))
}

pub async fn login(state: &AppState, request: &LoginRequest) -> AppResult<LoginResponse> {
    validate_with(request, valid_email("email", &request.email).into_iter().collect())?;

    let user = find_by_email(state, &request.email).await?;

    if !user.confirmed {
        let token = issue_token(state, &user).await?;
        send_confirmation(state, &user, &token).await;
        return Err(AppError::Unauthorized(
            "Account not confirmed, we sent a new confirmation code to your email".into(),
        ));
    }

    if !verify(&request.password, &user.password)? {
        return Err(AppError::Unauthorized("Incorrect password".into()));
    }

    let token = generate_jwt(&user.id, &state.config)?;
    Ok(LoginResponse { success: true, token })
}

pub async fn request_confirmation_code(state: &AppState, request: &EmailRequest) -> AppResult<MessageResponse> {
    validate_with(request, valid_email("email", &request.email).into_iter().collect())?;

    let user = find_by_email(state, &request.email).await?;
    if user.confirmed {
        return Err(AppError::Forbidden("Account is already confirmed".into()));
    }

    let token = issue_token(state, &user).await?;
    send_confirmation(state, &user, &token).await;
    Ok(MessageResponse::new("A new code was sent to your email"))
}

pub async fn forgot_password(state: &AppState, request: &EmailRequest) -> AppResult<MessageResponse> {
    validate_with(request, valid_email("email", &request.email).into_iter().collect())?;

    let user = find_by_email(state, &request.email).await?;
    let token = issue_token(state, &user).await?;

    let to = Recipient {
        email: &user.email,
        name: &user.name,
    };
    email_service::deliver(
        state.mailer.as_ref(),
        email_service::password_reset_email(&state.config, &to, &token.token),
    )
    .await;

    Ok(MessageResponse::new("Check your email for instructions"))
}

pub async fn validate_token(state: &AppState, request: &TokenRequest) -> AppResult<MessageResponse> {
    let value = request.token.trim();
    validate_with(request, numeric_token("token", value).into_iter().collect())?;

    let cutoff = token_cutoff(state.config.token_ttl_minutes);
    state
        .store
        .find_token(value, cutoff)
        .await?
        .ok_or_else(|| AppError::NotFound("Invalid token".into()))?;

    Ok(MessageResponse::new("Valid token, set your new password"))
}

pub async fn update_password_with_token(
    state: &AppState,
    token: &str,
    request: &NewPasswordRequest,
) -> AppResult<MessageResponse> {
    let token = token.trim();
    let extra = numeric_token("token", token)
        .into_iter()
        .chain(password_confirmation(&request.password, &request.password_confirmation))
        .collect();
    validate_with(request, extra)?;

    let password_hash = hash_password(state, &request.password)?;
    let user = redeem_token(state, token, Redemption::SetPassword(password_hash)).await?;

    log::info!("🔑 Password reset for {}", user.email);
    Ok(MessageResponse::new("Password updated successfully"))
}
