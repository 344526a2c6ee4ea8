use mongodb::bson::oid::ObjectId;
use validator::{Validate, ValidateEmail, ValidationErrors};

use super::error::{AppError, AppResult, FieldError};
use super::token::is_numeric_token;
use crate::models::normalize_email;

/// Converte os erros do `validator` numa lista ordenada por campo
pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut details: Vec<FieldError> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for {}", field));
                FieldError::new(field.to_string(), message)
            })
        })
        .collect();
    details.sort_by(|a, b| a.field.cmp(&b.field));
    details
}

pub fn validate_request<T: Validate>(request: &T) -> AppResult<()> {
    validate_with(request, Vec::new())
}

/// Runs the derived rules and appends checks the derive cannot express
/// (cross-field confirmation, numeric tokens).
pub fn validate_with<T: Validate>(request: &T, extra: Vec<FieldError>) -> AppResult<()> {
    let mut errors = match request.validate() {
        Ok(()) => Vec::new(),
        Err(e) => field_errors(&e),
    };
    errors.extend(extra);
    errors.sort_by(|a, b| a.field.cmp(&b.field));

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

pub fn password_confirmation(password: &str, confirmation: &str) -> Option<FieldError> {
    if password == confirmation {
        None
    } else {
        Some(FieldError::new(
            "password_confirmation",
            "Passwords do not match",
        ))
    }
}

/// Checks the address the way it is stored: trimmed and lowercased
pub fn valid_email(field: &str, value: &str) -> Option<FieldError> {
    if normalize_email(value).validate_email() {
        None
    } else {
        Some(FieldError::new(field, "Invalid email"))
    }
}

pub fn numeric_token(field: &str, value: &str) -> Option<FieldError> {
    if is_numeric_token(value) {
        None
    } else {
        Some(FieldError::new(field, "Invalid token"))
    }
}

/// Valida ids de path no formato ObjectId (24 hex)
pub fn parse_object_id(field: &str, value: &str) -> AppResult<ObjectId> {
    ObjectId::parse_str(value)
        .map_err(|_| AppError::validation(field, &format!("Invalid {}", field.replace('_', " "))))
}
