use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub type UserId = i32;
const USER_DISPLAY_NAME_LENGTH_LIMIT: usize = 60;
const USER_EMAIL_LENGTH_LIMIT: usize = 255;
const USER_PASSWORD_MIN_LENGTH: usize = 8;
const USER_PASSWORD_MAX_LENGTH: usize = 128;

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: UserId,
    pub display_name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct CreateUserRequest {
    pub display_name: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct GetUserCredentialsByEmailResponse {
    pub id: UserId,
    pub display_name: String,
    pub password_hash: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate_user_email(email: &str) -> Result<(), ValidationError> {
    let invalid = |reason: &str| ValidationError::invalid(email, reason);
    if email.is_empty() || email.len() > USER_EMAIL_LENGTH_LIMIT {
        return Err(invalid("email must be between 1 and 255 characters"));
    }
    if email.chars().any(char::is_whitespace) {
        return Err(invalid("email cannot contain whitespace"));
    }
    let Some((local, domain)) = email.split_once('@') else {
        return Err(invalid("email must contain `@`"));
    };
    if local.is_empty() || domain.contains('@') {
        return Err(invalid("email must contain exactly one `@` after a local part"));
    }
    let labels_ok = domain.split('.').count() > 1 && domain.split('.').all(|l| !l.is_empty());
    if !labels_ok {
        return Err(invalid("email domain is malformed"));
    }
    Ok(())
}

pub fn validate_user_display_name(display_name: &str) -> Result<(), ValidationError> {
    if display_name.trim().len() != display_name.len() {
        return Err(ValidationError::invalid(
            display_name,
            "user display name cannot be surrounded with whitespace characters",
        ));
    }
    if display_name.is_empty() {
        return Err(ValidationError::invalid(
            display_name,
            "user display name cannot be empty",
        ));
    }
    if display_name.chars().count() > USER_DISPLAY_NAME_LENGTH_LIMIT {
        return Err(ValidationError::invalid(
            display_name,
            format!(
                "user display name cannot be longer than {} chars",
                USER_DISPLAY_NAME_LENGTH_LIMIT
            ),
        ));
    }
    Ok(())
}

pub fn validate_user_password(password: &str) -> Result<(), ValidationError> {
    let length = password.chars().count();
    if !(USER_PASSWORD_MIN_LENGTH..=USER_PASSWORD_MAX_LENGTH).contains(&length) {
        return Err(ValidationError::invalid(
            "<password>",
            format!(
                "password should be at least {} and at most {} characters long",
                USER_PASSWORD_MIN_LENGTH, USER_PASSWORD_MAX_LENGTH
            ),
        ));
    }
    Ok(())
}
