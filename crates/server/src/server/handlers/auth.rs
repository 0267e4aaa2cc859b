use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Form, Json};
use tracing::info;

use crate::auth::session::{end_session, start_session, CurrentUser, SessionJar};
use crate::auth::utils::{hash_password, verify_password};
use crate::error::{RequestError, ValidationError};
use crate::models::session::SessionResponse;
use crate::models::user::{
    normalize_email, validate_user_display_name, validate_user_email, validate_user_password,
    CreateUserRequest, LoginForm, SignupForm, UserResponse,
};
use crate::server::state::AppState;

pub async fn signup(
    State(state): State<Arc<AppState>>,
    jar: SessionJar,
    Form(form): Form<SignupForm>,
) -> Result<(SessionJar, Json<SessionResponse>), RequestError> {
    let email = normalize_email(&form.email);
    let display_name = form.name.trim().to_string();
    validate_user_email(&email)?;
    validate_user_password(&form.password)?;
    validate_user_display_name(&display_name)?;

    let password_hash = hash_password(&form.password)?;
    let user_id = state
        .db_connection
        .register_user(&CreateUserRequest {
            display_name: display_name.clone(),
            email,
            password_hash,
        })
        .await?;
    info!(user_id, "user signed up");

    let jar = start_session(jar, user_id, &state.config.session);
    Ok((
        jar,
        Json(SessionResponse {
            user_id,
            display_name,
        }),
    ))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: SessionJar,
    Form(form): Form<LoginForm>,
) -> Result<(SessionJar, Json<SessionResponse>), RequestError> {
    let email = normalize_email(&form.email);
    if validate_user_email(&email).is_err() {
        return Err(RequestError::BadCredentials);
    }
    if !state.login_throttle.try_attempt(&email) {
        return Err(RequestError::TooManyAttempts);
    }
    let credentials = state
        .db_connection
        .get_user_credentials(&email)
        .await?
        .ok_or(RequestError::BadCredentials)?;
    if !verify_password(&form.password, &credentials.password_hash) {
        return Err(RequestError::BadCredentials);
    }
    info!(user_id = credentials.id, "user signed in");

    let jar = start_session(jar, credentials.id, &state.config.session);
    Ok((
        jar,
        Json(SessionResponse {
            user_id: credentials.id,
            display_name: credentials.display_name,
        }),
    ))
}

pub async fn logout(jar: SessionJar) -> impl IntoResponse {
    (StatusCode::NO_CONTENT, end_session(jar))
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<UserResponse>, RequestError> {
    let user = state
        .db_connection
        .get_user(user.user_id)
        .await?
        .ok_or(ValidationError::NotFound)?;
    Ok(Json(user))
}
