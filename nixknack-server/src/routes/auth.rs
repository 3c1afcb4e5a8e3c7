//! Authentication endpoints

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;

use super::session::{
    clear_session_cookie, require_logged_out, require_session, set_session_cookie, SessionUser,
};
use super::MessageResponse;
use crate::crypto::verify_password;
use crate::error::AppError;
use crate::state::AppState;
use crate::store::Store;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub msg: String,
    pub user: SessionUser,
}

/// POST /login
pub async fn login<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    cookies: Cookies,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let Json(req) = body?;
    require_logged_out(&cookies, &state.store)?;

    let user = state
        .store
        .get_user_by_username(&req.username)?
        .ok_or(AppError::InvalidCredentials)?;

    let valid = verify_password(&req.password, &user.password_hash)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    if !valid {
        return Err(AppError::InvalidCredentials);
    }

    let session = state.store.create_session(user.id)?;
    set_session_cookie(&cookies, &session.id.0);

    tracing::debug!(user = user.id.0, "User logged in");

    Ok(Json(LoginResponse {
        msg: "Logged in!".to_string(),
        user: user.into(),
    }))
}

/// POST /logout
pub async fn logout<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    cookies: Cookies,
) -> Result<Json<MessageResponse>, AppError> {
    let session = require_session(&cookies, &state.store)?;
    state.store.delete_session(&session.id)?;
    clear_session_cookie(&cookies);

    Ok(Json(MessageResponse::new("Logged out!")))
}
