//! Account endpoints

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use tower_cookies::Cookies;

use super::session::{clear_session_cookie, get_session_user, require_logged_out, SessionUser};
use super::MessageResponse;
use crate::crypto::hash_password;
use crate::error::AppError;
use crate::state::AppState;
use crate::store::{ItemId, Store};

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

fn hash(password: &str, cost: u32) -> Result<String, AppError> {
    if password.is_empty() {
        return Err(AppError::BadValues("Password must be non-empty!".to_string()));
    }
    hash_password(password, cost).map_err(|e| AppError::Internal(e.to_string()))
}

/// GET /users
pub async fn list_users<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<SessionUser>>, AppError> {
    let users = state.store.list_users()?;
    Ok(Json(users.into_iter().map(SessionUser::from).collect()))
}

/// GET /users/:username
pub async fn get_user<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<SessionUser>, AppError> {
    let Path(username) = path?;
    let user = state
        .store
        .get_user_by_username(&username)?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found!", username)))?;
    Ok(Json(user.into()))
}

/// POST /users
pub async fn create_user<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    cookies: Cookies,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Json(req) = body?;
    require_logged_out(&cookies, &state.store)?;

    let password_hash = hash(&req.password, state.config.bcrypt_cost)?;
    let user_id = state.store.create_user(req.username.trim(), &password_hash)?;
    state.store.init_points(user_id)?;

    tracing::info!(user = user_id.0, "Created user");

    Ok(Json(MessageResponse::new("Created user!")))
}

/// PATCH /users
pub async fn update_user<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    cookies: Cookies,
    body: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Json(req) = body?;
    let user = get_session_user(&cookies, &state.store)?;

    let password_hash = match &req.password {
        Some(password) => Some(hash(password, state.config.bcrypt_cost)?),
        None => None,
    };
    let username = req.username.as_deref().map(str::trim);

    state
        .store
        .update_user(user.id, username, password_hash.as_deref())?;

    Ok(Json(MessageResponse::new("Updated user!")))
}

/// DELETE /users
///
/// Removes everything the user owns before the account itself. Each step
/// commits on its own; a failure part way leaves the earlier steps applied.
pub async fn delete_user<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    cookies: Cookies,
) -> Result<Json<MessageResponse>, AppError> {
    let user = get_session_user(&cookies, &state.store)?;
    let store = &state.store;

    let items: Vec<ItemId> = store.list_items(user.id)?.into_iter().map(|i| i.id).collect();

    let tasks = store.delete_tasks_for_user(user.id)?;
    let memberships = store.untag_everywhere(&items)?;
    let items_removed = store.delete_items_by_owner(user.id)?;
    store.delete_points(user.id)?;
    let plans = store.delete_plans_for_user(user.id)?;
    store.delete_user_progress(user.id)?;
    store.delete_sessions_for_user(user.id)?;
    store.delete_user(user.id)?;

    clear_session_cookie(&cookies);

    tracing::info!(
        user = user.id.0,
        tasks,
        memberships,
        items = items_removed,
        plans,
        "Deleted user"
    );

    Ok(Json(MessageResponse::new("Deleted user!")))
}
