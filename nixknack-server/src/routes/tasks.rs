//! Task completion endpoint

use std::sync::Arc;

use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::Json;
use nixknack_core::{reward, AchievementKind};
use tower_cookies::Cookies;

use super::items::remove_item;
use super::session::get_session_user;
use super::{grant, MessageResponse};
use crate::error::AppError;
use crate::state::AppState;
use crate::store::{Store, TaskId};

/// DELETE /task/:id
///
/// Completing a task means the item is gone: it leaves every tag, any
/// other tasks about it are dropped, and the item itself is deleted.
pub async fn complete_task<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    cookies: Cookies,
    path: Result<Path<u64>, PathRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Path(id) = path?;
    let user = get_session_user(&cookies, &state.store)?;
    let task = state.store.is_assigned(user.id, TaskId(id))?;
    let item = state.store.complete_task(task.id)?;

    match remove_item(&state.store, item) {
        // Already deleted through the item endpoints
        Ok(()) | Err(AppError::NotFound(_)) => {}
        Err(e) => return Err(e),
    }

    grant(
        &state.store,
        user.id,
        reward::TASK_COMPLETED,
        &[
            (AchievementKind::Experience, reward::TASK_COMPLETED),
            (AchievementKind::CompletedTasks, 1),
            (AchievementKind::ItemsDiscarded, 1),
        ],
    )?;

    tracing::debug!(user = user.id.0, task = id, item = item.0, "Completed task");

    Ok(Json(MessageResponse::new("Completed task!")))
}
