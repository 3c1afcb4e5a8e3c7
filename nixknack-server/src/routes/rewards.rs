//! Points and achievements

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tower_cookies::Cookies;

use super::session::get_session_user;
use crate::error::AppError;
use crate::state::AppState;
use crate::store::{AchievementData, Store};

#[derive(Serialize)]
pub struct PointsResponse {
    pub points: u64,
}

/// GET /points
pub async fn get_points<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    cookies: Cookies,
) -> Result<Json<PointsResponse>, AppError> {
    let user = get_session_user(&cookies, &state.store)?;
    let points = state.store.get_points(user.id)?;
    Ok(Json(PointsResponse { points }))
}

/// GET /achievements
pub async fn get_achievements<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    cookies: Cookies,
) -> Result<Json<AchievementData>, AppError> {
    let user = get_session_user(&cookies, &state.store)?;
    Ok(Json(state.store.achievement_data(user.id)?))
}
