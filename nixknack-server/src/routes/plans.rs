//! Weekly plan endpoints

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use nixknack_core::normalize;
use serde::Serialize;
use tower_cookies::Cookies;

use super::session::get_session_user;
use crate::error::AppError;
use crate::planner::{self, DayPlan};
use crate::state::AppState;
use crate::store::Store;

#[derive(Serialize)]
pub struct GenerateResponse {
    pub msg: String,
    /// Number of distinct tasks the week was drawn from
    pub pool: usize,
}

/// POST /plans
pub async fn generate_plans<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    cookies: Cookies,
) -> Result<Json<GenerateResponse>, AppError> {
    let user = get_session_user(&cookies, &state.store)?;
    let today = normalize(Utc::now());

    let summary = {
        let mut rng = rand::thread_rng();
        planner::generate_plan(&state.store, user.id, today, &mut rng)?
    };

    Ok(Json(GenerateResponse {
        msg: "Generated plans!".to_string(),
        pool: summary.pool,
    }))
}

/// GET /plans
pub async fn get_plans<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    cookies: Cookies,
) -> Result<Json<Vec<DayPlan>>, AppError> {
    let user = get_session_user(&cookies, &state.store)?;
    let today = normalize(Utc::now());
    Ok(Json(planner::week_plans(&state.store, user.id, today)?))
}
