//! Seed endpoint

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::error::AppError;
use crate::seed::{load_seed_data, SeedSummary};
use crate::state::AppState;
use crate::store::Store;

#[derive(Serialize)]
pub struct InitResponse {
    pub msg: String,
    pub created: SeedSummary,
}

/// POST /init
pub async fn init<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<InitResponse>, AppError> {
    let created = load_seed_data(&state.store)?;
    Ok(Json(InitResponse {
        msg: "Loaded seed data!".to_string(),
        created,
    }))
}
