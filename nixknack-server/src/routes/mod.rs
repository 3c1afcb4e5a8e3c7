//! HTTP routes for the NixKnack API

mod auth;
mod init;
mod items;
mod plans;
mod rewards;
mod session;
mod tags;
mod tasks;
mod users;

use std::path::Path;
use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;
use nixknack_core::AchievementKind;
use serde::Serialize;
use tower_cookies::CookieManagerLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::state::AppState;
use crate::store::{Store, UserId};

pub use session::SESSION_COOKIE;

/// Body for mutations that only report what happened
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub msg: String,
}

impl MessageResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }
}

/// Create the router with all routes
pub fn create_router<S: Store + 'static>(state: Arc<AppState<S>>) -> Router {
    let prefix = format!("/{}", state.config.api_prefix.trim_matches('/'));
    let static_dir = Path::new(&state.config.static_dir);

    // The client is a single-page app; unknown paths get its index page
    let client = ServeDir::new(static_dir).fallback(ServeFile::new(static_dir.join("index.html")));

    let router = if prefix == "/" {
        Router::new().merge(api_routes())
    } else {
        Router::new().nest(&prefix, api_routes())
    };

    router
        .fallback_service(client)
        .layer(CookieManagerLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_routes<S: Store + 'static>() -> Router<Arc<AppState<S>>> {
    Router::new()
        .route("/session", get(session::get_session))
        .route(
            "/users",
            get(users::list_users)
                .post(users::create_user)
                .patch(users::update_user)
                .delete(users::delete_user),
        )
        .route("/users/:username", get(users::get_user))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/items", get(items::list_items).post(items::create_item))
        .route(
            "/items/:id",
            get(items::get_item)
                .patch(items::update_item)
                .delete(items::delete_item),
        )
        .route("/items/:id/points", delete(items::discard_item))
        .route("/items/:id/tags", get(tags::item_tags).post(tags::add_item_tags))
        .route("/items/:id/tags/:tag", delete(tags::remove_item_tag))
        .route("/tags", get(tags::list_tags))
        .route("/tags/:tag/count", get(tags::tag_count))
        .route("/recs/:tag", get(tags::get_recommendation))
        .route("/task/:id", delete(tasks::complete_task))
        .route("/plans", get(plans::get_plans).post(plans::generate_plans))
        .route("/points", get(rewards::get_points))
        .route("/achievements", get(rewards::get_achievements))
        .route("/init", post(init::init))
}

/// Credit points and achievement progress for one user action
pub(crate) fn grant<S: Store + ?Sized>(
    store: &S,
    user: UserId,
    points: u64,
    progress: &[(AchievementKind, u64)],
) -> Result<(), AppError> {
    let total = store.add_points(user, points)?;
    for (kind, delta) in progress {
        store.add_progress(user, kind.as_str(), *delta)?;
    }
    tracing::debug!(user = user.0, points, total, "Granted reward");
    Ok(())
}
