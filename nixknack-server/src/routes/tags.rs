//! Tag and recommendation endpoints

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::Json;
use nixknack_core::tag::DEFINED_TAGS;
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;

use super::session::get_session_user;
use super::MessageResponse;
use crate::error::AppError;
use crate::state::AppState;
use crate::store::{ItemId, Recommendation, Store};

#[derive(Deserialize)]
pub struct AddTagsRequest {
    pub tags: Vec<String>,
}

#[derive(Serialize)]
pub struct TagCountResponse {
    pub tag: String,
    pub count: usize,
}

/// GET /items/:id/tags
pub async fn item_tags<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    cookies: Cookies,
    path: Result<Path<u64>, PathRejection>,
) -> Result<Json<Vec<String>>, AppError> {
    let Path(id) = path?;
    let user = get_session_user(&cookies, &state.store)?;
    let item = state.store.is_owner(user.id, ItemId(id))?;
    Ok(Json(state.store.tags_for_items(&[item.id])?))
}

/// POST /items/:id/tags
pub async fn add_item_tags<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    cookies: Cookies,
    path: Result<Path<u64>, PathRejection>,
    body: Result<Json<AddTagsRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Path(id) = path?;
    let Json(req) = body?;
    let user = get_session_user(&cookies, &state.store)?;
    let item = state.store.is_owner(user.id, ItemId(id))?;

    state.store.tag_item_with_all(&req.tags, item.id)?;

    Ok(Json(MessageResponse::new("Added item to tags!")))
}

/// DELETE /items/:id/tags/:tag
pub async fn remove_item_tag<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    cookies: Cookies,
    path: Result<Path<(u64, String)>, PathRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Path((id, tag)) = path?;
    let user = get_session_user(&cookies, &state.store)?;
    let item = state.store.is_owner(user.id, ItemId(id))?;

    state.store.untag_item(&tag, item.id)?;

    Ok(Json(MessageResponse::new(format!("Removed item from {}!", tag))))
}

/// GET /tags
///
/// Tags on the user's items together with the built-in catalog
pub async fn list_tags<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    cookies: Cookies,
) -> Result<Json<Vec<String>>, AppError> {
    let user = get_session_user(&cookies, &state.store)?;
    let owned: Vec<ItemId> = state
        .store
        .list_items(user.id)?
        .into_iter()
        .map(|item| item.id)
        .collect();

    let mut tags: BTreeSet<String> = state.store.tags_for_items(&owned)?.into_iter().collect();
    tags.extend(DEFINED_TAGS.iter().map(|(value, _)| value.to_string()));

    Ok(Json(tags.into_iter().collect()))
}

/// GET /tags/:tag/count
pub async fn tag_count<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    cookies: Cookies,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<TagCountResponse>, AppError> {
    let Path(tag) = path?;
    let user = get_session_user(&cookies, &state.store)?;
    let members = state.store.items_for_tag(&tag)?;
    let count = state.store.count_owned(user.id, &members)?;
    Ok(Json(TagCountResponse { tag, count }))
}

/// GET /recs/:tag
pub async fn get_recommendation<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Recommendation>, AppError> {
    let Path(tag) = path?;
    Ok(Json(state.store.get_recommendation(&tag)?))
}
