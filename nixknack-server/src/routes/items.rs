//! Item endpoints

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use nixknack_core::{normalize, reward, AchievementKind};
use serde::{Deserialize, Deserializer, Serialize};
use tower_cookies::Cookies;

use super::session::get_session_user;
use super::{grant, MessageResponse};
use crate::error::AppError;
use crate::state::AppState;
use crate::store::{Item, ItemId, ItemUpdate, NewItem, Store};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemRequest {
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_day")]
    pub last_used_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub purpose: Option<String>,
    pub image: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_day")]
    pub last_used_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub purpose: Option<String>,
    pub image: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemResponse {
    pub id: u64,
    pub owner: u64,
    pub name: String,
    pub last_used_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub purpose: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl From<Item> for ItemResponse {
    fn from(item: Item) -> Self {
        Self {
            id: item.id.0,
            owner: item.owner.0,
            name: item.name,
            last_used_date: item.last_used_date,
            location: item.location,
            purpose: item.purpose,
            image: item.image,
            created_at: item.created_at,
            tags: None,
        }
    }
}

#[derive(Serialize)]
pub struct CreatedResponse {
    pub msg: String,
    pub id: u64,
}

/// Accepts a plain day (`2024-05-10`) or a full RFC 3339 timestamp,
/// which is reduced to its UTC day
fn deserialize_day<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_day(s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {}", s))),
    }
}

fn parse_day(s: &str) -> Option<NaiveDate> {
    s.parse::<NaiveDate>().ok().or_else(|| {
        DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| normalize(dt.with_timezone(&Utc)))
    })
}

/// Drop an item from every tag, then its tasks, then the item
pub(super) fn remove_item<S: Store + ?Sized>(store: &S, item: ItemId) -> Result<(), AppError> {
    store.untag_everywhere(&[item])?;
    store.delete_tasks_for_item(item)?;
    store.delete_item(item)
}

/// GET /items
pub async fn list_items<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    cookies: Cookies,
) -> Result<Json<Vec<ItemResponse>>, AppError> {
    let user = get_session_user(&cookies, &state.store)?;
    let items = state.store.list_items(user.id)?;
    Ok(Json(items.into_iter().map(ItemResponse::from).collect()))
}

/// POST /items
pub async fn create_item<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    cookies: Cookies,
    body: Result<Json<CreateItemRequest>, JsonRejection>,
) -> Result<Json<CreatedResponse>, AppError> {
    let Json(req) = body?;
    let user = get_session_user(&cookies, &state.store)?;

    if req.tags.iter().any(|tag| tag.trim().is_empty()) {
        return Err(AppError::BadValues("Tag must be non-empty!".to_string()));
    }

    let item = NewItem {
        name: req.name.trim().to_string(),
        last_used_date: req.last_used_date,
        location: req.location,
        purpose: req.purpose,
        image: req.image,
    };
    let id = state.store.create_item(user.id, item)?;

    if !req.tags.is_empty() {
        state.store.tag_item_with_all(&req.tags, id)?;
    }

    grant(
        &state.store,
        user.id,
        reward::ITEM_ADDED,
        &[
            (AchievementKind::Experience, reward::ITEM_ADDED),
            (AchievementKind::ItemsAdded, 1),
        ],
    )?;

    Ok(Json(CreatedResponse {
        msg: "Created item!".to_string(),
        id: id.0,
    }))
}

/// GET /items/:id
pub async fn get_item<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    cookies: Cookies,
    path: Result<Path<u64>, PathRejection>,
) -> Result<Json<ItemResponse>, AppError> {
    let Path(id) = path?;
    let user = get_session_user(&cookies, &state.store)?;
    let item = state.store.is_owner(user.id, ItemId(id))?;
    let tags = state.store.tags_for_items(&[item.id])?;

    let mut response = ItemResponse::from(item);
    response.tags = Some(tags);
    Ok(Json(response))
}

/// PATCH /items/:id
pub async fn update_item<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    cookies: Cookies,
    path: Result<Path<u64>, PathRejection>,
    body: Result<Json<UpdateItemRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Path(id) = path?;
    let Json(req) = body?;
    let user = get_session_user(&cookies, &state.store)?;
    let item = state.store.is_owner(user.id, ItemId(id))?;

    let update = ItemUpdate {
        name: req.name.map(|name| name.trim().to_string()),
        last_used_date: req.last_used_date,
        location: req.location,
        purpose: req.purpose,
        image: req.image,
    };
    state.store.update_item(item.id, update)?;

    Ok(Json(MessageResponse::new("Updated item!")))
}

/// DELETE /items/:id
pub async fn delete_item<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    cookies: Cookies,
    path: Result<Path<u64>, PathRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Path(id) = path?;
    let user = get_session_user(&cookies, &state.store)?;
    let item = state.store.is_owner(user.id, ItemId(id))?;

    remove_item(&state.store, item.id)?;

    Ok(Json(MessageResponse::new("Deleted item!")))
}

/// DELETE /items/:id/points
///
/// Discard an item for credit. An outstanding task for the item counts as
/// completed and earns its own reward on top.
pub async fn discard_item<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    cookies: Cookies,
    path: Result<Path<u64>, PathRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Path(id) = path?;
    let user = get_session_user(&cookies, &state.store)?;
    let item = state.store.is_owner(user.id, ItemId(id))?;
    let had_task = state.store.has_task_for_item(user.id, item.id)?;

    grant(
        &state.store,
        user.id,
        reward::ITEM_DISCARDED,
        &[
            (AchievementKind::Experience, reward::ITEM_DISCARDED),
            (AchievementKind::ItemsDiscarded, 1),
        ],
    )?;

    if had_task {
        grant(
            &state.store,
            user.id,
            reward::TASK_COMPLETED,
            &[
                (AchievementKind::Experience, reward::TASK_COMPLETED),
                (AchievementKind::CompletedTasks, 1),
            ],
        )?;
    }

    remove_item(&state.store, item.id)?;

    Ok(Json(MessageResponse::new("Discarded item!")))
}
