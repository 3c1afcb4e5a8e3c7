//! Data models for NixKnack storage

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Unique user identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub u64);

/// Unique session identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

/// Unique item identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub u64);

/// Unique task identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(pub u64);

/// Unique plan identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlanId(pub u64);

/// A user account
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A logged-in browser session
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// A catalogued household item
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: ItemId,
    pub owner: UserId,
    pub name: String,
    pub last_used_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub purpose: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when cataloguing an item
#[derive(Debug, Clone, Default)]
pub struct NewItem {
    pub name: String,
    pub last_used_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub purpose: Option<String>,
    pub image: Option<String>,
}

impl NewItem {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        validate_item_name(&self.name)
    }
}

/// Partial item update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct ItemUpdate {
    pub name: Option<String>,
    pub last_used_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub purpose: Option<String>,
    pub image: Option<String>,
}

impl ItemUpdate {
    pub fn validate(&self) -> Result<(), AppError> {
        match &self.name {
            Some(name) => validate_item_name(name),
            None => Ok(()),
        }
    }

    pub fn apply(self, item: &mut Item) {
        if let Some(name) = self.name {
            item.name = name;
        }
        if let Some(date) = self.last_used_date {
            item.last_used_date = Some(date);
        }
        if let Some(location) = self.location {
            item.location = Some(location);
        }
        if let Some(purpose) = self.purpose {
            item.purpose = Some(purpose);
        }
        if let Some(image) = self.image {
            item.image = Some(image);
        }
    }
}

fn validate_item_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::BadValues("Item name must be non-empty!".to_string()));
    }
    Ok(())
}

/// A tag and the items carrying it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub value: String,
    pub threshold: u32,
    /// Each item appears at most once, in the order it was tagged
    pub tagged_items: Vec<ItemId>,
}

/// Disposal advice for items with a given tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub tag: String,
    pub text: String,
}

/// A disposal task assigned to a user for one item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    /// Recommendation text the task asks the user to follow
    pub objective: String,
    pub assignee: UserId,
    pub item: ItemId,
}

/// The tasks scheduled for one user on one day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub id: PlanId,
    pub user: UserId,
    pub deadline: NaiveDate,
    pub tasks: Vec<TaskId>,
}

/// Per-user achievement summary
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AchievementData {
    /// Highest threshold index reached, `null` below the first threshold
    pub levels: std::collections::BTreeMap<String, Option<usize>>,
    pub progress: std::collections::BTreeMap<String, u64>,
    /// `[lower, upper]` thresholds around the current level
    pub bounds: std::collections::BTreeMap<String, nixknack_core::Bounds>,
}
