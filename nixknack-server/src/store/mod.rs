//! Storage abstractions for NixKnack
//!
//! One trait per concept. Backends enforce existence and uniqueness inside a
//! single locked operation; the provided methods layer the guard checks and
//! lookups that every backend shares.

pub mod memory;
pub mod models;
pub mod sqlite;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use nixknack_core::recommendation::{DEFAULT_TEXT, FALLBACK_TAG};
use nixknack_core::AchievementType;

pub use memory::InMemoryStore;
pub use models::*;
pub use sqlite::SqliteStore;

use crate::error::AppError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, AppError>;

/// Trait for user account storage
pub trait UserStore: Send + Sync {
    /// Create a user; fails if the username is empty or taken
    fn create_user(&self, username: &str, password_hash: &str) -> StoreResult<UserId>;

    fn get_user(&self, user_id: UserId) -> StoreResult<Option<User>>;

    fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    fn list_users(&self) -> StoreResult<Vec<User>>;

    /// Change the username and/or password hash
    fn update_user(
        &self,
        user_id: UserId,
        username: Option<&str>,
        password_hash: Option<&str>,
    ) -> StoreResult<()>;

    fn delete_user(&self, user_id: UserId) -> StoreResult<()>;
}

/// Trait for session storage
pub trait SessionStore: Send + Sync {
    fn create_session(&self, user_id: UserId) -> StoreResult<Session>;

    fn get_session(&self, session_id: &SessionId) -> StoreResult<Option<Session>>;

    fn delete_session(&self, session_id: &SessionId) -> StoreResult<()>;

    /// Delete every session belonging to a user
    fn delete_sessions_for_user(&self, user_id: UserId) -> StoreResult<u64>;
}

/// Trait for item storage
pub trait ItemStore: Send + Sync {
    fn create_item(&self, owner: UserId, item: NewItem) -> StoreResult<ItemId>;

    fn get_item(&self, item_id: ItemId) -> StoreResult<Option<Item>>;

    /// Items owned by a user, most recently used first
    fn list_items(&self, owner: UserId) -> StoreResult<Vec<Item>>;

    fn update_item(&self, item_id: ItemId, update: ItemUpdate) -> StoreResult<()>;

    fn delete_item(&self, item_id: ItemId) -> StoreResult<()>;

    fn delete_items_by_owner(&self, owner: UserId) -> StoreResult<u64>;

    /// Fetch an item, failing if it does not exist
    fn item_exists(&self, item_id: ItemId) -> StoreResult<Item> {
        self.get_item(item_id)?
            .ok_or_else(|| AppError::NotFound(format!("Item {} not found!", item_id.0)))
    }

    /// Fetch an item, failing unless `user` owns it
    fn is_owner(&self, user: UserId, item_id: ItemId) -> StoreResult<Item> {
        let item = self.item_exists(item_id)?;
        if item.owner != user {
            return Err(AppError::NotAllowed(format!(
                "User {} is not the owner of item {}!",
                user.0, item_id.0
            )));
        }
        Ok(item)
    }

    /// How many of `item_ids` belong to `owner`
    fn count_owned(&self, owner: UserId, item_ids: &[ItemId]) -> StoreResult<usize> {
        let mut count = 0;
        for id in item_ids {
            if matches!(self.get_item(*id)?, Some(item) if item.owner == owner) {
                count += 1;
            }
        }
        Ok(count)
    }
}

/// Trait for tag storage
pub trait TagStore: Send + Sync {
    /// Create a tag; fails if the value is empty or already exists
    fn create_tag(&self, value: &str, threshold: u32) -> StoreResult<()>;

    fn get_tag(&self, value: &str) -> StoreResult<Option<Tag>>;

    fn list_tags(&self) -> StoreResult<Vec<Tag>>;

    /// Add an item to a tag; fails if the tag is missing or already holds it
    fn tag_item(&self, value: &str, item_id: ItemId) -> StoreResult<()>;

    /// Remove an item from a tag; fails if the tag is missing or lacks it
    fn untag_item(&self, value: &str, item_id: ItemId) -> StoreResult<()>;

    /// Pull the items from every tag, returning how many memberships went away
    fn untag_everywhere(&self, item_ids: &[ItemId]) -> StoreResult<u64>;

    /// Distinct tag values carrying any of the items, sorted
    fn tags_for_items(&self, item_ids: &[ItemId]) -> StoreResult<Vec<String>>;

    /// Create the tag with its catalog threshold unless it already exists
    fn ensure_tag(&self, value: &str) -> StoreResult<()> {
        if self.get_tag(value)?.is_some() {
            return Ok(());
        }
        match self.create_tag(value, nixknack_core::tag::default_threshold(value)) {
            // Created concurrently by another request
            Err(AppError::NotAllowed(_)) => Ok(()),
            other => other,
        }
    }

    fn tag_threshold(&self, value: &str) -> StoreResult<u32> {
        self.get_tag(value)?
            .map(|tag| tag.threshold)
            .ok_or_else(|| AppError::NotFound(format!("Tag {} does not exist!", value)))
    }

    /// Members of a tag; empty if the tag does not exist
    fn items_for_tag(&self, value: &str) -> StoreResult<Vec<ItemId>> {
        Ok(self.get_tag(value)?.map(|tag| tag.tagged_items).unwrap_or_default())
    }

    /// Attach an item to several tags, creating missing tags and skipping
    /// tags that already hold it
    fn tag_item_with_all(&self, values: &[String], item_id: ItemId) -> StoreResult<()> {
        for value in values {
            let value = value.trim();
            if value.is_empty() {
                return Err(AppError::BadValues("Tag must be non-empty!".to_string()));
            }
            self.ensure_tag(value)?;
            match self.tag_item(value, item_id) {
                Ok(()) | Err(AppError::NotAllowed(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// For each tag, its members that are also in `candidates`
    fn items_by_tag(
        &self,
        values: &[String],
        candidates: &[ItemId],
    ) -> StoreResult<BTreeMap<String, Vec<ItemId>>> {
        let mut memberships = Vec::with_capacity(values.len());
        for value in values {
            if let Some(tag) = self.get_tag(value)? {
                memberships.push((tag.value, tag.tagged_items));
            }
        }
        Ok(nixknack_core::tag::items_by_tag(memberships, candidates))
    }
}

/// Trait for recommendation storage
pub trait RecommendationStore: Send + Sync {
    /// Create a recommendation; fails on empty fields or a duplicate tag
    fn create_recommendation(&self, tag: &str, text: &str) -> StoreResult<Recommendation>;

    fn find_recommendation(&self, tag: &str) -> StoreResult<Option<Recommendation>>;

    fn delete_recommendation(&self, tag: &str) -> StoreResult<()>;

    /// Recommendation for a tag, falling back to the catalog's catch-all
    /// entry and then to the built-in default text
    fn get_recommendation(&self, tag: &str) -> StoreResult<Recommendation> {
        if let Some(rec) = self.find_recommendation(tag)? {
            return Ok(rec);
        }
        let text = self
            .find_recommendation(FALLBACK_TAG)?
            .map(|rec| rec.text)
            .unwrap_or_else(|| DEFAULT_TEXT.to_string());
        Ok(Recommendation {
            tag: tag.to_string(),
            text,
        })
    }
}

/// Trait for task storage
pub trait TaskStore: Send + Sync {
    /// Assign a task; fails if the (user, objective, item) triple exists
    fn assign_task(&self, user: UserId, objective: &str, item: ItemId) -> StoreResult<TaskId>;

    fn get_task(&self, task_id: TaskId) -> StoreResult<Option<Task>>;

    fn find_task(&self, user: UserId, objective: &str, item: ItemId)
        -> StoreResult<Option<Task>>;

    fn tasks_for_user(&self, user: UserId) -> StoreResult<Vec<Task>>;

    fn tasks_for_item(&self, item: ItemId) -> StoreResult<Vec<Task>>;

    fn delete_task(&self, task_id: TaskId) -> StoreResult<()>;

    fn delete_tasks_for_item(&self, item: ItemId) -> StoreResult<u64>;

    fn delete_tasks_for_user(&self, user: UserId) -> StoreResult<u64>;

    /// Delete a task and hand back the item it was about
    fn complete_task(&self, task_id: TaskId) -> StoreResult<ItemId> {
        let task = self
            .get_task(task_id)?
            .ok_or_else(|| AppError::NotAllowed(format!("Task {} does not exist!", task_id.0)))?;
        self.delete_task(task_id)?;
        Ok(task.item)
    }

    /// Fetch a task, failing unless it is assigned to `user`
    fn is_assigned(&self, user: UserId, task_id: TaskId) -> StoreResult<Task> {
        match self.get_task(task_id)? {
            Some(task) if task.assignee == user => Ok(task),
            _ => Err(AppError::NotAllowed(format!(
                "Task {} is not assigned to user {}!",
                task_id.0, user.0
            ))),
        }
    }

    /// Tasks for the given ids in the same order; missing ids are skipped
    fn get_tasks(&self, task_ids: &[TaskId]) -> StoreResult<Vec<Task>> {
        let mut tasks = Vec::with_capacity(task_ids.len());
        for id in task_ids {
            if let Some(task) = self.get_task(*id)? {
                tasks.push(task);
            }
        }
        Ok(tasks)
    }

    fn has_task_for_item(&self, user: UserId, item: ItemId) -> StoreResult<bool> {
        Ok(self
            .tasks_for_item(item)?
            .iter()
            .any(|task| task.assignee == user))
    }
}

/// Trait for plan storage
pub trait PlanStore: Send + Sync {
    /// Create a plan; fails if the user already has one for that day or the
    /// task list is over the daily cap
    fn create_plan(&self, user: UserId, deadline: NaiveDate, tasks: &[TaskId])
        -> StoreResult<PlanId>;

    fn get_plan(&self, user: UserId, deadline: NaiveDate) -> StoreResult<Option<Plan>>;

    /// All plans for a user, earliest first
    fn plans_for_user(&self, user: UserId) -> StoreResult<Vec<Plan>>;

    /// Replace a plan's task list
    fn set_plan_tasks(&self, plan_id: PlanId, tasks: &[TaskId]) -> StoreResult<()>;

    fn delete_plans_for_user(&self, user: UserId) -> StoreResult<u64>;

    /// Delete plans dated before `today`
    fn delete_expired_plans(&self, today: NaiveDate) -> StoreResult<u64>;
}

/// Trait for point balances
pub trait PointStore: Send + Sync {
    fn find_points(&self, user: UserId) -> StoreResult<Option<u64>>;

    /// Create a zero balance unless one exists
    fn init_points(&self, user: UserId) -> StoreResult<()>;

    /// Add to a balance, starting from zero if none exists; returns the total
    fn add_points(&self, user: UserId, quantity: u64) -> StoreResult<u64>;

    fn delete_points(&self, user: UserId) -> StoreResult<()>;

    fn get_points(&self, user: UserId) -> StoreResult<u64> {
        self.find_points(user)?
            .ok_or_else(|| AppError::NotFound(format!("Points for user {} not found!", user.0)))
    }
}

/// Trait for achievement definitions and per-user progress
pub trait AchievementStore: Send + Sync {
    /// Store a definition that has already been validated
    fn put_achievement_type(&self, def: &AchievementType) -> StoreResult<()>;

    /// Insert or replace an achievement definition, rejecting empty or
    /// non-ascending thresholds
    fn upsert_achievement_type(&self, def: &AchievementType) -> StoreResult<()> {
        let def = AchievementType::new(def.name.clone(), def.thresholds.clone())?;
        self.put_achievement_type(&def)
    }

    /// All definitions, sorted by name
    fn list_achievement_types(&self) -> StoreResult<Vec<AchievementType>>;

    /// Progress toward an achievement, zero if never recorded
    fn get_progress(&self, user: UserId, name: &str) -> StoreResult<u64>;

    /// Add to progress, creating the record if needed; returns the total
    fn add_progress(&self, user: UserId, name: &str, delta: u64) -> StoreResult<u64>;

    fn delete_user_progress(&self, user: UserId) -> StoreResult<u64>;

    /// Level, progress and bounding thresholds for every achievement
    fn achievement_data(&self, user: UserId) -> StoreResult<AchievementData> {
        let mut data = AchievementData::default();
        for def in self.list_achievement_types()? {
            let progress = self.get_progress(user, &def.name)?;
            data.levels.insert(def.name.clone(), def.level(progress));
            data.bounds.insert(def.name.clone(), def.bounds(progress));
            data.progress.insert(def.name, progress);
        }
        Ok(data)
    }
}

/// Everything the service needs from a backend
pub trait Store:
    UserStore
    + SessionStore
    + ItemStore
    + TagStore
    + RecommendationStore
    + TaskStore
    + PlanStore
    + PointStore
    + AchievementStore
{
}

impl<T> Store for T where
    T: UserStore
        + SessionStore
        + ItemStore
        + TagStore
        + RecommendationStore
        + TaskStore
        + PlanStore
        + PointStore
        + AchievementStore
{
}

pub(crate) fn validate_username(username: &str) -> StoreResult<()> {
    if username.trim().is_empty() {
        return Err(AppError::BadValues("Username must be non-empty!".to_string()));
    }
    Ok(())
}

pub(crate) fn validate_tag_value(value: &str) -> StoreResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::BadValues("Tag must be non-empty!".to_string()));
    }
    Ok(())
}

pub(crate) fn validate_recommendation(tag: &str, text: &str) -> StoreResult<()> {
    if tag.trim().is_empty() || text.trim().is_empty() {
        return Err(AppError::BadValues("Tag and text must be non-empty!".to_string()));
    }
    Ok(())
}
