//! In-memory storage implementation

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{NaiveDate, Utc};
use nixknack_core::schedule::check_capacity;
use nixknack_core::AchievementType;

use super::{
    validate_recommendation, validate_tag_value, validate_username, AchievementStore, Item,
    ItemId, ItemStore, ItemUpdate, NewItem, Plan, PlanId, PlanStore, PointStore, Recommendation,
    RecommendationStore, Session, SessionId, SessionStore, StoreResult, Tag, TagStore, Task,
    TaskId, TaskStore, User, UserId, UserStore,
};
use crate::crypto::generate_session_id;
use crate::error::AppError;

/// In-memory store holding every collection behind its own lock
pub struct InMemoryStore {
    users: RwLock<HashMap<UserId, User>>,
    sessions: RwLock<HashMap<SessionId, Session>>,
    items: RwLock<HashMap<ItemId, Item>>,
    tags: RwLock<BTreeMap<String, Tag>>,
    recommendations: RwLock<HashMap<String, Recommendation>>,
    tasks: RwLock<BTreeMap<TaskId, Task>>,
    plans: RwLock<HashMap<PlanId, Plan>>,
    points: RwLock<HashMap<UserId, u64>>,
    achievement_types: RwLock<BTreeMap<String, AchievementType>>,
    progress: RwLock<HashMap<(UserId, String), u64>>,
    next_id: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            sessions: RwLock::new(HashMap::new()),
            items: RwLock::new(HashMap::new()),
            tags: RwLock::new(BTreeMap::new()),
            recommendations: RwLock::new(HashMap::new()),
            tasks: RwLock::new(BTreeMap::new()),
            plans: RwLock::new(HashMap::new()),
            points: RwLock::new(HashMap::new()),
            achievement_types: RwLock::new(BTreeMap::new()),
            progress: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn read<T>(lock: &RwLock<T>) -> StoreResult<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|_| AppError::Internal("store lock poisoned".to_string()))
}

fn write<T>(lock: &RwLock<T>) -> StoreResult<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|_| AppError::Internal("store lock poisoned".to_string()))
}

impl UserStore for InMemoryStore {
    fn create_user(&self, username: &str, password_hash: &str) -> StoreResult<UserId> {
        validate_username(username)?;
        let mut users = write(&self.users)?;
        if users.values().any(|u| u.username == username) {
            return Err(AppError::NotAllowed(format!(
                "User with username {} already exists!",
                username
            )));
        }
        let id = UserId(self.next_id());
        users.insert(
            id,
            User {
                id,
                username: username.to_string(),
                password_hash: password_hash.to_string(),
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    fn get_user(&self, user_id: UserId) -> StoreResult<Option<User>> {
        Ok(read(&self.users)?.get(&user_id).cloned())
    }

    fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(read(&self.users)?
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    fn list_users(&self) -> StoreResult<Vec<User>> {
        let mut users: Vec<User> = read(&self.users)?.values().cloned().collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    fn update_user(
        &self,
        user_id: UserId,
        username: Option<&str>,
        password_hash: Option<&str>,
    ) -> StoreResult<()> {
        let mut users = write(&self.users)?;
        if let Some(name) = username {
            validate_username(name)?;
            if users.values().any(|u| u.username == name && u.id != user_id) {
                return Err(AppError::NotAllowed(format!(
                    "User with username {} already exists!",
                    name
                )));
            }
        }
        let user = users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found!", user_id.0)))?;
        if let Some(name) = username {
            user.username = name.to_string();
        }
        if let Some(hash) = password_hash {
            user.password_hash = hash.to_string();
        }
        Ok(())
    }

    fn delete_user(&self, user_id: UserId) -> StoreResult<()> {
        write(&self.users)?
            .remove(&user_id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("User {} not found!", user_id.0)))
    }
}

impl SessionStore for InMemoryStore {
    fn create_session(&self, user_id: UserId) -> StoreResult<Session> {
        let session = Session {
            id: SessionId(generate_session_id()),
            user_id,
            created_at: Utc::now(),
        };
        write(&self.sessions)?.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    fn get_session(&self, session_id: &SessionId) -> StoreResult<Option<Session>> {
        Ok(read(&self.sessions)?.get(session_id).cloned())
    }

    fn delete_session(&self, session_id: &SessionId) -> StoreResult<()> {
        write(&self.sessions)?.remove(session_id);
        Ok(())
    }

    fn delete_sessions_for_user(&self, user_id: UserId) -> StoreResult<u64> {
        let mut sessions = write(&self.sessions)?;
        let before = sessions.len();
        sessions.retain(|_, s| s.user_id != user_id);
        Ok((before - sessions.len()) as u64)
    }
}

impl ItemStore for InMemoryStore {
    fn create_item(&self, owner: UserId, item: NewItem) -> StoreResult<ItemId> {
        item.validate()?;
        let id = ItemId(self.next_id());
        write(&self.items)?.insert(
            id,
            Item {
                id,
                owner,
                name: item.name,
                last_used_date: item.last_used_date,
                location: item.location,
                purpose: item.purpose,
                image: item.image,
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    fn get_item(&self, item_id: ItemId) -> StoreResult<Option<Item>> {
        Ok(read(&self.items)?.get(&item_id).cloned())
    }

    fn list_items(&self, owner: UserId) -> StoreResult<Vec<Item>> {
        let mut items: Vec<Item> = read(&self.items)?
            .values()
            .filter(|i| i.owner == owner)
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            b.last_used_date
                .cmp(&a.last_used_date)
                .then(b.id.cmp(&a.id))
        });
        Ok(items)
    }

    fn update_item(&self, item_id: ItemId, update: ItemUpdate) -> StoreResult<()> {
        update.validate()?;
        let mut items = write(&self.items)?;
        let item = items
            .get_mut(&item_id)
            .ok_or_else(|| AppError::NotFound(format!("Item {} not found!", item_id.0)))?;
        update.apply(item);
        Ok(())
    }

    fn delete_item(&self, item_id: ItemId) -> StoreResult<()> {
        write(&self.items)?
            .remove(&item_id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Item {} not found!", item_id.0)))
    }

    fn delete_items_by_owner(&self, owner: UserId) -> StoreResult<u64> {
        let mut items = write(&self.items)?;
        let before = items.len();
        items.retain(|_, i| i.owner != owner);
        Ok((before - items.len()) as u64)
    }
}

impl TagStore for InMemoryStore {
    fn create_tag(&self, value: &str, threshold: u32) -> StoreResult<()> {
        validate_tag_value(value)?;
        let mut tags = write(&self.tags)?;
        if tags.contains_key(value) {
            return Err(AppError::NotAllowed(format!("Tag {} already exists!", value)));
        }
        tags.insert(
            value.to_string(),
            Tag {
                value: value.to_string(),
                threshold,
                tagged_items: Vec::new(),
            },
        );
        Ok(())
    }

    fn get_tag(&self, value: &str) -> StoreResult<Option<Tag>> {
        Ok(read(&self.tags)?.get(value).cloned())
    }

    fn list_tags(&self) -> StoreResult<Vec<Tag>> {
        Ok(read(&self.tags)?.values().cloned().collect())
    }

    fn tag_item(&self, value: &str, item_id: ItemId) -> StoreResult<()> {
        let mut tags = write(&self.tags)?;
        let tag = tags
            .get_mut(value)
            .ok_or_else(|| AppError::NotFound(format!("Tag {} does not exist!", value)))?;
        if tag.tagged_items.contains(&item_id) {
            return Err(AppError::NotAllowed(format!(
                "Item {} is already tagged {}!",
                item_id.0, value
            )));
        }
        tag.tagged_items.push(item_id);
        Ok(())
    }

    fn untag_item(&self, value: &str, item_id: ItemId) -> StoreResult<()> {
        let mut tags = write(&self.tags)?;
        let tag = tags
            .get_mut(value)
            .ok_or_else(|| AppError::NotFound(format!("Tag {} does not exist!", value)))?;
        let before = tag.tagged_items.len();
        tag.tagged_items.retain(|id| *id != item_id);
        if tag.tagged_items.len() == before {
            return Err(AppError::NotAllowed(format!(
                "Item {} is not tagged {}!",
                item_id.0, value
            )));
        }
        Ok(())
    }

    fn untag_everywhere(&self, item_ids: &[ItemId]) -> StoreResult<u64> {
        let mut removed = 0;
        for tag in write(&self.tags)?.values_mut() {
            let before = tag.tagged_items.len();
            tag.tagged_items.retain(|id| !item_ids.contains(id));
            removed += (before - tag.tagged_items.len()) as u64;
        }
        Ok(removed)
    }

    fn tags_for_items(&self, item_ids: &[ItemId]) -> StoreResult<Vec<String>> {
        Ok(read(&self.tags)?
            .values()
            .filter(|tag| tag.tagged_items.iter().any(|id| item_ids.contains(id)))
            .map(|tag| tag.value.clone())
            .collect())
    }
}

impl RecommendationStore for InMemoryStore {
    fn create_recommendation(&self, tag: &str, text: &str) -> StoreResult<Recommendation> {
        validate_recommendation(tag, text)?;
        let mut recs = write(&self.recommendations)?;
        if recs.contains_key(tag) {
            return Err(AppError::NotAllowed(format!(
                "Recommendation for tag {} already exists!",
                tag
            )));
        }
        let rec = Recommendation {
            tag: tag.to_string(),
            text: text.to_string(),
        };
        recs.insert(tag.to_string(), rec.clone());
        Ok(rec)
    }

    fn find_recommendation(&self, tag: &str) -> StoreResult<Option<Recommendation>> {
        Ok(read(&self.recommendations)?.get(tag).cloned())
    }

    fn delete_recommendation(&self, tag: &str) -> StoreResult<()> {
        write(&self.recommendations)?
            .remove(tag)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Recommendation for tag {} not found!", tag)))
    }
}

impl TaskStore for InMemoryStore {
    fn assign_task(&self, user: UserId, objective: &str, item: ItemId) -> StoreResult<TaskId> {
        let mut tasks = write(&self.tasks)?;
        if tasks
            .values()
            .any(|t| t.assignee == user && t.objective == objective && t.item == item)
        {
            return Err(AppError::NotAllowed(format!(
                "Task for user {} and item {} already exists!",
                user.0, item.0
            )));
        }
        let id = TaskId(self.next_id());
        tasks.insert(
            id,
            Task {
                id,
                objective: objective.to_string(),
                assignee: user,
                item,
            },
        );
        Ok(id)
    }

    fn get_task(&self, task_id: TaskId) -> StoreResult<Option<Task>> {
        Ok(read(&self.tasks)?.get(&task_id).cloned())
    }

    fn find_task(
        &self,
        user: UserId,
        objective: &str,
        item: ItemId,
    ) -> StoreResult<Option<Task>> {
        Ok(read(&self.tasks)?
            .values()
            .find(|t| t.assignee == user && t.objective == objective && t.item == item)
            .cloned())
    }

    fn tasks_for_user(&self, user: UserId) -> StoreResult<Vec<Task>> {
        Ok(read(&self.tasks)?
            .values()
            .filter(|t| t.assignee == user)
            .cloned()
            .collect())
    }

    fn tasks_for_item(&self, item: ItemId) -> StoreResult<Vec<Task>> {
        Ok(read(&self.tasks)?
            .values()
            .filter(|t| t.item == item)
            .cloned()
            .collect())
    }

    fn delete_task(&self, task_id: TaskId) -> StoreResult<()> {
        write(&self.tasks)?
            .remove(&task_id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Task {} does not exist!", task_id.0)))
    }

    fn delete_tasks_for_item(&self, item: ItemId) -> StoreResult<u64> {
        let mut tasks = write(&self.tasks)?;
        let before = tasks.len();
        tasks.retain(|_, t| t.item != item);
        Ok((before - tasks.len()) as u64)
    }

    fn delete_tasks_for_user(&self, user: UserId) -> StoreResult<u64> {
        let mut tasks = write(&self.tasks)?;
        let before = tasks.len();
        tasks.retain(|_, t| t.assignee != user);
        Ok((before - tasks.len()) as u64)
    }
}

impl PlanStore for InMemoryStore {
    fn create_plan(
        &self,
        user: UserId,
        deadline: NaiveDate,
        tasks: &[TaskId],
    ) -> StoreResult<PlanId> {
        check_capacity(tasks.len())?;
        let mut plans = write(&self.plans)?;
        if plans
            .values()
            .any(|p| p.user == user && p.deadline == deadline)
        {
            return Err(AppError::NotAllowed(format!(
                "Plan for user {} on {} already exists!",
                user.0, deadline
            )));
        }
        let id = PlanId(self.next_id());
        plans.insert(
            id,
            Plan {
                id,
                user,
                deadline,
                tasks: tasks.to_vec(),
            },
        );
        Ok(id)
    }

    fn get_plan(&self, user: UserId, deadline: NaiveDate) -> StoreResult<Option<Plan>> {
        Ok(read(&self.plans)?
            .values()
            .find(|p| p.user == user && p.deadline == deadline)
            .cloned())
    }

    fn plans_for_user(&self, user: UserId) -> StoreResult<Vec<Plan>> {
        let mut plans: Vec<Plan> = read(&self.plans)?
            .values()
            .filter(|p| p.user == user)
            .cloned()
            .collect();
        plans.sort_by_key(|p| p.deadline);
        Ok(plans)
    }

    fn set_plan_tasks(&self, plan_id: PlanId, tasks: &[TaskId]) -> StoreResult<()> {
        check_capacity(tasks.len())?;
        let mut plans = write(&self.plans)?;
        let plan = plans
            .get_mut(&plan_id)
            .ok_or_else(|| AppError::NotFound(format!("Plan {} not found!", plan_id.0)))?;
        plan.tasks = tasks.to_vec();
        Ok(())
    }

    fn delete_plans_for_user(&self, user: UserId) -> StoreResult<u64> {
        let mut plans = write(&self.plans)?;
        let before = plans.len();
        plans.retain(|_, p| p.user != user);
        Ok((before - plans.len()) as u64)
    }

    fn delete_expired_plans(&self, today: NaiveDate) -> StoreResult<u64> {
        let mut plans = write(&self.plans)?;
        let before = plans.len();
        plans.retain(|_, p| p.deadline >= today);
        Ok((before - plans.len()) as u64)
    }
}

impl PointStore for InMemoryStore {
    fn find_points(&self, user: UserId) -> StoreResult<Option<u64>> {
        Ok(read(&self.points)?.get(&user).copied())
    }

    fn init_points(&self, user: UserId) -> StoreResult<()> {
        write(&self.points)?.entry(user).or_insert(0);
        Ok(())
    }

    fn add_points(&self, user: UserId, quantity: u64) -> StoreResult<u64> {
        let mut points = write(&self.points)?;
        let total = points.entry(user).or_insert(0);
        *total += quantity;
        Ok(*total)
    }

    fn delete_points(&self, user: UserId) -> StoreResult<()> {
        write(&self.points)?.remove(&user);
        Ok(())
    }
}

impl AchievementStore for InMemoryStore {
    fn put_achievement_type(&self, def: &AchievementType) -> StoreResult<()> {
        write(&self.achievement_types)?.insert(def.name.clone(), def.clone());
        Ok(())
    }

    fn list_achievement_types(&self) -> StoreResult<Vec<AchievementType>> {
        Ok(read(&self.achievement_types)?.values().cloned().collect())
    }

    fn get_progress(&self, user: UserId, name: &str) -> StoreResult<u64> {
        Ok(read(&self.progress)?
            .get(&(user, name.to_string()))
            .copied()
            .unwrap_or(0))
    }

    fn add_progress(&self, user: UserId, name: &str, delta: u64) -> StoreResult<u64> {
        let mut progress = write(&self.progress)?;
        let total = progress.entry((user, name.to_string())).or_insert(0);
        *total += delta;
        Ok(*total)
    }

    fn delete_user_progress(&self, user: UserId) -> StoreResult<u64> {
        let mut progress = write(&self.progress)?;
        let before = progress.len();
        progress.retain(|(u, _), _| *u != user);
        Ok((before - progress.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_username_rejected() {
        let store = InMemoryStore::new();

        store.create_user("alice", "hash").unwrap();
        let result = store.create_user("alice", "other");
        assert!(matches!(result, Err(AppError::NotAllowed(_))));

        let result = store.create_user("   ", "hash");
        assert!(matches!(result, Err(AppError::BadValues(_))));
    }

    #[test]
    fn test_rename_user_collision() {
        let store = InMemoryStore::new();

        let alice = store.create_user("alice", "hash").unwrap();
        store.create_user("bob", "hash").unwrap();

        let result = store.update_user(alice, Some("bob"), None);
        assert!(matches!(result, Err(AppError::NotAllowed(_))));

        store.update_user(alice, Some("alice2"), Some("new")).unwrap();
        let user = store.get_user(alice).unwrap().unwrap();
        assert_eq!(user.username, "alice2");
        assert_eq!(user.password_hash, "new");
    }

    #[test]
    fn test_session_lifecycle() {
        let store = InMemoryStore::new();

        let session = store.create_session(UserId(1)).unwrap();
        assert!(store.get_session(&session.id).unwrap().is_some());

        store.delete_session(&session.id).unwrap();
        assert!(store.get_session(&session.id).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_item_names_allowed() {
        let store = InMemoryStore::new();
        let owner = UserId(1);

        let a = store.create_item(owner, NewItem::named("Lamp")).unwrap();
        let b = store.create_item(owner, NewItem::named("Lamp")).unwrap();
        assert_ne!(a, b);
        assert_eq!(store.list_items(owner).unwrap().len(), 2);
    }

    #[test]
    fn test_items_sorted_by_last_used() {
        let store = InMemoryStore::new();
        let owner = UserId(1);
        let date = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();

        let old = store
            .create_item(owner, NewItem { last_used_date: Some(date(1)), ..NewItem::named("old") })
            .unwrap();
        let never = store.create_item(owner, NewItem::named("never")).unwrap();
        let recent = store
            .create_item(owner, NewItem { last_used_date: Some(date(20)), ..NewItem::named("recent") })
            .unwrap();

        let ids: Vec<ItemId> = store.list_items(owner).unwrap().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![recent, old, never]);
    }

    #[test]
    fn test_ownership_guard() {
        let store = InMemoryStore::new();
        let item = store.create_item(UserId(1), NewItem::named("Kettle")).unwrap();

        assert!(store.is_owner(UserId(1), item).is_ok());
        assert!(matches!(store.is_owner(UserId(2), item), Err(AppError::NotAllowed(_))));
        assert!(matches!(store.is_owner(UserId(1), ItemId(999)), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_tag_membership_guards() {
        let store = InMemoryStore::new();
        store.create_tag("Books", 3).unwrap();

        store.tag_item("Books", ItemId(1)).unwrap();
        let again = store.tag_item("Books", ItemId(1));
        assert!(matches!(again, Err(AppError::NotAllowed(_))));

        store.untag_item("Books", ItemId(1)).unwrap();
        let absent = store.untag_item("Books", ItemId(1));
        assert!(matches!(absent, Err(AppError::NotAllowed(_))));

        let missing_tag = store.tag_item("Nope", ItemId(1));
        assert!(matches!(missing_tag, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_tag_item_with_all_creates_and_dedups() {
        let store = InMemoryStore::new();
        let tags = vec!["Books".to_string(), "Signed".to_string()];

        store.tag_item_with_all(&tags, ItemId(7)).unwrap();
        store.tag_item_with_all(&tags, ItemId(7)).unwrap();

        assert_eq!(store.items_for_tag("Books").unwrap(), vec![ItemId(7)]);
        assert_eq!(store.tag_threshold("Books").unwrap(), 15);
        assert_eq!(
            store.tag_threshold("Signed").unwrap(),
            nixknack_core::DEFAULT_TAG_THRESHOLD
        );
        assert_eq!(
            store.tags_for_items(&[ItemId(7)]).unwrap(),
            vec!["Books".to_string(), "Signed".to_string()]
        );
    }

    #[test]
    fn test_untag_everywhere() {
        let store = InMemoryStore::new();
        store
            .tag_item_with_all(&["A".to_string(), "B".to_string()], ItemId(1))
            .unwrap();
        store.tag_item_with_all(&["A".to_string()], ItemId(2)).unwrap();

        assert_eq!(store.untag_everywhere(&[ItemId(1)]).unwrap(), 2);
        assert_eq!(store.items_for_tag("A").unwrap(), vec![ItemId(2)]);
        assert!(store.items_for_tag("B").unwrap().is_empty());
    }

    #[test]
    fn test_recommendation_fallback() {
        let store = InMemoryStore::new();

        let rec = store.get_recommendation("Books").unwrap();
        assert_eq!(rec.text, nixknack_core::recommendation::DEFAULT_TEXT);

        store.create_recommendation("Miscellaneous", "Give it away").unwrap();
        assert_eq!(store.get_recommendation("Books").unwrap().text, "Give it away");

        store.create_recommendation("Books", "Donate to a library").unwrap();
        assert_eq!(store.get_recommendation("Books").unwrap().text, "Donate to a library");

        let dup = store.create_recommendation("Books", "again");
        assert!(matches!(dup, Err(AppError::NotAllowed(_))));
        let empty = store.create_recommendation("Toys", "");
        assert!(matches!(empty, Err(AppError::BadValues(_))));
    }

    #[test]
    fn test_task_uniqueness_and_completion() {
        let store = InMemoryStore::new();
        let user = UserId(1);

        let task = store.assign_task(user, "Donate", ItemId(5)).unwrap();
        let dup = store.assign_task(user, "Donate", ItemId(5));
        assert!(matches!(dup, Err(AppError::NotAllowed(_))));

        assert!(store.is_assigned(user, task).is_ok());
        assert!(matches!(store.is_assigned(UserId(2), task), Err(AppError::NotAllowed(_))));

        assert_eq!(store.complete_task(task).unwrap(), ItemId(5));
        assert!(matches!(store.complete_task(task), Err(AppError::NotAllowed(_))));
    }

    #[test]
    fn test_plan_uniqueness_and_cap() {
        let store = InMemoryStore::new();
        let user = UserId(1);
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();

        store.create_plan(user, day, &[TaskId(1)]).unwrap();
        let dup = store.create_plan(user, day, &[]);
        assert!(matches!(dup, Err(AppError::NotAllowed(_))));

        let next = day.succ_opt().unwrap();
        let over = store.create_plan(user, next, &[TaskId(1), TaskId(2), TaskId(3), TaskId(4)]);
        assert!(matches!(over, Err(AppError::Domain(_))));
    }

    #[test]
    fn test_expired_plans_swept() {
        let store = InMemoryStore::new();
        let user = UserId(1);
        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();

        store.create_plan(user, today.pred_opt().unwrap(), &[]).unwrap();
        store.create_plan(user, today, &[]).unwrap();

        assert_eq!(store.delete_expired_plans(today).unwrap(), 1);
        let remaining = store.plans_for_user(user).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].deadline, today);
    }

    #[test]
    fn test_points_accumulate_from_zero() {
        let store = InMemoryStore::new();
        let user = UserId(1);

        assert!(matches!(store.get_points(user), Err(AppError::NotFound(_))));
        store.init_points(user).unwrap();
        assert_eq!(store.get_points(user).unwrap(), 0);

        store.add_points(user, 5).unwrap();
        assert_eq!(store.add_points(user, 10).unwrap(), 15);

        store.init_points(user).unwrap();
        assert_eq!(store.get_points(user).unwrap(), 15);
    }

    #[test]
    fn test_achievement_data() {
        let store = InMemoryStore::new();
        let user = UserId(1);
        store
            .upsert_achievement_type(&AchievementType::new("Experience", vec![0, 50, 100, 250]).unwrap())
            .unwrap();

        store.add_progress(user, "Experience", 70).unwrap();
        store.add_progress(user, "Experience", 5).unwrap();

        let data = store.achievement_data(user).unwrap();
        assert_eq!(data.progress["Experience"], 75);
        assert_eq!(data.levels["Experience"], Some(1));
        assert_eq!(data.bounds["Experience"], nixknack_core::Bounds(Some(50), Some(100)));

        assert_eq!(store.delete_user_progress(user).unwrap(), 1);
        assert_eq!(store.get_progress(user, "Experience").unwrap(), 0);
    }
    #[test]
    fn test_invalid_thresholds_rejected() {
        let store = InMemoryStore::new();
        let unsorted = AchievementType {
            name: "Bad".to_string(),
            thresholds: vec![100, 5],
        };
        let empty = AchievementType {
            name: "Empty".to_string(),
            thresholds: vec![],
        };

        assert!(matches!(
            store.upsert_achievement_type(&unsorted),
            Err(AppError::Domain(nixknack_core::Error::UnsortedThresholds { .. }))
        ));
        assert!(matches!(
            store.upsert_achievement_type(&empty),
            Err(AppError::Domain(nixknack_core::Error::EmptyThresholds { .. }))
        ));
        assert!(store.list_achievement_types().unwrap().is_empty());
    }
}
