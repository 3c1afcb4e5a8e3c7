//! SQLite-based storage implementation

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, Utc};
use nixknack_core::schedule::check_capacity;
use nixknack_core::AchievementType;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{
    validate_recommendation, validate_tag_value, validate_username, AchievementStore, Item,
    ItemId, ItemStore, ItemUpdate, NewItem, Plan, PlanId, PlanStore, PointStore, Recommendation,
    RecommendationStore, Session, SessionId, SessionStore, StoreResult, Tag, TagStore, Task,
    TaskId, TaskStore, User, UserId, UserStore,
};
use crate::crypto::generate_session_id;
use crate::error::AppError;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// SQLite-based store implementing every concept store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path
    pub fn open(path: &str) -> Result<Self, AppError> {
        let conn = Connection::open(path).map_err(internal)?;
        Self::init(conn)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self, AppError> {
        let conn = Connection::open_in_memory().map_err(internal)?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, AppError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(internal)?;

        Self::migrate(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Internal("connection lock poisoned".to_string()))
    }

    /// Run database migrations
    fn migrate(conn: &Connection) -> Result<(), AppError> {
        let current_version = Self::get_schema_version(conn)?;

        if current_version < SCHEMA_VERSION {
            tracing::info!(
                current = current_version,
                target = SCHEMA_VERSION,
                "Running database migrations"
            );

            if current_version < 1 {
                Self::migrate_v1(conn)?;
            }

            conn.execute(
                "INSERT OR REPLACE INTO schema_version (version) VALUES (?1)",
                params![SCHEMA_VERSION],
            )
            .map_err(internal)?;

            tracing::info!("Database migrations complete");
        }

        Ok(())
    }

    /// Get current schema version (0 if no schema exists)
    fn get_schema_version(conn: &Connection) -> Result<i32, AppError> {
        let table_exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
                [],
                |row| row.get(0),
            )
            .map_err(internal)?;

        if !table_exists {
            return Ok(0);
        }

        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
            row.get::<_, Option<i32>>(0).map(|v| v.unwrap_or(0))
        })
        .map_err(internal)
    }

    /// Migration to version 1: initial schema
    fn migrate_v1(conn: &Connection) -> Result<(), AppError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL
            );

            -- Concepts reference users by id only; account deletion cascades
            -- through the route layer
            CREATE TABLE IF NOT EXISTS items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner INTEGER NOT NULL,
                name TEXT NOT NULL,
                last_used_date TEXT,
                location TEXT,
                purpose TEXT,
                image TEXT,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_items_owner ON items(owner);

            CREATE TABLE IF NOT EXISTS tags (
                value TEXT PRIMARY KEY,
                threshold INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS tag_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                tag TEXT NOT NULL REFERENCES tags(value) ON DELETE CASCADE,
                item_id INTEGER NOT NULL,
                UNIQUE (tag, item_id)
            );
            CREATE INDEX IF NOT EXISTS idx_tag_items_item ON tag_items(item_id);

            CREATE TABLE IF NOT EXISTS recommendations (
                tag TEXT PRIMARY KEY,
                text TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                objective TEXT NOT NULL,
                assignee INTEGER NOT NULL,
                item_id INTEGER NOT NULL,
                UNIQUE (assignee, objective, item_id)
            );
            CREATE INDEX IF NOT EXISTS idx_tasks_item ON tasks(item_id);

            CREATE TABLE IF NOT EXISTS plans (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                deadline TEXT NOT NULL,
                UNIQUE (user_id, deadline)
            );

            CREATE TABLE IF NOT EXISTS plan_tasks (
                plan_id INTEGER NOT NULL REFERENCES plans(id) ON DELETE CASCADE,
                position INTEGER NOT NULL,
                task_id INTEGER NOT NULL,
                PRIMARY KEY (plan_id, position)
            );

            CREATE TABLE IF NOT EXISTS points (
                user_id INTEGER PRIMARY KEY,
                points INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS achievement_types (
                name TEXT PRIMARY KEY,
                thresholds TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS achievement_progress (
                user_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                progress INTEGER NOT NULL,
                PRIMARY KEY (user_id, name)
            );
            "#,
        )
        .map_err(internal)?;

        Ok(())
    }

    fn plan_tasks(conn: &Connection, plan_id: PlanId) -> StoreResult<Vec<TaskId>> {
        let mut stmt = conn
            .prepare("SELECT task_id FROM plan_tasks WHERE plan_id = ?1 ORDER BY position")
            .map_err(internal)?;
        let tasks = stmt
            .query_map(params![plan_id.0 as i64], |row| {
                row.get::<_, i64>(0).map(|id| TaskId(id as u64))
            })
            .map_err(internal)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(internal)?;
        Ok(tasks)
    }

    fn write_plan_tasks(conn: &Connection, plan_id: PlanId, tasks: &[TaskId]) -> StoreResult<()> {
        conn.execute(
            "DELETE FROM plan_tasks WHERE plan_id = ?1",
            params![plan_id.0 as i64],
        )
        .map_err(internal)?;
        for (position, task) in tasks.iter().enumerate() {
            conn.execute(
                "INSERT INTO plan_tasks (plan_id, position, task_id) VALUES (?1, ?2, ?3)",
                params![plan_id.0 as i64, position as i64, task.0 as i64],
            )
            .map_err(internal)?;
        }
        Ok(())
    }

    fn load_plans(
        conn: &Connection,
        sql: &str,
        args: &[&dyn rusqlite::ToSql],
    ) -> StoreResult<Vec<Plan>> {
        let mut stmt = conn.prepare(sql).map_err(internal)?;
        let heads = stmt
            .query_map(args, |row| {
                let id: i64 = row.get(0)?;
                let user: i64 = row.get(1)?;
                let deadline: String = row.get(2)?;
                Ok((PlanId(id as u64), UserId(user as u64), deadline))
            })
            .map_err(internal)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(internal)?;

        let mut plans = Vec::with_capacity(heads.len());
        for (id, user, deadline) in heads {
            plans.push(Plan {
                id,
                user,
                deadline: parse_date(&deadline)?,
                tasks: Self::plan_tasks(conn, id)?,
            });
        }
        Ok(plans)
    }
}

fn internal(e: rusqlite::Error) -> AppError {
    AppError::Internal(e.to_string())
}

/// Map a unique-constraint violation to `NotAllowed`, anything else to `Internal`
fn constraint(e: rusqlite::Error, message: impl FnOnce() -> String) -> AppError {
    if let rusqlite::Error::SqliteFailure(ref err, _) = e {
        if err.code == rusqlite::ErrorCode::ConstraintViolation {
            return AppError::NotAllowed(message());
        }
    }
    internal(e)
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_date(s: &str) -> StoreResult<NaiveDate> {
    s.parse::<NaiveDate>()
        .map_err(|e| AppError::Internal(format!("bad date {:?} in database: {}", s, e)))
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let id: i64 = row.get(0)?;
    let created_at: String = row.get(3)?;
    Ok(User {
        id: UserId(id as u64),
        username: row.get(1)?,
        password_hash: row.get(2)?,
        created_at: parse_timestamp(&created_at),
    })
}

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<Item> {
    let id: i64 = row.get(0)?;
    let owner: i64 = row.get(1)?;
    let last_used_date: Option<String> = row.get(3)?;
    let created_at: String = row.get(7)?;
    Ok(Item {
        id: ItemId(id as u64),
        owner: UserId(owner as u64),
        name: row.get(2)?,
        last_used_date: last_used_date.and_then(|s| s.parse().ok()),
        location: row.get(4)?,
        purpose: row.get(5)?,
        image: row.get(6)?,
        created_at: parse_timestamp(&created_at),
    })
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    let id: i64 = row.get(0)?;
    let assignee: i64 = row.get(2)?;
    let item: i64 = row.get(3)?;
    Ok(Task {
        id: TaskId(id as u64),
        objective: row.get(1)?,
        assignee: UserId(assignee as u64),
        item: ItemId(item as u64),
    })
}

const ITEM_COLUMNS: &str =
    "id, owner, name, last_used_date, location, purpose, image, created_at";

const TASK_COLUMNS: &str = "id, objective, assignee, item_id";

impl UserStore for SqliteStore {
    fn create_user(&self, username: &str, password_hash: &str) -> StoreResult<UserId> {
        validate_username(username)?;
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO users (username, password_hash, created_at) VALUES (?1, ?2, ?3)",
            params![username, password_hash, Utc::now().to_rfc3339()],
        )
        .map_err(|e| constraint(e, || format!("User with username {} already exists!", username)))?;

        Ok(UserId(conn.last_insert_rowid() as u64))
    }

    fn get_user(&self, user_id: UserId) -> StoreResult<Option<User>> {
        self.conn()?
            .query_row(
                "SELECT id, username, password_hash, created_at FROM users WHERE id = ?1",
                params![user_id.0 as i64],
                user_from_row,
            )
            .optional()
            .map_err(internal)
    }

    fn get_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        self.conn()?
            .query_row(
                "SELECT id, username, password_hash, created_at FROM users WHERE username = ?1",
                params![username],
                user_from_row,
            )
            .optional()
            .map_err(internal)
    }

    fn list_users(&self) -> StoreResult<Vec<User>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT id, username, password_hash, created_at FROM users ORDER BY id")
            .map_err(internal)?;
        let users = stmt
            .query_map([], user_from_row)
            .map_err(internal)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(internal)?;
        Ok(users)
    }

    fn update_user(
        &self,
        user_id: UserId,
        username: Option<&str>,
        password_hash: Option<&str>,
    ) -> StoreResult<()> {
        if let Some(name) = username {
            validate_username(name)?;
        }
        let conn = self.conn()?;

        let rows_affected = conn
            .execute(
                "UPDATE users SET username = COALESCE(?1, username),
                                  password_hash = COALESCE(?2, password_hash)
                 WHERE id = ?3",
                params![username, password_hash, user_id.0 as i64],
            )
            .map_err(|e| {
                constraint(e, || {
                    format!("User with username {} already exists!", username.unwrap_or_default())
                })
            })?;

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!("User {} not found!", user_id.0)));
        }

        Ok(())
    }

    fn delete_user(&self, user_id: UserId) -> StoreResult<()> {
        let rows_affected = self
            .conn()?
            .execute("DELETE FROM users WHERE id = ?1", params![user_id.0 as i64])
            .map_err(internal)?;

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!("User {} not found!", user_id.0)));
        }

        Ok(())
    }
}

impl SessionStore for SqliteStore {
    fn create_session(&self, user_id: UserId) -> StoreResult<Session> {
        let session = Session {
            id: SessionId(generate_session_id()),
            user_id,
            created_at: Utc::now(),
        };

        self.conn()?
            .execute(
                "INSERT INTO sessions (id, user_id, created_at) VALUES (?1, ?2, ?3)",
                params![
                    session.id.0,
                    session.user_id.0 as i64,
                    session.created_at.to_rfc3339(),
                ],
            )
            .map_err(internal)?;

        Ok(session)
    }

    fn get_session(&self, session_id: &SessionId) -> StoreResult<Option<Session>> {
        self.conn()?
            .query_row(
                "SELECT id, user_id, created_at FROM sessions WHERE id = ?1",
                params![session_id.0],
                |row| {
                    let id: String = row.get(0)?;
                    let user_id: i64 = row.get(1)?;
                    let created_at: String = row.get(2)?;
                    Ok(Session {
                        id: SessionId(id),
                        user_id: UserId(user_id as u64),
                        created_at: parse_timestamp(&created_at),
                    })
                },
            )
            .optional()
            .map_err(internal)
    }

    fn delete_session(&self, session_id: &SessionId) -> StoreResult<()> {
        self.conn()?
            .execute("DELETE FROM sessions WHERE id = ?1", params![session_id.0])
            .map_err(internal)?;
        Ok(())
    }

    fn delete_sessions_for_user(&self, user_id: UserId) -> StoreResult<u64> {
        let rows = self
            .conn()?
            .execute(
                "DELETE FROM sessions WHERE user_id = ?1",
                params![user_id.0 as i64],
            )
            .map_err(internal)?;
        Ok(rows as u64)
    }
}

impl ItemStore for SqliteStore {
    fn create_item(&self, owner: UserId, item: NewItem) -> StoreResult<ItemId> {
        item.validate()?;
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO items (owner, name, last_used_date, location, purpose, image, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                owner.0 as i64,
                item.name,
                item.last_used_date.map(|d| d.to_string()),
                item.location,
                item.purpose,
                item.image,
                Utc::now().to_rfc3339(),
            ],
        )
        .map_err(internal)?;

        Ok(ItemId(conn.last_insert_rowid() as u64))
    }

    fn get_item(&self, item_id: ItemId) -> StoreResult<Option<Item>> {
        self.conn()?
            .query_row(
                &format!("SELECT {} FROM items WHERE id = ?1", ITEM_COLUMNS),
                params![item_id.0 as i64],
                item_from_row,
            )
            .optional()
            .map_err(internal)
    }

    fn list_items(&self, owner: UserId) -> StoreResult<Vec<Item>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM items WHERE owner = ?1
                 ORDER BY last_used_date IS NULL, last_used_date DESC, id DESC",
                ITEM_COLUMNS
            ))
            .map_err(internal)?;
        let items = stmt
            .query_map(params![owner.0 as i64], item_from_row)
            .map_err(internal)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(internal)?;
        Ok(items)
    }

    fn update_item(&self, item_id: ItemId, update: ItemUpdate) -> StoreResult<()> {
        update.validate()?;
        let rows_affected = self
            .conn()?
            .execute(
                "UPDATE items SET name = COALESCE(?1, name),
                                  last_used_date = COALESCE(?2, last_used_date),
                                  location = COALESCE(?3, location),
                                  purpose = COALESCE(?4, purpose),
                                  image = COALESCE(?5, image)
                 WHERE id = ?6",
                params![
                    update.name,
                    update.last_used_date.map(|d| d.to_string()),
                    update.location,
                    update.purpose,
                    update.image,
                    item_id.0 as i64,
                ],
            )
            .map_err(internal)?;

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!("Item {} not found!", item_id.0)));
        }

        Ok(())
    }

    fn delete_item(&self, item_id: ItemId) -> StoreResult<()> {
        let rows_affected = self
            .conn()?
            .execute("DELETE FROM items WHERE id = ?1", params![item_id.0 as i64])
            .map_err(internal)?;

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!("Item {} not found!", item_id.0)));
        }

        Ok(())
    }

    fn delete_items_by_owner(&self, owner: UserId) -> StoreResult<u64> {
        let rows = self
            .conn()?
            .execute("DELETE FROM items WHERE owner = ?1", params![owner.0 as i64])
            .map_err(internal)?;
        Ok(rows as u64)
    }
}

impl TagStore for SqliteStore {
    fn create_tag(&self, value: &str, threshold: u32) -> StoreResult<()> {
        validate_tag_value(value)?;
        self.conn()?
            .execute(
                "INSERT INTO tags (value, threshold) VALUES (?1, ?2)",
                params![value, threshold as i64],
            )
            .map_err(|e| constraint(e, || format!("Tag {} already exists!", value)))?;
        Ok(())
    }

    fn get_tag(&self, value: &str) -> StoreResult<Option<Tag>> {
        let conn = self.conn()?;

        let threshold: Option<i64> = conn
            .query_row(
                "SELECT threshold FROM tags WHERE value = ?1",
                params![value],
                |row| row.get(0),
            )
            .optional()
            .map_err(internal)?;

        let Some(threshold) = threshold else {
            return Ok(None);
        };

        let mut stmt = conn
            .prepare("SELECT item_id FROM tag_items WHERE tag = ?1 ORDER BY id")
            .map_err(internal)?;
        let tagged_items = stmt
            .query_map(params![value], |row| {
                row.get::<_, i64>(0).map(|id| ItemId(id as u64))
            })
            .map_err(internal)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(internal)?;

        Ok(Some(Tag {
            value: value.to_string(),
            threshold: threshold as u32,
            tagged_items,
        }))
    }

    fn list_tags(&self) -> StoreResult<Vec<Tag>> {
        let values: Vec<String> = {
            let conn = self.conn()?;
            let mut stmt = conn
                .prepare("SELECT value FROM tags ORDER BY value")
                .map_err(internal)?;
            let values = stmt
                .query_map([], |row| row.get(0))
                .map_err(internal)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(internal)?;
            values
        };

        let mut tags = Vec::with_capacity(values.len());
        for value in values {
            if let Some(tag) = self.get_tag(&value)? {
                tags.push(tag);
            }
        }
        Ok(tags)
    }

    fn tag_item(&self, value: &str, item_id: ItemId) -> StoreResult<()> {
        let conn = self.conn()?;

        let exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM tags WHERE value = ?1)",
                params![value],
                |row| row.get(0),
            )
            .map_err(internal)?;
        if !exists {
            return Err(AppError::NotFound(format!("Tag {} does not exist!", value)));
        }

        conn.execute(
            "INSERT INTO tag_items (tag, item_id) VALUES (?1, ?2)",
            params![value, item_id.0 as i64],
        )
        .map_err(|e| {
            constraint(e, || format!("Item {} is already tagged {}!", item_id.0, value))
        })?;

        Ok(())
    }

    fn untag_item(&self, value: &str, item_id: ItemId) -> StoreResult<()> {
        let conn = self.conn()?;

        let exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM tags WHERE value = ?1)",
                params![value],
                |row| row.get(0),
            )
            .map_err(internal)?;
        if !exists {
            return Err(AppError::NotFound(format!("Tag {} does not exist!", value)));
        }

        let rows_affected = conn
            .execute(
                "DELETE FROM tag_items WHERE tag = ?1 AND item_id = ?2",
                params![value, item_id.0 as i64],
            )
            .map_err(internal)?;
        if rows_affected == 0 {
            return Err(AppError::NotAllowed(format!(
                "Item {} is not tagged {}!",
                item_id.0, value
            )));
        }

        Ok(())
    }

    fn untag_everywhere(&self, item_ids: &[ItemId]) -> StoreResult<u64> {
        let conn = self.conn()?;
        let mut removed = 0;
        for id in item_ids {
            removed += conn
                .execute(
                    "DELETE FROM tag_items WHERE item_id = ?1",
                    params![id.0 as i64],
                )
                .map_err(internal)? as u64;
        }
        Ok(removed)
    }

    fn tags_for_items(&self, item_ids: &[ItemId]) -> StoreResult<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT tag FROM tag_items WHERE item_id = ?1")
            .map_err(internal)?;

        let mut values = std::collections::BTreeSet::new();
        for id in item_ids {
            let rows = stmt
                .query_map(params![id.0 as i64], |row| row.get::<_, String>(0))
                .map_err(internal)?;
            for value in rows {
                values.insert(value.map_err(internal)?);
            }
        }
        Ok(values.into_iter().collect())
    }
}

impl RecommendationStore for SqliteStore {
    fn create_recommendation(&self, tag: &str, text: &str) -> StoreResult<Recommendation> {
        validate_recommendation(tag, text)?;
        self.conn()?
            .execute(
                "INSERT INTO recommendations (tag, text) VALUES (?1, ?2)",
                params![tag, text],
            )
            .map_err(|e| {
                constraint(e, || format!("Recommendation for tag {} already exists!", tag))
            })?;
        Ok(Recommendation {
            tag: tag.to_string(),
            text: text.to_string(),
        })
    }

    fn find_recommendation(&self, tag: &str) -> StoreResult<Option<Recommendation>> {
        self.conn()?
            .query_row(
                "SELECT tag, text FROM recommendations WHERE tag = ?1",
                params![tag],
                |row| {
                    Ok(Recommendation {
                        tag: row.get(0)?,
                        text: row.get(1)?,
                    })
                },
            )
            .optional()
            .map_err(internal)
    }

    fn delete_recommendation(&self, tag: &str) -> StoreResult<()> {
        let rows_affected = self
            .conn()?
            .execute("DELETE FROM recommendations WHERE tag = ?1", params![tag])
            .map_err(internal)?;
        if rows_affected == 0 {
            return Err(AppError::NotFound(format!(
                "Recommendation for tag {} not found!",
                tag
            )));
        }
        Ok(())
    }
}

impl TaskStore for SqliteStore {
    fn assign_task(&self, user: UserId, objective: &str, item: ItemId) -> StoreResult<TaskId> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO tasks (objective, assignee, item_id) VALUES (?1, ?2, ?3)",
            params![objective, user.0 as i64, item.0 as i64],
        )
        .map_err(|e| {
            constraint(e, || {
                format!("Task for user {} and item {} already exists!", user.0, item.0)
            })
        })?;
        Ok(TaskId(conn.last_insert_rowid() as u64))
    }

    fn get_task(&self, task_id: TaskId) -> StoreResult<Option<Task>> {
        self.conn()?
            .query_row(
                &format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS),
                params![task_id.0 as i64],
                task_from_row,
            )
            .optional()
            .map_err(internal)
    }

    fn find_task(
        &self,
        user: UserId,
        objective: &str,
        item: ItemId,
    ) -> StoreResult<Option<Task>> {
        self.conn()?
            .query_row(
                &format!(
                    "SELECT {} FROM tasks WHERE assignee = ?1 AND objective = ?2 AND item_id = ?3",
                    TASK_COLUMNS
                ),
                params![user.0 as i64, objective, item.0 as i64],
                task_from_row,
            )
            .optional()
            .map_err(internal)
    }

    fn tasks_for_user(&self, user: UserId) -> StoreResult<Vec<Task>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM tasks WHERE assignee = ?1 ORDER BY id",
                TASK_COLUMNS
            ))
            .map_err(internal)?;
        let tasks = stmt
            .query_map(params![user.0 as i64], task_from_row)
            .map_err(internal)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(internal)?;
        Ok(tasks)
    }

    fn tasks_for_item(&self, item: ItemId) -> StoreResult<Vec<Task>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM tasks WHERE item_id = ?1 ORDER BY id",
                TASK_COLUMNS
            ))
            .map_err(internal)?;
        let tasks = stmt
            .query_map(params![item.0 as i64], task_from_row)
            .map_err(internal)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(internal)?;
        Ok(tasks)
    }

    fn delete_task(&self, task_id: TaskId) -> StoreResult<()> {
        let rows_affected = self
            .conn()?
            .execute("DELETE FROM tasks WHERE id = ?1", params![task_id.0 as i64])
            .map_err(internal)?;
        if rows_affected == 0 {
            return Err(AppError::NotFound(format!("Task {} does not exist!", task_id.0)));
        }
        Ok(())
    }

    fn delete_tasks_for_item(&self, item: ItemId) -> StoreResult<u64> {
        let rows = self
            .conn()?
            .execute("DELETE FROM tasks WHERE item_id = ?1", params![item.0 as i64])
            .map_err(internal)?;
        Ok(rows as u64)
    }

    fn delete_tasks_for_user(&self, user: UserId) -> StoreResult<u64> {
        let rows = self
            .conn()?
            .execute("DELETE FROM tasks WHERE assignee = ?1", params![user.0 as i64])
            .map_err(internal)?;
        Ok(rows as u64)
    }
}

impl PlanStore for SqliteStore {
    fn create_plan(
        &self,
        user: UserId,
        deadline: NaiveDate,
        tasks: &[TaskId],
    ) -> StoreResult<PlanId> {
        check_capacity(tasks.len())?;
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO plans (user_id, deadline) VALUES (?1, ?2)",
            params![user.0 as i64, deadline.to_string()],
        )
        .map_err(|e| {
            constraint(e, || {
                format!("Plan for user {} on {} already exists!", user.0, deadline)
            })
        })?;

        let id = PlanId(conn.last_insert_rowid() as u64);
        Self::write_plan_tasks(&conn, id, tasks)?;
        Ok(id)
    }

    fn get_plan(&self, user: UserId, deadline: NaiveDate) -> StoreResult<Option<Plan>> {
        let conn = self.conn()?;
        let plans = Self::load_plans(
            &conn,
            "SELECT id, user_id, deadline FROM plans WHERE user_id = ?1 AND deadline = ?2",
            params![user.0 as i64, deadline.to_string()],
        )?;
        Ok(plans.into_iter().next())
    }

    fn plans_for_user(&self, user: UserId) -> StoreResult<Vec<Plan>> {
        let conn = self.conn()?;
        Self::load_plans(
            &conn,
            "SELECT id, user_id, deadline FROM plans WHERE user_id = ?1 ORDER BY deadline",
            params![user.0 as i64],
        )
    }

    fn set_plan_tasks(&self, plan_id: PlanId, tasks: &[TaskId]) -> StoreResult<()> {
        check_capacity(tasks.len())?;
        let conn = self.conn()?;

        let exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM plans WHERE id = ?1)",
                params![plan_id.0 as i64],
                |row| row.get(0),
            )
            .map_err(internal)?;
        if !exists {
            return Err(AppError::NotFound(format!("Plan {} not found!", plan_id.0)));
        }

        Self::write_plan_tasks(&conn, plan_id, tasks)
    }

    fn delete_plans_for_user(&self, user: UserId) -> StoreResult<u64> {
        let rows = self
            .conn()?
            .execute("DELETE FROM plans WHERE user_id = ?1", params![user.0 as i64])
            .map_err(internal)?;
        Ok(rows as u64)
    }

    fn delete_expired_plans(&self, today: NaiveDate) -> StoreResult<u64> {
        // ISO dates compare correctly as text
        let rows = self
            .conn()?
            .execute(
                "DELETE FROM plans WHERE deadline < ?1",
                params![today.to_string()],
            )
            .map_err(internal)?;
        Ok(rows as u64)
    }
}

impl PointStore for SqliteStore {
    fn find_points(&self, user: UserId) -> StoreResult<Option<u64>> {
        self.conn()?
            .query_row(
                "SELECT points FROM points WHERE user_id = ?1",
                params![user.0 as i64],
                |row| row.get::<_, i64>(0).map(|p| p as u64),
            )
            .optional()
            .map_err(internal)
    }

    fn init_points(&self, user: UserId) -> StoreResult<()> {
        self.conn()?
            .execute(
                "INSERT OR IGNORE INTO points (user_id, points) VALUES (?1, 0)",
                params![user.0 as i64],
            )
            .map_err(internal)?;
        Ok(())
    }

    fn add_points(&self, user: UserId, quantity: u64) -> StoreResult<u64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO points (user_id, points) VALUES (?1, ?2)
             ON CONFLICT(user_id) DO UPDATE SET points = points + excluded.points",
            params![user.0 as i64, quantity as i64],
        )
        .map_err(internal)?;

        conn.query_row(
            "SELECT points FROM points WHERE user_id = ?1",
            params![user.0 as i64],
            |row| row.get::<_, i64>(0).map(|p| p as u64),
        )
        .map_err(internal)
    }

    fn delete_points(&self, user: UserId) -> StoreResult<()> {
        self.conn()?
            .execute("DELETE FROM points WHERE user_id = ?1", params![user.0 as i64])
            .map_err(internal)?;
        Ok(())
    }
}

impl AchievementStore for SqliteStore {
    fn put_achievement_type(&self, def: &AchievementType) -> StoreResult<()> {
        let thresholds = serde_json::to_string(&def.thresholds)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        self.conn()?
            .execute(
                "INSERT INTO achievement_types (name, thresholds) VALUES (?1, ?2)
                 ON CONFLICT(name) DO UPDATE SET thresholds = excluded.thresholds",
                params![def.name, thresholds],
            )
            .map_err(internal)?;
        Ok(())
    }

    fn list_achievement_types(&self) -> StoreResult<Vec<AchievementType>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT name, thresholds FROM achievement_types ORDER BY name")
            .map_err(internal)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(internal)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(internal)?;

        rows.into_iter()
            .map(|(name, raw)| {
                let thresholds: Vec<u64> = serde_json::from_str(&raw)
                    .map_err(|e| AppError::Internal(format!("bad thresholds for {}: {}", name, e)))?;
                Ok(AchievementType { name, thresholds })
            })
            .collect()
    }

    fn get_progress(&self, user: UserId, name: &str) -> StoreResult<u64> {
        let progress: Option<i64> = self
            .conn()?
            .query_row(
                "SELECT progress FROM achievement_progress WHERE user_id = ?1 AND name = ?2",
                params![user.0 as i64, name],
                |row| row.get(0),
            )
            .optional()
            .map_err(internal)?;
        Ok(progress.unwrap_or(0) as u64)
    }

    fn add_progress(&self, user: UserId, name: &str, delta: u64) -> StoreResult<u64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO achievement_progress (user_id, name, progress) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id, name) DO UPDATE SET progress = progress + excluded.progress",
            params![user.0 as i64, name, delta as i64],
        )
        .map_err(internal)?;

        conn.query_row(
            "SELECT progress FROM achievement_progress WHERE user_id = ?1 AND name = ?2",
            params![user.0 as i64, name],
            |row| row.get::<_, i64>(0).map(|p| p as u64),
        )
        .map_err(internal)
    }

    fn delete_user_progress(&self, user: UserId) -> StoreResult<u64> {
        let rows = self
            .conn()?
            .execute(
                "DELETE FROM achievement_progress WHERE user_id = ?1",
                params![user.0 as i64],
            )
            .map_err(internal)?;
        Ok(rows as u64)
    }
}
