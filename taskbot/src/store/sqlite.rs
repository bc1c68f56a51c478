//! SQLite-backed task store.
//!
//! One connection behind a mutex; every call runs on the blocking pool so
//! the async executor never waits on disk. Rows carry an autoincrement
//! `seq` column so that creation order survives identical timestamps.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use taskbot_proto::task::{NewTask, OwnerId, Priority, Task, TaskId, TaskPatch, TaskStatus};
use uuid::Uuid;

use super::{StoreError, TaskFilter, TaskStore};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS tasks (
    seq           INTEGER PRIMARY KEY AUTOINCREMENT,
    id            TEXT NOT NULL UNIQUE,
    owner         TEXT NOT NULL,
    title         TEXT NOT NULL CHECK (length(title) > 0),
    priority      INTEGER NOT NULL CHECK (priority BETWEEN 1 AND 4),
    status        TEXT NOT NULL CHECK (status IN ('pending', 'completed')),
    created_at_ms INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS tasks_owner_created ON tasks (owner, created_at_ms);
";

const COLUMNS: &str = "id, owner, title, priority, status, created_at_ms";

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Query(err.to_string())
    }
}

/// Durable [`TaskStore`] in a single SQLite file.
#[derive(Clone)]
pub struct SqliteTaskStore {
    conn: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for SqliteTaskStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteTaskStore").finish_non_exhaustive()
    }
}

impl SqliteTaskStore {
    /// Opens (creating if needed) the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the file cannot be opened or
    /// the schema cannot be created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Unavailable(format!("cannot create {}: {e}", parent.display()))
            })?;
        }
        let conn = Connection::open(path)
            .map_err(|e| StoreError::Unavailable(format!("{}: {e}", path.display())))?;
        Self::with_connection(conn)
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the schema cannot be created.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| StoreError::Unavailable(format!("schema: {e}")))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn run<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock();
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("blocking task failed: {e}")))?
    }
}

/// A row as stored, before validation.
struct RawRow {
    id: String,
    owner: String,
    title: String,
    priority: i64,
    status: String,
    created_at_ms: i64,
}

impl RawRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            owner: row.get(1)?,
            title: row.get(2)?,
            priority: row.get(3)?,
            status: row.get(4)?,
            created_at_ms: row.get(5)?,
        })
    }

    fn into_task(self) -> Result<Task, StoreError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| StoreError::Corrupt(format!("id {:?}: {e}", self.id)))?;
        let priority = u8::try_from(self.priority)
            .ok()
            .and_then(Priority::from_level)
            .ok_or_else(|| StoreError::Corrupt(format!("priority {}", self.priority)))?;
        let status = TaskStatus::from_str_opt(&self.status)
            .ok_or_else(|| StoreError::Corrupt(format!("status {:?}", self.status)))?;
        let created_at = DateTime::<Utc>::from_timestamp_millis(self.created_at_ms)
            .ok_or_else(|| StoreError::Corrupt(format!("created_at {}", self.created_at_ms)))?;
        Ok(Task {
            id: TaskId::from_uuid(id),
            owner: OwnerId::new(self.owner),
            title: self.title,
            priority,
            status,
            created_at,
        })
    }
}

/// SQL condition and parameters equivalent to [`TaskFilter::matches`].
fn filter_clause(filter: &TaskFilter) -> (&'static str, Vec<Value>) {
    let range = |p: &crate::clock::Period| {
        vec![
            Value::Integer(p.start.timestamp_millis()),
            Value::Integer(p.end.timestamp_millis()),
        ]
    };
    match filter {
        TaskFilter::Current(day) => (
            "(status = 'pending' OR (created_at_ms >= ? AND created_at_ms < ?))",
            range(day),
        ),
        TaskFilter::CreatedWithin(period) => {
            ("created_at_ms >= ? AND created_at_ms < ?", range(period))
        }
        TaskFilter::Pending => ("status = 'pending'", Vec::new()),
        TaskFilter::CompletedWithin(period) => (
            "status = 'completed' AND created_at_ms >= ? AND created_at_ms < ?",
            range(period),
        ),
        TaskFilter::All => ("1 = 1", Vec::new()),
    }
}

fn fetch(conn: &Connection, id: &str) -> Result<Option<Task>, StoreError> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM tasks WHERE id = ?1"),
        [id],
        RawRow::from_row,
    )
    .optional()?
    .map(RawRow::into_task)
    .transpose()
}

impl TaskStore for SqliteTaskStore {
    async fn insert(&self, task: NewTask) -> Result<Task, StoreError> {
        let task = Task {
            id: TaskId::new(),
            owner: task.owner,
            title: task.title,
            priority: task.priority,
            status: TaskStatus::Pending,
            created_at: task.created_at,
        };
        let row = task.clone();
        self.run(move |conn| {
            conn.execute(
                &format!("INSERT INTO tasks ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"),
                params![
                    row.id.to_string(),
                    row.owner.as_str(),
                    row.title,
                    i64::from(row.priority.level()),
                    row.status.as_str(),
                    row.created_at.timestamp_millis(),
                ],
            )?;
            Ok(())
        })
        .await?;
        Ok(task)
    }

    async fn select_by_owner(
        &self,
        owner: &OwnerId,
        filter: &TaskFilter,
    ) -> Result<Vec<Task>, StoreError> {
        let (clause, mut values) = filter_clause(filter);
        values.insert(0, Value::Text(owner.as_str().to_string()));
        self.run(move |conn| {
            let sql = format!("SELECT {COLUMNS} FROM tasks WHERE owner = ? AND {clause} ORDER BY seq");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(values), RawRow::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows.into_iter().map(RawRow::into_task).collect()
        })
        .await
    }

    async fn update_fields(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task, StoreError> {
        let id = id.clone();
        let title = patch.title.clone();
        let priority = patch.priority.map(|p| i64::from(p.level()));
        self.run(move |conn| {
            let key = id.to_string();
            let changed = conn.execute(
                "UPDATE tasks SET title = COALESCE(?1, title), priority = COALESCE(?2, priority) \
                 WHERE id = ?3",
                params![title, priority, key],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound(id));
            }
            fetch(conn, &key)?.ok_or(StoreError::NotFound(id))
        })
        .await
    }

    async fn set_status(&self, id: &TaskId, status: TaskStatus) -> Result<Task, StoreError> {
        let id = id.clone();
        self.run(move |conn| {
            let key = id.to_string();
            let changed = conn.execute(
                "UPDATE tasks SET status = ?1 WHERE id = ?2",
                params![status.as_str(), key],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound(id));
            }
            fetch(conn, &key)?.ok_or(StoreError::NotFound(id))
        })
        .await
    }

    async fn delete(&self, id: &TaskId) -> Result<Task, StoreError> {
        let id = id.clone();
        self.run(move |conn| {
            let key = id.to_string();
            let tx = conn.transaction()?;
            let task = fetch(&tx, &key)?.ok_or_else(|| StoreError::NotFound(id.clone()))?;
            tx.execute("DELETE FROM tasks WHERE id = ?1", [&key])?;
            tx.commit()?;
            Ok(task)
        })
        .await
    }

    async fn delete_by_owner_and_filter(
        &self,
        owner: &OwnerId,
        filter: &TaskFilter,
    ) -> Result<usize, StoreError> {
        let (clause, mut values) = filter_clause(filter);
        values.insert(0, Value::Text(owner.as_str().to_string()));
        self.run(move |conn| {
            let sql = format!("DELETE FROM tasks WHERE owner = ? AND {clause}");
            Ok(conn.execute(&sql, params_from_iter(values))?)
        })
        .await
    }

    async fn list_distinct_owners(&self) -> Result<Vec<OwnerId>, StoreError> {
        self.run(|conn| {
            let mut stmt = conn.prepare("SELECT DISTINCT owner FROM tasks ORDER BY owner")?;
            let owners = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .map(|r| r.map(OwnerId::new))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(owners)
        })
        .await
    }
}
