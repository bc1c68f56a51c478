//! Task persistence.
//!
//! Defines the [`TaskStore`] trait the rest of the bot talks to, the
//! [`TaskFilter`] scopes it understands, and two implementations:
//! - [`memory::MemoryTaskStore`]: in-process store, the default and the
//!   one tests use
//! - [`sqlite::SqliteTaskStore`]: single-file durable store
//!
//! Stores return tasks in creation order. Ordering for display is the
//! projector's job, not the store's.

pub mod memory;
pub mod sqlite;

use std::path::PathBuf;

use taskbot_proto::task::{NewTask, OwnerId, Task, TaskId, TaskPatch, TaskStatus};

use crate::clock::Period;

pub use memory::MemoryTaskStore;
pub use sqlite::SqliteTaskStore;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The task does not exist (any more).
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The storage backend cannot be reached or opened.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A query or statement failed.
    #[error("query failed: {0}")]
    Query(String),

    /// A stored row could not be turned back into a task.
    #[error("corrupt task row: {0}")]
    Corrupt(String),
}

/// Which of an owner's tasks a query or bulk delete applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskFilter {
    /// Every pending task regardless of age, plus completed tasks created
    /// within the given day.
    Current(Period),
    /// Every task created within the given period, any status.
    CreatedWithin(Period),
    /// Every pending task.
    Pending,
    /// Completed tasks created within the given period.
    CompletedWithin(Period),
    /// Everything.
    All,
}

impl TaskFilter {
    /// Returns `true` if `task` falls inside this filter.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            Self::Current(day) => {
                task.status == TaskStatus::Pending || day.contains(task.created_at)
            }
            Self::CreatedWithin(period) => period.contains(task.created_at),
            Self::Pending => task.status == TaskStatus::Pending,
            Self::CompletedWithin(period) => {
                task.status == TaskStatus::Completed && period.contains(task.created_at)
            }
            Self::All => true,
        }
    }
}

/// Trait for persisting tasks.
///
/// Every mutation addresses exactly one task by [`TaskId`] or one owner's
/// tasks in bulk. A mutation by id on a task that no longer exists returns
/// [`StoreError::NotFound`] rather than silently succeeding.
pub trait TaskStore: Send + Sync {
    /// Store a new pending task and return it with its assigned id.
    fn insert(
        &self,
        task: NewTask,
    ) -> impl std::future::Future<Output = Result<Task, StoreError>> + Send;

    /// All of `owner`'s tasks matching `filter`, oldest first.
    fn select_by_owner(
        &self,
        owner: &OwnerId,
        filter: &TaskFilter,
    ) -> impl std::future::Future<Output = Result<Vec<Task>, StoreError>> + Send;

    /// Apply a partial update; fields absent from `patch` are untouched.
    fn update_fields(
        &self,
        id: &TaskId,
        patch: &TaskPatch,
    ) -> impl std::future::Future<Output = Result<Task, StoreError>> + Send;

    /// Change a task's status.
    fn set_status(
        &self,
        id: &TaskId,
        status: TaskStatus,
    ) -> impl std::future::Future<Output = Result<Task, StoreError>> + Send;

    /// Remove one task, returning what was removed.
    fn delete(
        &self,
        id: &TaskId,
    ) -> impl std::future::Future<Output = Result<Task, StoreError>> + Send;

    /// Remove `owner`'s tasks matching `filter`, returning how many went.
    fn delete_by_owner_and_filter(
        &self,
        owner: &OwnerId,
        filter: &TaskFilter,
    ) -> impl std::future::Future<Output = Result<usize, StoreError>> + Send;

    /// Remove every task `owner` ever created.
    fn delete_by_owner(
        &self,
        owner: &OwnerId,
    ) -> impl std::future::Future<Output = Result<usize, StoreError>> + Send {
        self.delete_by_owner_and_filter(owner, &TaskFilter::All)
    }

    /// Every owner that has at least one task.
    fn list_distinct_owners(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<OwnerId>, StoreError>> + Send;
}

/// Which backend to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    /// Keep everything in memory; lost on exit.
    Memory,
    /// SQLite database file at the given path.
    Sqlite(PathBuf),
}

/// A store chosen at startup from configuration.
pub enum AnyStore {
    /// In-memory backend.
    Memory(MemoryTaskStore),
    /// SQLite backend.
    Sqlite(SqliteTaskStore),
}

impl AnyStore {
    /// Opens the configured backend.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the SQLite file cannot be
    /// opened or its schema cannot be created.
    pub fn open(config: &StorageConfig) -> Result<Self, StoreError> {
        match config {
            StorageConfig::Memory => Ok(Self::Memory(MemoryTaskStore::new())),
            StorageConfig::Sqlite(path) => SqliteTaskStore::open(path).map(Self::Sqlite),
        }
    }
}

impl TaskStore for AnyStore {
    async fn insert(&self, task: NewTask) -> Result<Task, StoreError> {
        match self {
            Self::Memory(s) => s.insert(task).await,
            Self::Sqlite(s) => s.insert(task).await,
        }
    }

    async fn select_by_owner(
        &self,
        owner: &OwnerId,
        filter: &TaskFilter,
    ) -> Result<Vec<Task>, StoreError> {
        match self {
            Self::Memory(s) => s.select_by_owner(owner, filter).await,
            Self::Sqlite(s) => s.select_by_owner(owner, filter).await,
        }
    }

    async fn update_fields(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task, StoreError> {
        match self {
            Self::Memory(s) => s.update_fields(id, patch).await,
            Self::Sqlite(s) => s.update_fields(id, patch).await,
        }
    }

    async fn set_status(&self, id: &TaskId, status: TaskStatus) -> Result<Task, StoreError> {
        match self {
            Self::Memory(s) => s.set_status(id, status).await,
            Self::Sqlite(s) => s.set_status(id, status).await,
        }
    }

    async fn delete(&self, id: &TaskId) -> Result<Task, StoreError> {
        match self {
            Self::Memory(s) => s.delete(id).await,
            Self::Sqlite(s) => s.delete(id).await,
        }
    }

    async fn delete_by_owner_and_filter(
        &self,
        owner: &OwnerId,
        filter: &TaskFilter,
    ) -> Result<usize, StoreError> {
        match self {
            Self::Memory(s) => s.delete_by_owner_and_filter(owner, filter).await,
            Self::Sqlite(s) => s.delete_by_owner_and_filter(owner, filter).await,
        }
    }

    async fn list_distinct_owners(&self) -> Result<Vec<OwnerId>, StoreError> {
        match self {
            Self::Memory(s) => s.list_distinct_owners().await,
            Self::Sqlite(s) => s.list_distinct_owners().await,
        }
    }
}
