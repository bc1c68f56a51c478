//! In-memory task store.
//!
//! Tasks live in a single `Vec` in insertion order, guarded by an async
//! [`RwLock`]. Nothing survives a restart.

use std::collections::BTreeSet;

use taskbot_proto::task::{NewTask, OwnerId, Task, TaskId, TaskPatch, TaskStatus};
use tokio::sync::RwLock;

use super::{StoreError, TaskFilter, TaskStore};

/// Volatile [`TaskStore`] backed by a `Vec`.
#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    tasks: RwLock<Vec<Task>>,
}

impl MemoryTaskStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of tasks across all owners.
    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    /// Returns `true` if no owner has any task.
    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }

    async fn modify<F>(&self, id: &TaskId, f: F) -> Result<Task, StoreError>
    where
        F: FnOnce(&mut Task) + Send,
    {
        let mut tasks = self.tasks.write().await;
        let task = tasks
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        f(task);
        Ok(task.clone())
    }
}

impl TaskStore for MemoryTaskStore {
    async fn insert(&self, task: NewTask) -> Result<Task, StoreError> {
        let task = Task {
            id: TaskId::new(),
            owner: task.owner,
            title: task.title,
            priority: task.priority,
            status: TaskStatus::Pending,
            created_at: task.created_at,
        };
        self.tasks.write().await.push(task.clone());
        Ok(task)
    }

    async fn select_by_owner(
        &self,
        owner: &OwnerId,
        filter: &TaskFilter,
    ) -> Result<Vec<Task>, StoreError> {
        let tasks = self.tasks.read().await;
        Ok(tasks
            .iter()
            .filter(|t| &t.owner == owner && filter.matches(t))
            .cloned()
            .collect())
    }

    async fn update_fields(&self, id: &TaskId, patch: &TaskPatch) -> Result<Task, StoreError> {
        self.modify(id, |task| patch.apply(task)).await
    }

    async fn set_status(&self, id: &TaskId, status: TaskStatus) -> Result<Task, StoreError> {
        self.modify(id, |task| task.status = status).await
    }

    async fn delete(&self, id: &TaskId) -> Result<Task, StoreError> {
        let mut tasks = self.tasks.write().await;
        let pos = tasks
            .iter()
            .position(|t| &t.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        Ok(tasks.remove(pos))
    }

    async fn delete_by_owner_and_filter(
        &self,
        owner: &OwnerId,
        filter: &TaskFilter,
    ) -> Result<usize, StoreError> {
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|t| !(&t.owner == owner && filter.matches(t)));
        Ok(before - tasks.len())
    }

    async fn list_distinct_owners(&self) -> Result<Vec<OwnerId>, StoreError> {
        let tasks = self.tasks.read().await;
        let owners: BTreeSet<&OwnerId> = tasks.iter().map(|t| &t.owner).collect();
        Ok(owners.into_iter().cloned().collect())
    }
}
