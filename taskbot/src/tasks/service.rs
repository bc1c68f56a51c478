//! Index resolution and task mutations.
//!
//! [`TaskService`] is the only component that turns a user-visible task
//! number into a stored [`TaskId`]. Every index-based mutation recomputes
//! the current view under the owner's gate, resolves the index against it,
//! and then mutates exactly that id.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use taskbot_proto::command::ParseError;
use taskbot_proto::task::{NewTask, OwnerId, Priority, Task, TaskId, TaskPatch, TaskStatus};

use super::gate::OwnerGates;
use super::projector::{ProjectedView, Scope};
use crate::clock::{Calendar, Clock};
use crate::confirm::ResetAuthorization;
use crate::error::{NotFoundReason, Result, TaskBotError, op};
use crate::store::{StoreError, TaskFilter, TaskStore};

/// Default bound on a single storage call.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// What the assistant is told about an owner's day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatContext {
    /// Every pending task, oldest first.
    pub pending: Vec<Task>,
    /// Tasks created and completed today, oldest first.
    pub completed: Vec<Task>,
}

/// Task operations for all owners over one store.
pub struct TaskService<S> {
    store: S,
    clock: Arc<dyn Clock>,
    calendar: Calendar,
    gates: OwnerGates,
    store_timeout: Duration,
}

impl<S> std::fmt::Debug for TaskService<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskService")
            .field("calendar", &self.calendar)
            .field("store_timeout", &self.store_timeout)
            .finish_non_exhaustive()
    }
}

impl<S: TaskStore> TaskService<S> {
    /// Creates a service over `store`.
    #[must_use]
    pub fn new(store: S, clock: Arc<dyn Clock>, calendar: Calendar) -> Self {
        Self {
            store,
            clock,
            calendar,
            gates: OwnerGates::new(),
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    /// Overrides the per-call storage timeout.
    #[must_use]
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// The underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The calendar used for day boundaries.
    pub const fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    /// The current instant according to the service clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Creates a pending task; a missing priority becomes `P4`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskBotError::Validation`] for an empty title, or an
    /// upstream error if the store fails.
    pub async fn add(
        &self,
        owner: &OwnerId,
        title: String,
        priority: Option<Priority>,
    ) -> Result<Task> {
        if title.trim().is_empty() {
            return Err(TaskBotError::Validation {
                op: op::ADD_TASK,
                source: ParseError::MissingTitle,
            });
        }
        let _gate = self.gates.lock(owner).await;
        let task = NewTask {
            owner: owner.clone(),
            title,
            priority: priority.unwrap_or_default(),
            created_at: self.clock.now(),
        };
        let task = self.call(op::ADD_TASK, self.store.insert(task)).await?;
        tracing::info!(owner = %owner, op = op::ADD_TASK, task_id = %task.id, priority = %task.priority, "task added");
        Ok(task)
    }

    /// The owner's tasks for `scope`, ordered and numbered.
    ///
    /// # Errors
    ///
    /// Returns an upstream error if the store fails.
    pub async fn view(&self, owner: &OwnerId, scope: Scope) -> Result<ProjectedView> {
        self.view_as(op::LIST_TASKS, owner, scope).await
    }

    /// Like [`Self::view`], attributing failures to `op`.
    pub(crate) async fn view_as(
        &self,
        op: &'static str,
        owner: &OwnerId,
        scope: Scope,
    ) -> Result<ProjectedView> {
        let filter = scope.filter(&self.calendar, self.clock.now());
        let tasks = self
            .call(op, self.store.select_by_owner(owner, &filter))
            .await?;
        Ok(ProjectedView::project(scope, tasks))
    }

    /// Marks the task at `index` of the current view completed.
    ///
    /// # Errors
    ///
    /// Returns [`TaskBotError::NotFound`] if the view is empty, the index is
    /// out of range, or the task vanished before the update.
    pub async fn complete(&self, owner: &OwnerId, index: usize) -> Result<Task> {
        let _gate = self.gates.lock(owner).await;
        let id = self.resolve(op::COMPLETE_TASK, owner, index).await?;
        let task = self
            .call(op::COMPLETE_TASK, self.store.set_status(&id, TaskStatus::Completed))
            .await?;
        tracing::info!(owner = %owner, op = op::COMPLETE_TASK, task_id = %task.id, "task completed");
        Ok(task)
    }

    /// Deletes the task at `index` of the current view.
    ///
    /// # Errors
    ///
    /// Same as [`Self::complete`].
    pub async fn delete(&self, owner: &OwnerId, index: usize) -> Result<Task> {
        let _gate = self.gates.lock(owner).await;
        let id = self.resolve(op::DELETE_TASK, owner, index).await?;
        let task = self.call(op::DELETE_TASK, self.store.delete(&id)).await?;
        tracing::info!(owner = %owner, op = op::DELETE_TASK, task_id = %task.id, "task deleted");
        Ok(task)
    }

    /// Applies `patch` to the task at `index` of the current view.
    ///
    /// Fields absent from the patch keep their stored values.
    ///
    /// # Errors
    ///
    /// Returns [`TaskBotError::Validation`] for an empty patch or a blank
    /// title, otherwise the same as [`Self::complete`].
    pub async fn edit(&self, owner: &OwnerId, index: usize, patch: TaskPatch) -> Result<Task> {
        if patch.is_empty() {
            return Err(TaskBotError::Validation {
                op: op::EDIT_TASK,
                source: ParseError::NothingToEdit,
            });
        }
        if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(TaskBotError::Validation {
                op: op::EDIT_TASK,
                source: ParseError::MissingTitle,
            });
        }
        let _gate = self.gates.lock(owner).await;
        let id = self.resolve(op::EDIT_TASK, owner, index).await?;
        let task = self
            .call(op::EDIT_TASK, self.store.update_fields(&id, &patch))
            .await?;
        tracing::info!(owner = %owner, op = op::EDIT_TASK, task_id = %task.id, "task edited");
        Ok(task)
    }

    /// Deletes every task the owner created today, returning the count.
    ///
    /// # Errors
    ///
    /// Returns an upstream error if the store fails.
    pub async fn reset_today(&self, owner: &OwnerId) -> Result<usize> {
        let _gate = self.gates.lock(owner).await;
        let today = self.calendar.day_containing(self.clock.now());
        let count = self
            .call(
                op::RESET_TODAY,
                self.store
                    .delete_by_owner_and_filter(owner, &TaskFilter::CreatedWithin(today)),
            )
            .await?;
        tracing::info!(owner = %owner, op = op::RESET_TODAY, count, "today's tasks reset");
        Ok(count)
    }

    /// Deletes every task of the authorized owner, returning the count.
    ///
    /// # Errors
    ///
    /// Returns an upstream error if the store fails.
    pub async fn reset_all(&self, authorization: ResetAuthorization) -> Result<usize> {
        let owner = authorization.owner();
        let _gate = self.gates.lock(owner).await;
        let count = self
            .call(op::RESET_ALL, self.store.delete_by_owner(owner))
            .await?;
        tracing::warn!(owner = %owner, op = op::RESET_ALL, count, "all tasks reset");
        Ok(count)
    }

    /// Pending tasks and today's completed tasks, for the assistant prompt.
    ///
    /// # Errors
    ///
    /// Returns an upstream error if the store fails.
    pub async fn chat_context(&self, owner: &OwnerId) -> Result<ChatContext> {
        let today = self.calendar.day_containing(self.clock.now());
        let pending = self
            .call(op::CHAT, self.store.select_by_owner(owner, &TaskFilter::Pending))
            .await?;
        let completed = self
            .call(
                op::CHAT,
                self.store
                    .select_by_owner(owner, &TaskFilter::CompletedWithin(today)),
            )
            .await?;
        Ok(ChatContext { pending, completed })
    }

    /// Every owner with at least one stored task.
    ///
    /// # Errors
    ///
    /// Returns an upstream error if the store fails.
    pub async fn owners(&self) -> Result<Vec<OwnerId>> {
        self.call(op::DAILY_REMINDER, self.store.list_distinct_owners())
            .await
    }

    /// Recomputes the current view and returns the id at `index`.
    async fn resolve(&self, op: &'static str, owner: &OwnerId, index: usize) -> Result<TaskId> {
        let view = self.view_as(op, owner, Scope::Current).await?;
        if view.is_empty() {
            return Err(TaskBotError::NotFound {
                op,
                reason: NotFoundReason::NoTasks,
            });
        }
        view.get(index)
            .map(|entry| entry.task.id.clone())
            .ok_or(TaskBotError::NotFound {
                op,
                reason: NotFoundReason::NoSuchIndex { index },
            })
    }

    /// Runs one storage call under the configured timeout.
    async fn call<T>(
        &self,
        op: &'static str,
        fut: impl Future<Output = std::result::Result<T, StoreError>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.store_timeout, fut).await {
            Ok(result) => result.map_err(|e| TaskBotError::from_store(op, e)),
            Err(_) => Err(TaskBotError::Timeout {
                op,
                what: "store",
                after: self.store_timeout,
            }),
        }
    }
}
