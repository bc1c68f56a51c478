//! Deterministic, indexed views over an owner's tasks.
//!
//! A [`ProjectedView`] is built fresh for every command and is the only
//! place the user-visible task numbers come from. It is deliberately not
//! `Clone`: holding on to one across commands is how stale indices happen.

use chrono::{DateTime, Utc};
use taskbot_proto::task::Task;

use crate::clock::Calendar;
use crate::store::TaskFilter;

/// Which slice of an owner's history a view covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// All pending tasks plus tasks completed and created today.
    Current,
    /// Tasks created yesterday, any status.
    Previous,
}

impl Scope {
    /// The store filter selecting this scope's candidates at `now`.
    #[must_use]
    pub fn filter(self, calendar: &Calendar, now: DateTime<Utc>) -> TaskFilter {
        match self {
            Self::Current => TaskFilter::Current(calendar.day_containing(now)),
            Self::Previous => TaskFilter::CreatedWithin(calendar.day_before(now)),
        }
    }
}

/// One row of a view.
#[derive(Debug, PartialEq, Eq)]
pub struct ProjectedTask {
    /// Position shown to the user, valid only against the view it came from.
    pub index: usize,
    /// The stored task.
    pub task: Task,
}

/// An ordered, numbered snapshot of tasks.
#[derive(Debug, PartialEq, Eq)]
pub struct ProjectedView {
    scope: Scope,
    entries: Vec<ProjectedTask>,
}

impl ProjectedView {
    /// Orders `tasks` (given in creation order) for display.
    ///
    /// Pending before completed, then most urgent first. The sort is
    /// stable, so equal keys keep creation order.
    #[must_use]
    pub fn project(scope: Scope, mut tasks: Vec<Task>) -> Self {
        tasks.sort_by_key(|t| (t.status.rank(), t.priority));
        let entries = tasks
            .into_iter()
            .enumerate()
            .map(|(index, task)| ProjectedTask { index, task })
            .collect();
        Self { scope, entries }
    }

    /// The scope this view was built for.
    #[must_use]
    pub const fn scope(&self) -> Scope {
        self.scope
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the view has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entry at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ProjectedTask> {
        self.entries.get(index)
    }

    /// All entries in display order.
    pub fn iter(&self) -> impl Iterator<Item = &ProjectedTask> {
        self.entries.iter()
    }

    /// Entries that are still pending.
    pub fn pending(&self) -> impl Iterator<Item = &ProjectedTask> {
        self.entries.iter().filter(|e| e.task.is_pending())
    }

    /// Entries that are completed.
    pub fn completed(&self) -> impl Iterator<Item = &ProjectedTask> {
        self.entries.iter().filter(|e| !e.task.is_pending())
    }
}
