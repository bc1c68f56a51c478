//! Daily reminder: yesterday's tasks turned into a pep talk for every owner.
//!
//! Once per day at a configured local time the bot asks the assistant for
//! an encouraging plan, built from each owner's previous-day view, and
//! pushes it through a [`ReplySink`]. The owner id doubles as the
//! destination.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveTime, Utc};
use futures_util::future::join_all;
use taskbot_proto::task::OwnerId;
use tokio::sync::watch;

use crate::assistant::{Assistant, prompt};
use crate::bot::TaskBot;
use crate::clock::Calendar;
use crate::error::{Result, op};
use crate::sink::{ReplySink, deliver};
use crate::store::TaskStore;
use crate::tasks::Scope;

/// A reminder ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    /// Whose tasks it is about.
    pub owner: OwnerId,
    /// Where it goes.
    pub destination: String,
    /// Assistant-written text.
    pub text: String,
}

/// When reminders fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderSchedule {
    time: NaiveTime,
    calendar: Calendar,
}

impl ReminderSchedule {
    /// Fire daily at local wall time `time`.
    #[must_use]
    pub const fn daily_at(time: NaiveTime, calendar: Calendar) -> Self {
        Self { time, calendar }
    }

    /// The local wall time reminders fire at.
    #[must_use]
    pub const fn time(&self) -> NaiveTime {
        self.time
    }

    /// The next firing strictly after `now`.
    #[must_use]
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.calendar.next_local_time(now, self.time)
    }
}

impl<S: TaskStore, A: Assistant> TaskBot<S, A> {
    /// Builds the reminder for one owner.
    ///
    /// # Errors
    ///
    /// Returns an upstream error if the store or the assistant fails.
    pub async fn reminder_for(&self, owner: &OwnerId) -> Result<Reminder> {
        let yesterday = self
            .tasks()
            .view_as(op::DAILY_REMINDER, owner, Scope::Previous)
            .await?;
        let prompt = prompt::reminder_prompt(&yesterday);
        let text = self.ask(op::DAILY_REMINDER, &prompt).await?;
        Ok(Reminder {
            owner: owner.clone(),
            destination: owner.as_str().to_string(),
            text,
        })
    }

    /// Builds reminders for every owner with stored tasks.
    ///
    /// Owners whose reminder fails are logged and skipped.
    pub async fn daily_reminders(&self) -> Vec<Reminder> {
        let owners = match self.tasks().owners().await {
            Ok(owners) => owners,
            Err(err) => {
                tracing::error!(op = err.op(), error = %err, "could not list owners");
                return Vec::new();
            }
        };
        let mut pending = Vec::with_capacity(owners.len());
        for owner in &owners {
            pending.push(self.reminder_for(owner));
        }
        let results = join_all(pending).await;
        owners
            .iter()
            .zip(results)
            .filter_map(|(owner, result)| match result {
                Ok(reminder) => Some(reminder),
                Err(err) => {
                    tracing::warn!(owner = %owner, op = err.op(), error = %err, "reminder skipped");
                    None
                }
            })
            .collect()
    }
}

/// Builds and sends one round of reminders, returning how many were delivered.
pub async fn deliver_reminders<S, A, K>(bot: &TaskBot<S, A>, sink: &K) -> usize
where
    S: TaskStore,
    A: Assistant,
    K: ReplySink,
{
    let mut delivered = 0;
    for reminder in bot.daily_reminders().await {
        if deliver(sink, &reminder.destination, &reminder.text).await {
            delivered += 1;
        }
    }
    tracing::info!(delivered, "daily reminders sent");
    delivered
}

/// Sends reminders on `schedule` until `shutdown` flips to `true`.
pub async fn run<S, A, K>(
    bot: Arc<TaskBot<S, A>>,
    sink: K,
    schedule: ReminderSchedule,
    mut shutdown: watch::Receiver<bool>,
) where
    S: TaskStore,
    A: Assistant,
    K: ReplySink,
{
    tracing::info!(at = %schedule.time(), "reminder loop started");
    loop {
        let now = bot.tasks().now();
        let next = schedule.next_after(now);
        let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
        tracing::debug!(next = %next, "next reminder scheduled");
        tokio::select! {
            () = tokio::time::sleep(wait) => {
                deliver_reminders(&bot, &sink).await;
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
    tracing::info!("reminder loop stopped");
}
