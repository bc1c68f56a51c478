//! User-facing reply text.
//!
//! Pure formatting: nothing here touches storage or the clock.

use std::fmt::Write as _;
use std::time::Duration;

use taskbot_proto::command::{COMMAND_PREFIX, Verb};
use taskbot_proto::task::Task;

use crate::bot::Outcome;
use crate::error::{ErrorKind, NotFoundReason, TaskBotError};
use crate::tasks::{ProjectedTask, ProjectedView};

const PENDING_MARK: &str = "⌛";
const COMPLETED_MARK: &str = "✅";

/// One view row: `⌛ [0] Buy milk (P1)`.
#[must_use]
pub fn entry_line(entry: &ProjectedTask) -> String {
    let mark = if entry.task.is_pending() {
        PENDING_MARK
    } else {
        COMPLETED_MARK
    };
    format!(
        "{mark} [{}] {} ({})",
        entry.index, entry.task.title, entry.task.priority
    )
}

fn task_label(task: &Task) -> String {
    format!("{} ({})", task.title, task.priority)
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "task" } else { "tasks" }
}

fn describe_window(window: Duration) -> String {
    let secs = window.as_secs();
    if secs >= 60 && secs % 60 == 0 {
        let minutes = secs / 60;
        format!("{minutes} minute{}", if minutes == 1 { "" } else { "s" })
    } else {
        format!("{secs} seconds")
    }
}

fn render_view(view: &ProjectedView) -> String {
    if view.is_empty() {
        return "📭 No tasks registered.".to_string();
    }
    let mut out = String::from("Today's tasks:\n");
    for entry in view.iter() {
        let _ = writeln!(out, "{}", entry_line(entry));
    }
    out.truncate(out.trim_end().len());
    out
}

fn render_remaining(out: &mut String, remaining: Option<&ProjectedView>) {
    match remaining {
        None => out.push_str("⚠️ Could not load the remaining tasks."),
        Some(view) if view.pending().next().is_none() => {
            out.push_str("🎉 Nothing left to do. Great work today!");
        }
        Some(view) => {
            out.push_str("📝 Remaining:");
            for entry in view.pending() {
                out.push('\n');
                out.push_str(&entry_line(entry));
            }
        }
    }
}

/// Usage text listing every verb.
#[must_use]
pub fn help_text() -> String {
    let mut out = String::from("Commands:\n");
    for verb in Verb::ALL {
        let args = verb.arguments();
        let usage = if args.is_empty() {
            format!("{COMMAND_PREFIX}{verb}")
        } else {
            format!("{COMMAND_PREFIX}{verb} {args}")
        };
        let _ = writeln!(out, "{usage:<34} {}", verb.summary());
    }
    out.truncate(out.trim_end().len());
    out
}

/// Reply for a successful command.
#[must_use]
pub fn render(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Added(task) => format!("⭕ Added: {}", task_label(task)),
        Outcome::Listed(view) => render_view(view),
        Outcome::Completed { task, remaining } => {
            let mut out = format!("✅ Done: {}\n", task.title);
            render_remaining(&mut out, remaining.as_ref());
            out
        }
        Outcome::Deleted(task) => format!("🗑️ Deleted: {}", task_label(task)),
        Outcome::Edited(task) => format!("✏️ Updated: {}", task_label(task)),
        Outcome::ResetToday(count) => {
            format!("✅ Deleted {count} {} added today.", plural(*count))
        }
        Outcome::ResetArmed { window } => format!(
            "⚠️ Really delete every task, including past ones?\n\
             Type '{COMMAND_PREFIX}{}' within {} to confirm.",
            Verb::ConfirmReset,
            describe_window(*window)
        ),
        Outcome::ResetAll(count) => format!("✅ Deleted all {count} {}.", plural(*count)),
        Outcome::Chat(reply) => reply.clone(),
        Outcome::Help => help_text(),
        Outcome::Silent => String::new(),
    }
}

/// Reply for a failed command.
///
/// Upstream failures get a generic apology; the details belong in the log.
#[must_use]
pub fn render_error(err: &TaskBotError) -> String {
    match (err.kind(), err) {
        (ErrorKind::Validation, TaskBotError::Validation { source, .. }) => format!("⚠️ {source}"),
        (ErrorKind::NotFound, TaskBotError::NotFound { reason, .. }) => match reason {
            NotFoundReason::NoTasks => "📭 No tasks registered.".to_string(),
            NotFoundReason::NoSuchIndex { index } => format!("❌ There is no task number {index}."),
            NotFoundReason::Vanished => "❌ That task no longer exists.".to_string(),
        },
        (ErrorKind::ConfirmationExpired, _) => format!(
            "⚠️ The '{COMMAND_PREFIX}{}' confirmation has expired or was never requested. Run it again.",
            Verb::ResetAll
        ),
        _ => "❌ Something went wrong. Please try again later.".to_string(),
    }
}
