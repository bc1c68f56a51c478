//! Top-level error type for bot operations.
//!
//! Every failure names the operation that produced it (`"AddTask"`,
//! `"CompleteTask"`, ...). Nested causes stay reachable through
//! [`std::error::Error::source`], so logs can print the full chain while the
//! reply composer only looks at [`TaskBotError::kind`].

use std::time::Duration;

use taskbot_proto::command::ParseError;

use crate::assistant::AssistantError;
use crate::store::StoreError;

/// Operation names carried by [`TaskBotError`] and log events.
pub mod op {
    pub const ADD_TASK: &str = "AddTask";
    pub const LIST_TASKS: &str = "ListTasks";
    pub const COMPLETE_TASK: &str = "CompleteTask";
    pub const DELETE_TASK: &str = "DeleteTask";
    pub const EDIT_TASK: &str = "EditTask";
    pub const RESET_TODAY: &str = "ResetToday";
    pub const RESET_ALL: &str = "ResetAll";
    pub const CONFIRM_RESET: &str = "ConfirmReset";
    pub const CHAT: &str = "Chat";
    pub const DAILY_REMINDER: &str = "DailyReminder";
    pub const PARSE: &str = "ParseCommand";
}

/// Coarse category used to pick a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The user typed something malformed.
    Validation,
    /// The referenced task or task list does not exist.
    NotFound,
    /// A confirmation was missing or arrived too late.
    ConfirmationExpired,
    /// Storage or the assistant failed.
    Upstream,
}

/// Why a lookup came up empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum NotFoundReason {
    /// The owner has no tasks in the current view.
    #[error("no tasks registered")]
    NoTasks,
    /// The index is past the end of the view.
    #[error("no such task number: {index}")]
    NoSuchIndex {
        /// The index the user asked for.
        index: usize,
    },
    /// The task disappeared between lookup and mutation.
    #[error("task no longer exists")]
    Vanished,
}

/// Errors produced while handling a command.
#[derive(Debug, thiserror::Error)]
pub enum TaskBotError {
    /// Malformed command.
    #[error("[{op}] {source}")]
    Validation {
        /// Operation name.
        op: &'static str,
        /// Parser diagnosis.
        #[source]
        source: ParseError,
    },

    /// Nothing to act on.
    #[error("[{op}] {reason}")]
    NotFound {
        /// Operation name.
        op: &'static str,
        /// What was missing.
        reason: NotFoundReason,
    },

    /// `confirm reset` without a live confirmation.
    #[error("[{op}] confirmation expired or missing")]
    ConfirmationExpired {
        /// Operation name.
        op: &'static str,
    },

    /// The task store failed.
    #[error("[{op}] {source}")]
    Store {
        /// Operation name.
        op: &'static str,
        /// Backend failure.
        #[source]
        source: StoreError,
    },

    /// The assistant failed.
    #[error("[{op}] {source}")]
    Assistant {
        /// Operation name.
        op: &'static str,
        /// Client failure.
        #[source]
        source: AssistantError,
    },

    /// A collaborator did not answer in time.
    #[error("[{op}] {what} timed out after {after:?}")]
    Timeout {
        /// Operation name.
        op: &'static str,
        /// Which collaborator (`"store"`, `"assistant"`).
        what: &'static str,
        /// The bound that was exceeded.
        after: Duration,
    },
}

impl TaskBotError {
    /// Name of the operation that failed.
    #[must_use]
    pub const fn op(&self) -> &'static str {
        match self {
            Self::Validation { op, .. }
            | Self::NotFound { op, .. }
            | Self::ConfirmationExpired { op }
            | Self::Store { op, .. }
            | Self::Assistant { op, .. }
            | Self::Timeout { op, .. } => *op,
        }
    }

    /// Reply category for this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::ConfirmationExpired { .. } => ErrorKind::ConfirmationExpired,
            Self::Store { .. } | Self::Assistant { .. } | Self::Timeout { .. } => {
                ErrorKind::Upstream
            }
        }
    }

    /// Maps a store failure, turning a vanished id into [`Self::NotFound`].
    pub(crate) fn from_store(op: &'static str, source: StoreError) -> Self {
        match source {
            StoreError::NotFound(_) => Self::NotFound {
                op,
                reason: NotFoundReason::Vanished,
            },
            source => Self::Store { op, source },
        }
    }
}

/// Convenience alias for results in this crate.
pub type Result<T, E = TaskBotError> = std::result::Result<T, E>;
