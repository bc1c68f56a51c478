//! `taskbot`: chat-command task list with an AI coach.
//!
//! Inbound text flows through the command parser (in `taskbot-proto`), is
//! executed by [`bot::TaskBot`] against the per-owner task lists in
//! [`tasks`], and comes back as reply text from [`reply`].

pub mod assistant;
pub mod bot;
pub mod clock;
pub mod config;
pub mod confirm;
pub mod error;
pub mod reminder;
pub mod reply;
pub mod sink;
pub mod store;
pub mod tasks;

pub use bot::{BotSettings, Outcome, TaskBot};
pub use error::{ErrorKind, TaskBotError};
