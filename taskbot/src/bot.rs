//! Command dispatch: parse, execute, reply.

use std::time::Duration;

use taskbot_proto::command::{self, Command};
use taskbot_proto::task::{OwnerId, Task, TaskPatch};

use crate::assistant::{Assistant, prompt};
use crate::confirm::{Confirmation, ConfirmationRegistry, DEFAULT_CONFIRMATION_WINDOW};
use crate::error::{ErrorKind, Result, TaskBotError, op};
use crate::reply;
use crate::store::TaskStore;
use crate::tasks::{ProjectedView, Scope, TaskService};

/// Default bound on a single assistant call.
pub const DEFAULT_ASSISTANT_TIMEOUT: Duration = Duration::from_secs(30);

/// Tunables for [`TaskBot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BotSettings {
    /// How long `reset all` stays confirmable.
    pub confirmation_window: Duration,
    /// Bound on one assistant call.
    pub assistant_timeout: Duration,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            confirmation_window: DEFAULT_CONFIRMATION_WINDOW,
            assistant_timeout: DEFAULT_ASSISTANT_TIMEOUT,
        }
    }
}

/// What a successful command did.
#[derive(Debug)]
pub enum Outcome {
    /// A task was created.
    Added(Task),
    /// The current view.
    Listed(ProjectedView),
    /// A task was completed; `remaining` is the fresh view, if it loaded.
    Completed {
        /// The completed task.
        task: Task,
        /// View after the update.
        remaining: Option<ProjectedView>,
    },
    /// A task was removed.
    Deleted(Task),
    /// A task was updated.
    Edited(Task),
    /// Today's tasks were removed.
    ResetToday(usize),
    /// A full reset is waiting for confirmation.
    ResetArmed {
        /// How long the confirmation stays valid.
        window: Duration,
    },
    /// Every task of the owner was removed.
    ResetAll(usize),
    /// The assistant's answer.
    Chat(String),
    /// Usage text.
    Help,
    /// Not a command; say nothing.
    Silent,
}

/// The bot: one per process, shared by every inbound message.
pub struct TaskBot<S, A> {
    tasks: TaskService<S>,
    confirmations: ConfirmationRegistry,
    assistant: A,
    settings: BotSettings,
}

impl<S, A> std::fmt::Debug for TaskBot<S, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskBot")
            .field("tasks", &self.tasks)
            .field("confirmations", &self.confirmations)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl<S: TaskStore, A: Assistant> TaskBot<S, A> {
    /// Wires the bot from its collaborators.
    #[must_use]
    pub const fn new(
        tasks: TaskService<S>,
        confirmations: ConfirmationRegistry,
        assistant: A,
        settings: BotSettings,
    ) -> Self {
        Self {
            tasks,
            confirmations,
            assistant,
            settings,
        }
    }

    /// The task service.
    pub const fn tasks(&self) -> &TaskService<S> {
        &self.tasks
    }

    /// The confirmation registry.
    pub const fn confirmations(&self) -> &ConfirmationRegistry {
        &self.confirmations
    }

    /// The assistant collaborator.
    pub const fn assistant(&self) -> &A {
        &self.assistant
    }

    /// Handles one chat message from `owner`.
    ///
    /// Returns `None` for text that is not a command, otherwise the reply
    /// (which may describe a failure).
    pub async fn handle(&self, owner: &OwnerId, text: &str) -> Option<String> {
        let command = match command::parse(text) {
            Ok(command) => command,
            Err(source) => {
                let err = TaskBotError::Validation {
                    op: op::PARSE,
                    source,
                };
                tracing::debug!(owner = %owner, error = %err, "rejected command");
                return Some(reply::render_error(&err));
            }
        };
        tracing::debug!(owner = %owner, ?command, mutating = command.is_mutating(), "handling command");
        match self.execute(owner, command).await {
            Ok(Outcome::Silent) => None,
            Ok(outcome) => Some(reply::render(&outcome)),
            Err(err) => {
                log_failure(owner, &err);
                Some(reply::render_error(&err))
            }
        }
    }

    /// Runs a parsed command.
    ///
    /// # Errors
    ///
    /// Returns the [`TaskBotError`] of whichever step failed.
    pub async fn execute(&self, owner: &OwnerId, command: Command) -> Result<Outcome> {
        match command {
            Command::Add { title, priority } => {
                self.tasks.add(owner, title, priority).await.map(Outcome::Added)
            }
            Command::List => self
                .tasks
                .view(owner, Scope::Current)
                .await
                .map(Outcome::Listed),
            Command::Complete { index } => {
                let task = self.tasks.complete(owner, index).await?;
                let remaining = match self.tasks.view_as(op::COMPLETE_TASK, owner, Scope::Current).await {
                    Ok(view) => Some(view),
                    Err(err) => {
                        tracing::warn!(owner = %owner, error = %err, "could not load remaining tasks");
                        None
                    }
                };
                Ok(Outcome::Completed { task, remaining })
            }
            Command::Delete { index } => self.tasks.delete(owner, index).await.map(Outcome::Deleted),
            Command::Edit {
                index,
                title,
                priority,
            } => self
                .tasks
                .edit(owner, index, TaskPatch { title, priority })
                .await
                .map(Outcome::Edited),
            Command::Chat { text } => self.chat(owner, &text).await.map(Outcome::Chat),
            Command::ResetToday => self.tasks.reset_today(owner).await.map(Outcome::ResetToday),
            Command::ResetAll => {
                let window = self.settings.confirmation_window;
                self.confirmations.arm(owner, window);
                tracing::info!(owner = %owner, op = op::RESET_ALL, "full reset requested");
                Ok(Outcome::ResetArmed { window })
            }
            Command::Confirm => match self.confirmations.consume(owner) {
                Confirmation::Confirmed(auth) => {
                    self.tasks.reset_all(auth).await.map(Outcome::ResetAll)
                }
                Confirmation::Expired => Err(TaskBotError::ConfirmationExpired {
                    op: op::CONFIRM_RESET,
                }),
            },
            Command::Help => Ok(Outcome::Help),
            Command::Unrecognized => Ok(Outcome::Silent),
        }
    }

    async fn chat(&self, owner: &OwnerId, text: &str) -> Result<String> {
        let context = self.tasks.chat_context(owner).await?;
        let prompt = prompt::chat_prompt(&context.pending, &context.completed, text);
        self.ask(op::CHAT, &prompt).await
    }

    /// Sends `prompt` to the assistant under the configured timeout.
    pub(crate) async fn ask(&self, op: &'static str, prompt: &str) -> Result<String> {
        let after = self.settings.assistant_timeout;
        match tokio::time::timeout(after, self.assistant.complete(prompt)).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(source)) => Err(TaskBotError::Assistant { op, source }),
            Err(_) => Err(TaskBotError::Timeout {
                op,
                what: "assistant",
                after,
            }),
        }
    }
}

fn log_failure(owner: &OwnerId, err: &TaskBotError) {
    match err.kind() {
        ErrorKind::Upstream => {
            let cause = std::error::Error::source(err).map(ToString::to_string);
            tracing::error!(owner = %owner, op = err.op(), error = %err, cause = ?cause, "command failed");
        }
        _ => tracing::debug!(owner = %owner, op = err.op(), error = %err, "command rejected"),
    }
}
