//! Command grammar: free text in, [`Command`] out.
//!
//! Commands start with [`COMMAND_PREFIX`] followed by a verb from
//! [`Verb::ALL`]. Verbs are tried in table order, so the multi-word verbs
//! (`reset all`, `confirm reset`) are matched before `reset`. A verb must be
//! followed by whitespace or the end of input: `!listing` is not `!list`.
//!
//! Parsing is pure. It rejects malformed arguments with a [`ParseError`]
//! but never judges whether an index points at a real task.

use std::fmt;

use crate::task::{MAX_TASK_TITLE_LENGTH, Priority};

/// Character every command starts with.
pub const COMMAND_PREFIX: char = '!';

/// Command verbs, in matching order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    /// `reset all`: arm the full-history reset.
    ResetAll,
    /// `confirm reset`: confirm the full-history reset.
    ConfirmReset,
    /// `reset`: delete today's tasks.
    Reset,
    /// `add`: create a task.
    Add,
    /// `list`: show the current view.
    List,
    /// `done`: complete a task.
    Done,
    /// `delete`: remove a task.
    Delete,
    /// `edit`: change a task's title and/or priority.
    Edit,
    /// `chat`: talk to the assistant.
    Chat,
    /// `help`: usage text.
    Help,
}

impl Verb {
    /// Every verb, longest overlapping phrases first.
    pub const ALL: [Self; 10] = [
        Self::ResetAll,
        Self::ConfirmReset,
        Self::Reset,
        Self::Add,
        Self::List,
        Self::Done,
        Self::Delete,
        Self::Edit,
        Self::Chat,
        Self::Help,
    ];

    /// The words making up this verb.
    #[must_use]
    pub const fn words(self) -> &'static [&'static str] {
        match self {
            Self::ResetAll => &["reset", "all"],
            Self::ConfirmReset => &["confirm", "reset"],
            Self::Reset => &["reset"],
            Self::Add => &["add"],
            Self::List => &["list"],
            Self::Done => &["done"],
            Self::Delete => &["delete"],
            Self::Edit => &["edit"],
            Self::Chat => &["chat"],
            Self::Help => &["help"],
        }
    }

    /// The verb as typed by a user, without the prefix.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::ResetAll => "reset all",
            Self::ConfirmReset => "confirm reset",
            Self::Reset => "reset",
            Self::Add => "add",
            Self::List => "list",
            Self::Done => "done",
            Self::Delete => "delete",
            Self::Edit => "edit",
            Self::Chat => "chat",
            Self::Help => "help",
        }
    }

    /// Argument shape for usage text.
    #[must_use]
    pub const fn arguments(self) -> &'static str {
        match self {
            Self::Add => "<title> [P1-P4]",
            Self::Done | Self::Delete => "<number>",
            Self::Edit => "<number> [<title>] [P1-P4]",
            Self::Chat => "<message>",
            Self::ResetAll | Self::ConfirmReset | Self::Reset | Self::List | Self::Help => "",
        }
    }

    /// One-line description for usage text.
    #[must_use]
    pub const fn summary(self) -> &'static str {
        match self {
            Self::Add => "add a task (default priority P4)",
            Self::List => "show today's tasks",
            Self::Done => "mark a task as done",
            Self::Delete => "delete a task",
            Self::Edit => "change a task's title and/or priority",
            Self::Chat => "ask the coach, with your tasks as context",
            Self::Reset => "delete the tasks added today",
            Self::ResetAll => "delete every task you ever added (asks for confirmation)",
            Self::ConfirmReset => "confirm a pending reset all",
            Self::Help => "show this help",
        }
    }

    /// Strips this verb from the front of `body`, returning the trimmed rest.
    fn strip_from(self, body: &str) -> Option<&str> {
        let mut rest = body;
        for (i, word) in self.words().iter().enumerate() {
            if i > 0 {
                let trimmed = rest.trim_start();
                if trimmed.len() == rest.len() {
                    return None;
                }
                rest = trimmed;
            }
            let head = rest.get(..word.len())?;
            if !head.eq_ignore_ascii_case(word) {
                return None;
            }
            rest = &rest[word.len()..];
        }
        if rest.is_empty() || rest.starts_with(char::is_whitespace) {
            Some(rest.trim())
        } else {
            None
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A parsed command.
///
/// Optional fields mean "not specified": `priority: None` on [`Command::Add`]
/// is defaulted to [`Priority::P4`] at creation time, and on
/// [`Command::Edit`] it leaves the stored priority alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create a pending task.
    Add {
        /// Task title.
        title: String,
        /// Explicit priority, if one was given.
        priority: Option<Priority>,
    },
    /// Render the current view.
    List,
    /// Mark the task at `index` as completed.
    Complete {
        /// Position in the current view.
        index: usize,
    },
    /// Delete the task at `index`.
    Delete {
        /// Position in the current view.
        index: usize,
    },
    /// Partially update the task at `index`.
    Edit {
        /// Position in the current view.
        index: usize,
        /// New title, if any words were given.
        title: Option<String>,
        /// New priority, if a trailing code was given.
        priority: Option<Priority>,
    },
    /// Free text for the assistant.
    Chat {
        /// What the user said.
        text: String,
    },
    /// Delete the tasks created today.
    ResetToday,
    /// Arm the full-history reset.
    ResetAll,
    /// Confirm the full-history reset.
    Confirm,
    /// Show usage text.
    Help,
    /// Not a command.
    Unrecognized,
}

impl Command {
    /// Returns `true` if running this command changes stored tasks.
    #[must_use]
    pub const fn is_mutating(&self) -> bool {
        matches!(
            self,
            Self::Add { .. }
                | Self::Complete { .. }
                | Self::Delete { .. }
                | Self::Edit { .. }
                | Self::ResetToday
                | Self::Confirm
        )
    }
}

/// Why a command could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// `add` had no title words.
    #[error("no content: write a title after !add")]
    MissingTitle,
    /// The title is longer than [`MAX_TASK_TITLE_LENGTH`].
    #[error("task title too long (max {max} characters)")]
    TitleTooLong {
        /// Character limit.
        max: usize,
    },
    /// No task number was given.
    #[error("!{verb} needs a task number")]
    MissingIndex {
        /// The command missing its index.
        verb: Verb,
    },
    /// The task number is not a non-negative integer.
    #[error("!{verb} needs a task number, got {token:?}")]
    InvalidIndex {
        /// The command being parsed.
        verb: Verb,
        /// What the user typed instead.
        token: String,
    },
    /// `done`/`delete` got more than one argument.
    #[error("!{verb} takes exactly one task number")]
    TooManyArguments {
        /// The command being parsed.
        verb: Verb,
    },
    /// `edit` had an index but nothing to change.
    #[error("!edit needs a task number followed by a new title and/or priority")]
    NothingToEdit,
    /// `chat` had no text.
    #[error("write a message after !chat")]
    EmptyChat,
    /// A command that takes no arguments got some.
    #[error("!{verb} takes no arguments")]
    UnexpectedArguments {
        /// The command being parsed.
        verb: Verb,
    },
}

/// Parses one line of user input.
///
/// Input that does not start with [`COMMAND_PREFIX`] followed by a known
/// verb is [`Command::Unrecognized`], not an error.
///
/// # Errors
///
/// Returns a [`ParseError`] when a known verb has malformed arguments.
pub fn parse(input: &str) -> Result<Command, ParseError> {
    let Some(body) = input.trim().strip_prefix(COMMAND_PREFIX) else {
        return Ok(Command::Unrecognized);
    };
    let Some((verb, rest)) = Verb::ALL
        .into_iter()
        .find_map(|verb| verb.strip_from(body).map(|rest| (verb, rest)))
    else {
        return Ok(Command::Unrecognized);
    };

    match verb {
        Verb::Add => parse_add(rest),
        Verb::List => Ok(Command::List),
        Verb::Help => Ok(Command::Help),
        Verb::ConfirmReset => Ok(Command::Confirm),
        Verb::Reset => no_arguments(verb, rest).map(|()| Command::ResetToday),
        Verb::ResetAll => no_arguments(verb, rest).map(|()| Command::ResetAll),
        Verb::Done => single_index(verb, rest).map(|index| Command::Complete { index }),
        Verb::Delete => single_index(verb, rest).map(|index| Command::Delete { index }),
        Verb::Edit => parse_edit(rest),
        Verb::Chat => {
            if rest.is_empty() {
                Err(ParseError::EmptyChat)
            } else {
                Ok(Command::Chat {
                    text: rest.to_string(),
                })
            }
        }
    }
}

/// Pops a trailing priority code off `tokens`, if there is one.
///
/// Only the last token is considered, so `fix P2 bug` keeps `P2` in the
/// title.
#[must_use]
pub fn split_priority<'a>(mut tokens: Vec<&'a str>) -> (Vec<&'a str>, Option<Priority>) {
    let priority = tokens.last().and_then(|last| Priority::from_code(last));
    if priority.is_some() {
        tokens.pop();
    }
    (tokens, priority)
}

fn parse_add(rest: &str) -> Result<Command, ParseError> {
    let (words, priority) = split_priority(rest.split_whitespace().collect());
    let title = join_title(&words)?.ok_or(ParseError::MissingTitle)?;
    Ok(Command::Add { title, priority })
}

fn parse_edit(rest: &str) -> Result<Command, ParseError> {
    let tokens: Vec<&str> = rest.split_whitespace().collect();
    match tokens.as_slice() {
        [] => Err(ParseError::MissingIndex { verb: Verb::Edit }),
        [_] => Err(ParseError::NothingToEdit),
        [first, changes @ ..] => {
            let index = parse_index(Verb::Edit, first)?;
            let (words, priority) = split_priority(changes.to_vec());
            let title = join_title(&words)?;
            Ok(Command::Edit {
                index,
                title,
                priority,
            })
        }
    }
}

/// Rejoins title words with single spaces; `None` when there are none.
fn join_title(words: &[&str]) -> Result<Option<String>, ParseError> {
    if words.is_empty() {
        return Ok(None);
    }
    let title = words.join(" ");
    if title.chars().count() > MAX_TASK_TITLE_LENGTH {
        return Err(ParseError::TitleTooLong {
            max: MAX_TASK_TITLE_LENGTH,
        });
    }
    Ok(Some(title))
}

fn single_index(verb: Verb, rest: &str) -> Result<usize, ParseError> {
    let mut tokens = rest.split_whitespace();
    let first = tokens.next().ok_or(ParseError::MissingIndex { verb })?;
    if tokens.next().is_some() {
        return Err(ParseError::TooManyArguments { verb });
    }
    parse_index(verb, first)
}

fn parse_index(verb: Verb, token: &str) -> Result<usize, ParseError> {
    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::InvalidIndex {
            verb,
            token: token.to_string(),
        });
    }
    token.parse().map_err(|_| ParseError::InvalidIndex {
        verb,
        token: token.to_string(),
    })
}

const fn no_arguments(verb: Verb, rest: &str) -> Result<(), ParseError> {
    if rest.is_empty() {
        Ok(())
    } else {
        Err(ParseError::UnexpectedArguments { verb })
    }
}
