//! Shared definitions for taskbot: the task model, the command grammar,
//! and the JSON shapes exchanged with the gateway.

pub mod command;
pub mod task;
pub mod wire;

pub use command::{COMMAND_PREFIX, Command, ParseError, Verb, parse};
pub use task::{NewTask, OwnerId, Priority, Task, TaskId, TaskPatch, TaskStatus};
