//! JSON bodies exchanged over HTTP.
//!
//! The gateway receives an [`InboundMessage`] for every chat message the
//! platform forwards and answers with a [`ReplyBody`]. Pushed messages
//! (daily reminders) go out to a webhook as an [`OutboundMessage`].

use serde::{Deserialize, Serialize};

use crate::task::OwnerId;

/// A chat message forwarded by the messaging platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Who wrote the message; their task list is the one affected.
    pub owner: OwnerId,
    /// Where the reply should go (a channel, a DM thread, ...).
    pub destination: String,
    /// Raw message text.
    pub text: String,
}

/// Synchronous answer to an [`InboundMessage`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyBody {
    /// Echo of the inbound destination.
    pub destination: String,
    /// Reply text, or `None` when the message was not a command.
    pub reply: Option<String>,
}

/// A message pushed to the platform without a preceding inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Target channel or user.
    pub destination: String,
    /// Message text.
    pub text: String,
}
