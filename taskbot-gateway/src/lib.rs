//! taskbot gateway library.
//!
//! Exposes the HTTP front end for use in tests and embedding. The gateway
//! accepts chat messages forwarded by a messaging platform, runs them
//! through the bot, and answers with the reply text.

pub mod config;
pub mod server;
