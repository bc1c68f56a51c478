//! Two-step confirmation for destructive bulk operations.
//!
//! `reset all` arms a token for the owner; `confirm reset` consumes it.
//! Tokens expire lazily: nothing runs in the background, an expired token
//! is only noticed (and dropped) when someone tries to consume it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use taskbot_proto::task::OwnerId;

use crate::clock::Clock;

/// How long a `reset all` stays confirmable unless configured otherwise.
pub const DEFAULT_CONFIRMATION_WINDOW: Duration = Duration::from_secs(10 * 60);

/// Proof that an owner confirmed a full reset.
///
/// Only [`ConfirmationRegistry::consume`] can produce one, so deleting an
/// owner's whole history cannot be reached without it.
#[derive(Debug, PartialEq, Eq)]
pub struct ResetAuthorization {
    owner: OwnerId,
}

impl ResetAuthorization {
    /// The owner whose tasks may be wiped.
    #[must_use]
    pub const fn owner(&self) -> &OwnerId {
        &self.owner
    }
}

/// Result of consuming a confirmation.
#[derive(Debug, PartialEq, Eq)]
pub enum Confirmation {
    /// A live token was found and removed.
    Confirmed(ResetAuthorization),
    /// No token, or it had run out.
    Expired,
}

/// Per-owner confirmation tokens.
pub struct ConfirmationRegistry {
    tokens: parking_lot::Mutex<HashMap<OwnerId, DateTime<Utc>>>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for ConfirmationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfirmationRegistry")
            .field("armed", &self.tokens.lock().len())
            .finish_non_exhaustive()
    }
}

impl ConfirmationRegistry {
    /// Creates an empty registry reading time from `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            tokens: parking_lot::Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Arms (or re-arms) `owner`'s token to expire `ttl` from now.
    pub fn arm(&self, owner: &OwnerId, ttl: Duration) {
        let now = self.clock.now();
        let expires_at = TimeDelta::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.tokens.lock().insert(owner.clone(), expires_at);
        tracing::debug!(owner = %owner, %expires_at, "reset confirmation armed");
    }

    /// Reads and removes `owner`'s token.
    ///
    /// Single use: a second call after a successful one reports
    /// [`Confirmation::Expired`].
    pub fn consume(&self, owner: &OwnerId) -> Confirmation {
        let now = self.clock.now();
        let expires_at = self.tokens.lock().remove(owner);
        match expires_at {
            Some(expires_at) if now <= expires_at => Confirmation::Confirmed(ResetAuthorization {
                owner: owner.clone(),
            }),
            Some(expires_at) => {
                tracing::debug!(owner = %owner, %expires_at, "reset confirmation expired");
                Confirmation::Expired
            }
            None => Confirmation::Expired,
        }
    }

    /// Returns `true` if `owner` has a token that has not run out yet.
    #[must_use]
    pub fn is_armed(&self, owner: &OwnerId) -> bool {
        let now = self.clock.now();
        self.tokens
            .lock()
            .get(owner)
            .is_some_and(|expires_at| now <= *expires_at)
    }
}
