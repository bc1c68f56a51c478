//! Per-owner mutual exclusion for task mutations.

use std::collections::HashMap;
use std::sync::Arc;

use taskbot_proto::task::OwnerId;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Once the map grows past this many owners, idle gates are dropped.
const PRUNE_THRESHOLD: usize = 1024;

/// Keyed async locks, one per owner.
///
/// Two commands from the same owner that resolve an index and then mutate
/// run one after the other; commands from different owners never wait on
/// each other.
#[derive(Debug, Default)]
pub struct OwnerGates {
    gates: parking_lot::Mutex<HashMap<OwnerId, Arc<Mutex<()>>>>,
}

impl OwnerGates {
    /// Creates an empty gate map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for `owner`'s gate. The gate is held until the guard drops.
    pub async fn lock(&self, owner: &OwnerId) -> OwnedMutexGuard<()> {
        let gate = {
            let mut gates = self.gates.lock();
            let gate = Arc::clone(gates.entry(owner.clone()).or_default());
            if gates.len() > PRUNE_THRESHOLD {
                gates.retain(|_, g| Arc::strong_count(g) > 1);
            }
            gate
        };
        gate.lock_owned().await
    }

    /// Number of owners currently tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.gates.lock().len()
    }

    /// Returns `true` if no gate exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.gates.lock().is_empty()
    }
}
