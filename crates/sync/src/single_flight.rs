//! Keyed single-flight guard for expensive user-triggered operations.
//!
//! A second trigger for the same `(Operation, Source)` while the first is in
//! flight is rejected, not queued. The check and the claim happen under one
//! lock, synchronously, before the caller issues any backend call.

use crate::error::{Error, Result};
use mcpbridge_snapshot::Source;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Operations that are guarded per source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Backup,
    Restore,
    Sync,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Backup => "backup",
            Self::Restore => "restore",
            Self::Sync => "sync",
        })
    }
}

type Key = (Operation, Source);

/// Set of keys currently in flight. Cheap to clone; clones share state.
#[derive(Debug, Clone, Default)]
pub struct SingleFlight {
    active: Arc<Mutex<HashSet<Key>>>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `(operation, target)` or fails with [`Error::InFlight`].
    ///
    /// The claim is released when the returned guard drops, on success and
    /// on error alike.
    pub fn try_acquire(&self, operation: Operation, target: Source) -> Result<FlightGuard> {
        let key = (operation, target);
        if !self.active.lock().insert(key) {
            tracing::debug!(%operation, %target, "Rejected duplicate in-flight request");
            return Err(Error::InFlight { operation, target });
        }
        Ok(FlightGuard {
            active: Arc::clone(&self.active),
            key,
        })
    }

    /// Claims `operation` for every source at once. On failure nothing stays
    /// claimed.
    pub fn try_acquire_all(&self, operation: Operation) -> Result<Vec<FlightGuard>> {
        Source::ALL
            .iter()
            .map(|target| self.try_acquire(operation, *target))
            .collect()
    }

    pub fn is_in_flight(&self, operation: Operation, target: Source) -> bool {
        self.active.lock().contains(&(operation, target))
    }
}

/// Releases its key on drop.
#[derive(Debug)]
pub struct FlightGuard {
    active: Arc<Mutex<HashSet<Key>>>,
    key: Key,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.active.lock().remove(&self.key);
    }
}
