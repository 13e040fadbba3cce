//! # Epoch Registry
//!
//! "Latest invocation wins" bookkeeping for background operations.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  issue(DeviceSync) ─► token #1                                          │
//! │       ... fetch in flight (suspended) ...                               │
//! │  issue(DeviceSync) ─► token #2      token #1 is now stale               │
//! │                                                                         │
//! │  token #1 resolves ─► is_stale() == true  ─► drop the result            │
//! │  token #2 resolves ─► is_stale() == false ─► apply                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Staleness is checked right after each `.await`, never assumed from timing.
//! Stale operations stop themselves; nothing is aborted.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Background operations that can be superseded by a newer instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    DeviceSync,
    VersionWatchdog,
    Clock,
}

/// Captured "generation" of one operation invocation.
#[derive(Debug, Clone)]
pub struct EpochToken {
    epoch: u64,
    current: Arc<AtomicU64>,
}

impl EpochToken {
    /// True once a newer invocation of the same operation was issued.
    pub fn is_stale(&self) -> bool {
        self.current.load(Ordering::SeqCst) != self.epoch
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// One monotonically increasing counter per operation.
#[derive(Debug, Default, Clone)]
pub struct EpochRegistry {
    counters: Arc<Mutex<HashMap<Operation, Arc<AtomicU64>>>>,
}

impl EpochRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new invocation of `op`, invalidating every earlier token for it.
    pub fn issue(&self, op: Operation) -> EpochToken {
        let current = self.counter(op);
        let epoch = current.fetch_add(1, Ordering::SeqCst) + 1;
        EpochToken { epoch, current }
    }

    /// Invalidates every operation seen so far.
    pub fn invalidate_all(&self) {
        let counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        for counter in counters.values() {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn counter(&self, op: Operation) -> Arc<AtomicU64> {
        let mut counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        counters.entry(op).or_default().clone()
    }
}
