//! # State Store
//!
//! The injected application-state container. Every mutation is one of the
//! named operations below; each runs atomically and notifies subscribers.
//!
//! ## Action Tickets
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  start(A) ─► ticket 7   slot = A/running                                │
//! │  start(B) ─► ticket 8   slot = B/running   (A is gone)                  │
//! │  A completes with ticket 7 ─► ignored                                   │
//! │  B completes with ticket 8 ─► slot = B/success or B/error               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Device data is never ticketed: any refresh is authoritative.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

use roomboard_core::{
    ActionPhase, ActionSource, AppState, CurrentAction, DeviceSnapshot, FullScreenState,
    MeetingAction,
};

/// Cloneable handle on the shared [`AppState`].
#[derive(Debug, Clone)]
pub struct StateStore {
    tx: Arc<watch::Sender<AppState>>,
    tickets: Arc<AtomicU64>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(AppState::default())
    }
}

impl StateStore {
    pub fn new(initial: AppState) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self {
            tx: Arc::new(tx),
            tickets: Arc::new(AtomicU64::new(0)),
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// A copy of the current state.
    pub fn snapshot(&self) -> AppState {
        self.tx.borrow().clone()
    }

    /// Runs `f` against the current state without cloning it.
    pub fn read<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        f(&self.tx.borrow())
    }

    /// Receiver that sees every micro-update, in order.
    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.tx.subscribe()
    }

    // =========================================================================
    // Device
    // =========================================================================

    /// Replaces the device snapshot wholesale.
    pub fn update_device_data(&self, snapshot: DeviceSnapshot) {
        self.tx.send_modify(|state| {
            state.device = Some(snapshot);
            state.is_registered = true;
        });
    }

    pub fn mark_removed(&self) {
        self.tx.send_modify(|state| state.is_removed = true);
    }

    pub fn set_subscription_cancelled(&self, cancelled: bool) {
        self.tx
            .send_modify(|state| state.is_subscription_cancelled = cancelled);
    }

    /// Returns false if the runtime was already initialized.
    pub fn mark_initialized(&self) -> bool {
        self.tx.send_if_modified(|state| {
            let first = !state.is_initialized;
            state.is_initialized = true;
            first
        })
    }

    pub fn mark_registered(&self) {
        self.tx.send_modify(|state| state.is_registered = true);
    }

    pub fn set_full_screen(&self, full_screen: FullScreenState) {
        self.tx.send_modify(|state| state.full_screen = full_screen);
    }

    pub fn update_clock(&self, now: DateTime<Utc>) {
        self.tx.send_modify(|state| state.now = now);
    }

    pub fn set_show_all_calendars(&self, show: bool) {
        self.tx.send_modify(|state| state.show_all_calendars = show);
    }

    // =========================================================================
    // Connectivity
    // =========================================================================

    /// A response came back. Clears the offline flag and voids any action
    /// that was in the slot during the outage.
    pub fn record_response(&self) {
        self.tx.send_if_modified(|state| {
            if !state.is_offline {
                return false;
            }
            debug!("Connection restored");
            state.action = None;
            state.is_offline = false;
            true
        });
    }

    /// The server answered with an error status: it is reachable.
    pub fn record_server_failure(&self) {
        self.tx.send_if_modified(|state| {
            let was_offline = state.is_offline;
            state.is_offline = false;
            was_offline
        });
    }

    /// No response at all.
    pub fn record_network_failure(&self) {
        self.tx.send_if_modified(|state| {
            if state.is_offline {
                return false;
            }
            debug!("Connection lost");
            state.is_offline = true;
            true
        });
    }

    // =========================================================================
    // Action Slot
    // =========================================================================

    /// Puts a new action in the slot, replacing whatever was there.
    pub fn start_action(&self, action: MeetingAction, source: Option<ActionSource>) -> u64 {
        let ticket = self.tickets.fetch_add(1, Ordering::SeqCst) + 1;
        self.tx.send_modify(|state| {
            state.action = Some(CurrentAction::new(action, source, ticket));
        });
        ticket
    }

    /// Claims the failed action for a retry, returning its ticket and descriptor.
    pub fn begin_retry(&self) -> Option<(u64, MeetingAction)> {
        let mut claimed = None;
        self.tx.send_if_modified(|state| match state.action.as_mut() {
            Some(current) if current.is_error() && current.action.supports_retry() => {
                current.phase = ActionPhase::Retrying;
                current.error_code = None;
                claimed = Some((current.ticket, current.action.clone()));
                true
            }
            _ => false,
        });
        claimed
    }

    pub fn set_action_running(&self, ticket: u64) -> bool {
        self.modify_action(ticket, |current| current.phase = ActionPhase::Running)
    }

    pub fn set_action_error(&self, ticket: u64, code: Option<u16>) -> bool {
        self.modify_action(ticket, |current| {
            current.phase = ActionPhase::Error;
            current.error_code = code;
        })
    }

    pub fn set_action_success(&self, ticket: u64) -> bool {
        self.modify_action(ticket, |current| {
            current.phase = ActionPhase::Success;
            current.error_code = None;
        })
    }

    /// Clears the slot if it still holds `ticket`.
    pub fn finish_action(&self, ticket: u64) -> bool {
        self.tx.send_if_modified(|state| {
            if state.action.as_ref().is_some_and(|a| a.ticket == ticket) {
                state.action = None;
                true
            } else {
                false
            }
        })
    }

    /// Clears the slot unconditionally.
    pub fn end_action(&self) {
        self.tx.send_if_modified(|state| state.action.take().is_some());
    }

    fn modify_action(&self, ticket: u64, f: impl FnOnce(&mut CurrentAction)) -> bool {
        self.tx.send_if_modified(|state| match state.action.as_mut() {
            Some(current) if current.ticket == ticket => {
                f(current);
                true
            }
            _ => false,
        })
    }
}
