//! # roomboard-core: Pure Domain Logic for Roomboard
//!
//! This crate describes everything a meeting-room display knows about "what
//! this room is doing right now", as plain types and pure functions.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Roomboard Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    View layer (external)                        │   │
//! │  │   Dashboard ─ Single calendar ─ All calendars ─ Fatal screens   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ reads AppState projections             │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    roomboard-sync (runtime)                     │   │
//! │  │   sync loop, action pipeline, connectivity, watchdog            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ roomboard-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   state   │  │ schedule  │  │  action   │  │   │
//! │  │   │ Snapshot  │  │ AppState  │  │ PollSched │  │ Meeting   │  │   │
//! │  │   │ Meeting   │  │ selectors │  │           │  │ Action    │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO TIMERS • NO NETWORK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Device snapshot, calendars, meetings, display modes
//! - [`action`] - Meeting action descriptors and the action slot
//! - [`state`] - Application state container and its selectors
//! - [`schedule`] - Adaptive polling delay
//! - [`booking`] - Quick booking options for a free room
//! - [`validation`] - Input validation for meeting mutations
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use roomboard_core::schedule::PollSchedule;
//! use roomboard_core::state::AppState;
//! use std::time::Duration;
//!
//! let mut state = AppState::default();
//! let schedule = PollSchedule::default();
//!
//! // Nothing known yet: poll quickly
//! assert_eq!(schedule.delay_for(&state), Duration::from_secs(5));
//!
//! // Removed devices practically stop polling
//! state.is_removed = true;
//! assert!(schedule.delay_for(&state) > Duration::from_secs(60 * 60 * 24 * 300));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod action;
pub mod booking;
pub mod error;
pub mod schedule;
pub mod state;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use action::{ActionPhase, ActionSource, CurrentAction, MeetingAction, MeetingUpdate};
pub use error::{CoreError, CoreResult, ValidationError};
pub use schedule::PollSchedule;
pub use state::{AppState, FullScreenState};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Longest meeting (or extension) the display will request, in minutes.
pub const MAX_MEETING_MINUTES: u32 = 24 * 60;
