//! # Meeting Actions
//!
//! The single action slot and the descriptors stored in it.
//!
//! ## Action Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Action Slot Phases                                │
//! │                                                                         │
//! │   ┌──────┐  start   ┌─────────┐  ok    ┌─────────┐  end   ┌──────┐     │
//! │   │ Idle │ ───────► │ Running │ ─────► │ Success │ ─────► │ Idle │     │
//! │   └──────┘          └────┬────┘        └─────────┘        └──────┘     │
//! │       ▲                  │ err                                          │
//! │       │ dismiss     ┌────▼────┐ retry  ┌──────────┐                     │
//! │       └──────────── │  Error  │ ─────► │ Retrying │ ──► Running          │
//! │                     └─────────┘        └──────────┘                     │
//! │                                                                         │
//! │  A new start overwrites the slot in any phase.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Descriptors are plain data. Retrying replays the stored descriptor as-is,
//! it never re-reads the current meeting from state.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreError;
use crate::validation::{validate_duration, validate_id};

// =============================================================================
// Action Source
// =============================================================================

/// Tag of the control that triggered an action (e.g. `"create-15"`).
///
/// The view layer uses it to put a spinner or a retry hint on the right button.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(transparent)]
pub struct ActionSource(pub String);

impl ActionSource {
    pub fn new(source: impl Into<String>) -> Self {
        Self(source.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ActionSource {
    fn from(source: &str) -> Self {
        Self(source.to_string())
    }
}

impl std::fmt::Display for ActionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Action Phase
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ActionPhase {
    #[default]
    Idle,
    Running,
    Retrying,
    Error,
    Success,
}

// =============================================================================
// Meeting Update Options
// =============================================================================

/// Body of an `updateMeeting` call. Only the set fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_now: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_in: Option<bool>,

    /// Minutes to add to the meeting's end time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension_time: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_now: Option<bool>,
}

impl MeetingUpdate {
    pub fn end_now() -> Self {
        Self {
            end_now: Some(true),
            ..Default::default()
        }
    }

    pub fn check_in() -> Self {
        Self {
            check_in: Some(true),
            ..Default::default()
        }
    }

    pub fn extend(minutes: u32) -> Self {
        Self {
            extension_time: Some(minutes),
            ..Default::default()
        }
    }

    /// Starting early also checks the meeting in.
    pub fn start_early() -> Self {
        Self {
            check_in: Some(true),
            start_now: Some(true),
            ..Default::default()
        }
    }
}

// =============================================================================
// Meeting Action
// =============================================================================

/// One room-state-changing operation with its full parameter payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MeetingAction {
    /// Book the displayed room from now on.
    Create { duration_minutes: u32, title: String },
    /// Delete a meeting (user-facing, not silent).
    Cancel { meeting_id: String },
    End { meeting_id: String },
    CheckIn { meeting_id: String },
    Extend { meeting_id: String, minutes: u32 },
    StartEarly { meeting_id: String },
    /// Book another room from the all-calendars view. Not retryable.
    CreateInRoom {
        calendar_id: String,
        duration_minutes: u32,
        title: String,
    },
}

impl MeetingAction {
    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            MeetingAction::Create { .. } => "create",
            MeetingAction::Cancel { .. } => "cancel",
            MeetingAction::End { .. } => "end",
            MeetingAction::CheckIn { .. } => "check_in",
            MeetingAction::Extend { .. } => "extend",
            MeetingAction::StartEarly { .. } => "start_early",
            MeetingAction::CreateInRoom { .. } => "create_in_room",
        }
    }

    /// Whether a failed run can be replayed from the slot.
    pub fn supports_retry(&self) -> bool {
        !matches!(self, MeetingAction::CreateInRoom { .. })
    }

    /// `updateMeeting` options for the update-style actions.
    pub fn meeting_update(&self) -> Option<MeetingUpdate> {
        match self {
            MeetingAction::End { .. } => Some(MeetingUpdate::end_now()),
            MeetingAction::CheckIn { .. } => Some(MeetingUpdate::check_in()),
            MeetingAction::Extend { minutes, .. } => Some(MeetingUpdate::extend(*minutes)),
            MeetingAction::StartEarly { .. } => Some(MeetingUpdate::start_early()),
            _ => None,
        }
    }

    /// Rejects payloads the device API would refuse anyway.
    pub fn validate(&self) -> Result<(), CoreError> {
        match self {
            MeetingAction::Create {
                duration_minutes, ..
            } => validate_duration("duration_minutes", *duration_minutes)?,
            MeetingAction::CreateInRoom {
                calendar_id,
                duration_minutes,
                ..
            } => {
                validate_id("calendar_id", calendar_id)?;
                validate_duration("duration_minutes", *duration_minutes)?;
            }
            MeetingAction::Extend {
                meeting_id,
                minutes,
            } => {
                validate_id("meeting_id", meeting_id)?;
                validate_duration("minutes", *minutes)?;
            }
            MeetingAction::Cancel { meeting_id }
            | MeetingAction::End { meeting_id }
            | MeetingAction::CheckIn { meeting_id }
            | MeetingAction::StartEarly { meeting_id } => {
                validate_id("meeting_id", meeting_id)?;
            }
        }
        Ok(())
    }
}

// =============================================================================
// Current Action (the slot)
// =============================================================================

/// What the action slot holds while it is not idle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CurrentAction {
    pub action: MeetingAction,

    pub source: Option<ActionSource>,

    pub phase: ActionPhase,

    /// HTTP status reported by the device API; `None` for opaque failures.
    pub error_code: Option<u16>,

    /// Identifies one `start`; completions for an older ticket are ignored.
    #[serde(skip)]
    #[ts(skip)]
    pub ticket: u64,
}

impl CurrentAction {
    pub fn new(action: MeetingAction, source: Option<ActionSource>, ticket: u64) -> Self {
        Self {
            action,
            source,
            phase: ActionPhase::Running,
            error_code: None,
            ticket,
        }
    }

    pub fn is_error(&self) -> bool {
        self.phase == ActionPhase::Error
    }

    /// True while the remote call has not come back yet.
    pub fn is_in_flight(&self) -> bool {
        matches!(self.phase, ActionPhase::Running | ActionPhase::Retrying)
    }
}
