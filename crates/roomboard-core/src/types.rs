//! # Domain Types
//!
//! What the device API tells a display about itself and its room.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ DeviceSnapshot  │──►│    Calendar     │──►│    Meeting      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  id             │       │
//! │  │  device_type    │   │  name           │   │  calendar_id    │       │
//! │  │  connection_code│   │  current_meeting│   │  start / end    │       │
//! │  │  calendar       │   │  next_meeting   │   │  check_in_dl    │       │
//! │  │  calendars[]    │   └─────────────────┘   │  is_checked_in  │       │
//! │  │  language       │                         │  can_extend     │       │
//! │  │  version        │                         └─────────────────┘       │
//! │  └─────────────────┘                                                    │
//! │                                                                         │
//! │  Derived (never sent by the server):                                    │
//! │  RegistrationStatus • SubscriptionStatus • DisplayMode • Screen         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Snapshots are replaced wholesale on every successful sync; nothing in
//! here is ever patched in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

// =============================================================================
// Device Type
// =============================================================================

/// How the device was set up in the admin panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    /// Shows many rooms at once; polls slowly.
    Dashboard,
    /// Bound to (at most) one room calendar.
    #[default]
    Calendar,
}

// =============================================================================
// Meeting
// =============================================================================

/// A booked meeting in a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Meeting {
    /// Server-side meeting identifier.
    pub id: String,

    /// Calendar (room) the meeting is booked in.
    pub calendar_id: String,

    /// Display title.
    #[serde(default)]
    pub title: String,

    #[ts(as = "String")]
    pub start_time: DateTime<Utc>,

    #[ts(as = "String")]
    pub end_time: DateTime<Utc>,

    /// Latest moment someone must check in before the meeting is released.
    /// `None` when the room does not require check-in.
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub check_in_deadline: Option<DateTime<Utc>>,

    #[serde(default)]
    pub is_checked_in: bool,

    /// Whether the meeting can be extended (nothing booked right after it).
    #[serde(default)]
    pub can_extend: bool,
}

impl Meeting {
    /// Whole minutes left until the check-in deadline, rounded down.
    ///
    /// Negative once the deadline has passed (one second late is `-1`).
    /// `None` if the meeting is checked in or has no deadline.
    pub fn minutes_left_for_check_in(&self, now: DateTime<Utc>) -> Option<i64> {
        if self.is_checked_in {
            return None;
        }
        self.check_in_deadline
            .map(|deadline| floor_minutes(deadline - now))
    }

    /// True once the check-in deadline is strictly in the past and nobody
    /// checked in.
    pub fn is_check_in_overdue(&self, now: DateTime<Utc>) -> bool {
        matches!(self.minutes_left_for_check_in(now), Some(m) if m < 0)
    }

    /// True while `now` falls inside the meeting.
    pub fn is_in_progress(&self, now: DateTime<Utc>) -> bool {
        self.start_time <= now && now < self.end_time
    }
}

// =============================================================================
// Calendar
// =============================================================================

/// A bookable room calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Calendar {
    pub id: String,

    /// Room name shown on the display.
    pub name: String,

    /// Meeting currently occupying (or about to occupy) the room.
    #[serde(default)]
    pub current_meeting: Option<Meeting>,

    /// The next meeting after the current one.
    #[serde(default)]
    pub next_meeting: Option<Meeting>,
}

impl Calendar {
    /// Whole minutes until the next booking starts, rounded down.
    ///
    /// `None` when nothing else is booked today.
    pub fn minutes_until_next_meeting(&self, now: DateTime<Utc>) -> Option<i64> {
        let upcoming = match &self.current_meeting {
            Some(meeting) if meeting.start_time > now => Some(meeting),
            _ => self.next_meeting.as_ref(),
        };
        upcoming.map(|meeting| floor_minutes(meeting.start_time - now).max(0))
    }
}

// =============================================================================
// Device Snapshot
// =============================================================================

/// Everything one `getDeviceDetails` call returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSnapshot {
    /// Server-side device identifier.
    pub id: String,

    #[serde(default)]
    pub device_type: DeviceType,

    /// Pairing code shown while the device is not yet connected to an account.
    #[serde(default)]
    pub connection_code: Option<String>,

    /// True once the device has been paired with an organization.
    #[serde(default)]
    pub is_connected: bool,

    /// Preferred UI language (e.g. `"en"`, `"de"`).
    #[serde(default)]
    pub language: Option<String>,

    /// Build/API version the server expects clients to run.
    #[serde(default)]
    pub version: Option<String>,

    /// The room this device is bound to.
    #[serde(default)]
    pub calendar: Option<Calendar>,

    /// Every bookable room; only filled when the expanded set was requested.
    #[serde(default)]
    pub calendars: Vec<Calendar>,
}

impl DeviceSnapshot {
    /// The meeting in the slot of the bound room.
    pub fn current_meeting(&self) -> Option<&Meeting> {
        self.calendar
            .as_ref()
            .and_then(|calendar| calendar.current_meeting.as_ref())
    }

    /// Looks a calendar up by id, in the bound room first, then the expanded set.
    pub fn find_calendar(&self, calendar_id: &str) -> Option<&Calendar> {
        self.calendar
            .iter()
            .chain(self.calendars.iter())
            .find(|calendar| calendar.id == calendar_id)
    }
}

/// Response of the lightweight version endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ApiVersion {
    #[serde(default)]
    pub version: Option<String>,
}

// =============================================================================
// Derived Statuses
// =============================================================================

/// Where the device stands with the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    Unregistered,
    Registered,
    Removed,
}

/// Billing state of the organization owning the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Cancelled,
}

/// The four working modes a healthy device can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    Dashboard,
    AllCalendars,
    SingleCalendar,
    ConnectFlow,
}

impl std::fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisplayMode::Dashboard => write!(f, "dashboard"),
            DisplayMode::AllCalendars => write!(f, "all-calendars"),
            DisplayMode::SingleCalendar => write!(f, "single-calendar"),
            DisplayMode::ConnectFlow => write!(f, "connect-flow"),
        }
    }
}

/// The screen the view layer should render, fatal states included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "screen", content = "connectionCode", rename_all = "snake_case")]
pub enum Screen {
    /// The last remote call got no response at all.
    Offline,
    /// The device was deleted server-side; offers a disconnect button.
    DeviceRemoved,
    SubscriptionCancelled,
    Dashboard,
    AllCalendars,
    SingleCalendar,
    /// Paired with an account but no room assigned yet.
    NoCalendar,
    /// Waiting to be paired; shows the code to enter in the admin panel.
    ConnectionCode(String),
    /// Nothing synced yet.
    Loading,
}

impl Screen {
    /// True for the full-screen error states.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Screen::Offline | Screen::DeviceRemoved | Screen::SubscriptionCancelled
        )
    }
}

/// Rounds a duration down to whole minutes (towards negative infinity).
fn floor_minutes(duration: chrono::Duration) -> i64 {
    duration.num_seconds().div_euclid(60)
}
