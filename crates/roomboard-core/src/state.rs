//! # Application State
//!
//! The one state container the runtime mutates and the view layer reads.
//!
//! ## Ownership
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          AppState                                       │
//! │                                                                         │
//! │   field                     written by                                  │
//! │   ────────────────────────  ───────────────────────────────────────     │
//! │   now                       clock                                       │
//! │   device                    sync loop, action refresh                   │
//! │   is_removed                sync loop (404)                             │
//! │   is_subscription_cancelled sync loop (402 / success)                   │
//! │   is_offline                connectivity observer                       │
//! │   action                    action pipeline, connectivity observer      │
//! │   show_all_calendars        all-calendars view                          │
//! │   is_initialized/registered initialization                              │
//! │   full_screen               initialization                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Writes go through the named operations of the runtime's state store.
//! Everything here is a read-only projection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::action::{ActionPhase, ActionSource, CurrentAction};
use crate::types::{
    Calendar, DeviceSnapshot, DeviceType, DisplayMode, Meeting, RegistrationStatus, Screen,
    SubscriptionStatus,
};

/// Whether the host can go full screen, and whether it currently is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct FullScreenState {
    pub supported: bool,
    pub active: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    /// Last clock tick.
    #[ts(as = "String")]
    pub now: DateTime<Utc>,

    /// Last applied device snapshot. `None` until the first successful sync.
    pub device: Option<DeviceSnapshot>,

    pub is_initialized: bool,
    pub is_registered: bool,
    pub is_removed: bool,
    pub is_subscription_cancelled: bool,

    /// The last remote call got no response at all.
    pub is_offline: bool,

    /// The temporary all-calendars view is open.
    pub show_all_calendars: bool,

    pub full_screen: FullScreenState,

    /// The action slot. `None` means idle.
    pub action: Option<CurrentAction>,
}

impl AppState {
    // =========================================================================
    // Room & Meeting
    // =========================================================================

    pub fn calendar(&self) -> Option<&Calendar> {
        self.device.as_ref().and_then(|d| d.calendar.as_ref())
    }

    pub fn current_meeting(&self) -> Option<&Meeting> {
        self.device.as_ref().and_then(DeviceSnapshot::current_meeting)
    }

    /// See [`Meeting::minutes_left_for_check_in`].
    pub fn minutes_left_for_check_in(&self) -> Option<i64> {
        self.current_meeting()
            .and_then(|m| m.minutes_left_for_check_in(self.now))
    }

    /// Free minutes before the next booking; `None` when nothing is booked.
    pub fn minutes_available_till_next_meeting(&self) -> Option<i64> {
        self.calendar()
            .and_then(|c| c.minutes_until_next_meeting(self.now))
    }

    /// The current meeting, if nobody checked in before its deadline.
    pub fn overdue_meeting(&self) -> Option<&Meeting> {
        self.current_meeting()
            .filter(|m| m.is_check_in_overdue(self.now))
    }

    pub fn calendar_name(&self) -> Option<&str> {
        self.calendar().map(|c| c.name.as_str())
    }

    /// Name of any synced room, the bound one included.
    pub fn calendar_name_for(&self, calendar_id: &str) -> Option<&str> {
        self.device
            .as_ref()
            .and_then(|d| d.find_calendar(calendar_id))
            .map(|c| c.name.as_str())
    }

    // =========================================================================
    // Device
    // =========================================================================

    pub fn is_dashboard_device(&self) -> bool {
        self.device
            .as_ref()
            .is_some_and(|d| d.device_type == DeviceType::Dashboard)
    }

    pub fn is_calendar_selected(&self) -> bool {
        self.calendar().is_some()
    }

    pub fn is_device_connected(&self) -> bool {
        self.device.as_ref().is_some_and(|d| d.is_connected)
    }

    pub fn connection_code(&self) -> Option<&str> {
        self.device
            .as_ref()
            .and_then(|d| d.connection_code.as_deref())
    }

    pub fn registration_status(&self) -> RegistrationStatus {
        if self.is_removed {
            RegistrationStatus::Removed
        } else if self.is_registered {
            RegistrationStatus::Registered
        } else {
            RegistrationStatus::Unregistered
        }
    }

    pub fn subscription_status(&self) -> SubscriptionStatus {
        if self.is_subscription_cancelled {
            SubscriptionStatus::Cancelled
        } else {
            SubscriptionStatus::Active
        }
    }

    // =========================================================================
    // Action Slot
    // =========================================================================

    pub fn action_phase(&self) -> ActionPhase {
        self.action.as_ref().map_or(ActionPhase::Idle, |a| a.phase)
    }

    pub fn action_source(&self) -> Option<&ActionSource> {
        self.action.as_ref().and_then(|a| a.source.as_ref())
    }

    pub fn action_error_code(&self) -> Option<u16> {
        self.action.as_ref().and_then(|a| a.error_code)
    }

    /// Booking buttons are disabled while any control owns the slot.
    pub fn is_action_pending(&self) -> bool {
        self.action_source().is_some()
    }

    // =========================================================================
    // Routing
    // =========================================================================

    /// Working mode of a healthy device. Ignores the fatal flags.
    pub fn display_mode(&self) -> DisplayMode {
        if self.is_dashboard_device() {
            DisplayMode::Dashboard
        } else if self.show_all_calendars {
            DisplayMode::AllCalendars
        } else if self.is_calendar_selected() {
            DisplayMode::SingleCalendar
        } else {
            DisplayMode::ConnectFlow
        }
    }

    /// What to render, first match wins.
    pub fn screen(&self) -> Screen {
        if self.is_offline {
            return Screen::Offline;
        }
        if self.is_removed {
            return Screen::DeviceRemoved;
        }
        if self.is_subscription_cancelled {
            return Screen::SubscriptionCancelled;
        }
        match self.display_mode() {
            DisplayMode::Dashboard => Screen::Dashboard,
            DisplayMode::AllCalendars => Screen::AllCalendars,
            DisplayMode::SingleCalendar => Screen::SingleCalendar,
            DisplayMode::ConnectFlow => {
                if self.is_device_connected() {
                    Screen::NoCalendar
                } else if let Some(code) = self.connection_code() {
                    Screen::ConnectionCode(code.to_string())
                } else {
                    Screen::Loading
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::MeetingAction;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
    }

    fn meeting(start_offset: i64, deadline_offset: Option<i64>, checked_in: bool) -> Meeting {
        Meeting {
            id: "m-1".into(),
            calendar_id: "cal-1".into(),
            title: "Planning".into(),
            start_time: now() + Duration::minutes(start_offset),
            end_time: now() + Duration::minutes(start_offset + 30),
            check_in_deadline: deadline_offset.map(|o| now() + Duration::minutes(o)),
            is_checked_in: checked_in,
            can_extend: false,
        }
    }

    fn device(calendar: Option<Calendar>) -> DeviceSnapshot {
        DeviceSnapshot {
            id: "dev-1".into(),
            device_type: DeviceType::Calendar,
            connection_code: Some("K7Q2".into()),
            is_connected: false,
            language: Some("en".into()),
            version: None,
            calendar,
            calendars: vec![],
        }
    }

    fn room(current: Option<Meeting>, next: Option<Meeting>) -> Calendar {
        Calendar {
            id: "cal-1".into(),
            name: "Aurora".into(),
            current_meeting: current,
            next_meeting: next,
        }
    }

    fn state_with(device: DeviceSnapshot) -> AppState {
        AppState {
            now: now(),
            device: Some(device),
            ..Default::default()
        }
    }

    #[test]
    fn test_screen_routing_order() {
        let mut state = state_with(device(Some(room(None, None))));
        assert_eq!(state.screen(), Screen::SingleCalendar);

        state.show_all_calendars = true;
        assert_eq!(state.screen(), Screen::AllCalendars);

        state.is_subscription_cancelled = true;
        assert_eq!(state.screen(), Screen::SubscriptionCancelled);

        state.is_removed = true;
        assert_eq!(state.screen(), Screen::DeviceRemoved);

        state.is_offline = true;
        assert_eq!(state.screen(), Screen::Offline);
    }

    #[test]
    fn test_connect_flow_screens() {
        let mut state = state_with(device(None));
        assert_eq!(state.screen(), Screen::ConnectionCode("K7Q2".into()));
        assert_eq!(state.display_mode(), DisplayMode::ConnectFlow);

        state.device.as_mut().unwrap().is_connected = true;
        assert_eq!(state.screen(), Screen::NoCalendar);

        assert_eq!(AppState::default().screen(), Screen::Loading);
    }

    #[test]
    fn test_dashboard_wins_over_all_calendars() {
        let mut snapshot = device(None);
        snapshot.device_type = DeviceType::Dashboard;
        let mut state = state_with(snapshot);
        state.show_all_calendars = true;
        assert_eq!(state.display_mode(), DisplayMode::Dashboard);
        assert_eq!(state.screen(), Screen::Dashboard);
    }

    #[test]
    fn test_overdue_meeting() {
        let state = state_with(device(Some(room(Some(meeting(-10, Some(-1), false)), None))));
        assert_eq!(state.minutes_left_for_check_in(), Some(-1));
        assert!(state.overdue_meeting().is_some());

        let checked_in = state_with(device(Some(room(Some(meeting(-10, Some(-1), true)), None))));
        assert!(checked_in.overdue_meeting().is_none());

        let in_time = state_with(device(Some(room(Some(meeting(0, Some(5), false)), None))));
        assert_eq!(in_time.minutes_left_for_check_in(), Some(5));
        assert!(in_time.overdue_meeting().is_none());
    }

    #[test]
    fn test_minutes_available_till_next_meeting() {
        let state = state_with(device(Some(room(None, Some(meeting(25, None, false))))));
        assert_eq!(state.minutes_available_till_next_meeting(), Some(25));

        let free = state_with(device(Some(room(None, None))));
        assert_eq!(free.minutes_available_till_next_meeting(), None);
    }

    #[test]
    fn test_statuses() {
        let mut state = AppState::default();
        assert_eq!(state.registration_status(), RegistrationStatus::Unregistered);
        state.is_registered = true;
        assert_eq!(state.registration_status(), RegistrationStatus::Registered);
        state.is_removed = true;
        assert_eq!(state.registration_status(), RegistrationStatus::Removed);

        assert_eq!(state.subscription_status(), SubscriptionStatus::Active);
        state.is_subscription_cancelled = true;
        assert_eq!(state.subscription_status(), SubscriptionStatus::Cancelled);
    }

    #[test]
    fn test_action_projections() {
        let mut state = AppState::default();
        assert_eq!(state.action_phase(), ActionPhase::Idle);
        assert!(!state.is_action_pending());

        state.action = Some(CurrentAction::new(
            MeetingAction::Create {
                duration_minutes: 15,
                title: "Quick meeting".into(),
            },
            Some("create-15".into()),
            1,
        ));
        assert_eq!(state.action_phase(), ActionPhase::Running);
        assert_eq!(state.action_source().map(ActionSource::as_str), Some("create-15"));
        assert!(state.is_action_pending());
    }

    #[test]
    fn test_calendar_name_lookup() {
        let mut snapshot = device(Some(room(None, None)));
        snapshot.calendars.push(Calendar {
            id: "cal-2".into(),
            name: "Borealis".into(),
            current_meeting: None,
            next_meeting: None,
        });
        let state = state_with(snapshot);
        assert_eq!(state.calendar_name(), Some("Aurora"));
        assert_eq!(state.calendar_name_for("cal-2"), Some("Borealis"));
    }
}
