//! # Adaptive Polling Schedule
//!
//! How long the sync loop sleeps before its next fetch.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  first match wins                                            │
//! │                                                              │
//! │  removed ........................... ~1 year (stop polling)  │
//! │  subscription cancelled ............ 10 minutes              │
//! │  dashboard device / room selected .. 30 seconds              │
//! │  anything else ..................... 5 seconds               │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use crate::state::AppState;

/// Delay table for the sync loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    /// Device deleted server-side. Nothing changes until it is re-paired.
    pub removed: Duration,

    /// Organization stopped paying.
    pub subscription_cancelled: Duration,

    /// Dashboard devices and devices showing their room.
    pub steady: Duration,

    /// Connect flow, nothing synced yet.
    pub active: Duration,
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self {
            removed: Duration::from_secs(365 * 24 * 60 * 60),
            subscription_cancelled: Duration::from_secs(10 * 60),
            steady: Duration::from_secs(30),
            active: Duration::from_secs(5),
        }
    }
}

impl PollSchedule {
    pub fn delay(&self, removed: bool, subscription_cancelled: bool, steady_view: bool) -> Duration {
        if removed {
            self.removed
        } else if subscription_cancelled {
            self.subscription_cancelled
        } else if steady_view {
            self.steady
        } else {
            self.active
        }
    }

    /// Delay for the given state. A dashboard device or a room with a bound
    /// calendar polls at the steady rate, all-calendars view open or not.
    pub fn delay_for(&self, state: &AppState) -> Duration {
        let steady_view = state.is_dashboard_device() || state.is_calendar_selected();
        self.delay(
            state.is_removed,
            state.is_subscription_cancelled,
            steady_view,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Calendar, DeviceSnapshot, DeviceType};

    fn snapshot(device_type: DeviceType, with_calendar: bool) -> DeviceSnapshot {
        DeviceSnapshot {
            id: "dev-1".into(),
            device_type,
            connection_code: None,
            is_connected: true,
            language: None,
            version: None,
            calendar: with_calendar.then(|| Calendar {
                id: "cal-1".into(),
                name: "Aurora".into(),
                current_meeting: None,
                next_meeting: None,
            }),
            calendars: vec![],
        }
    }

    #[test]
    fn test_priority_table() {
        let schedule = PollSchedule::default();
        let year = Duration::from_secs(365 * 24 * 60 * 60);

        assert_eq!(schedule.delay(true, true, true), year);
        assert_eq!(schedule.delay(true, false, false), year);
        assert_eq!(schedule.delay(false, true, true), Duration::from_secs(600));
        assert_eq!(schedule.delay(false, false, true), Duration::from_secs(30));
        assert_eq!(schedule.delay(false, false, false), Duration::from_secs(5));
    }

    #[test]
    fn test_delay_for_state() {
        let schedule = PollSchedule::default();
        let mut state = AppState::default();
        assert_eq!(schedule.delay_for(&state), Duration::from_secs(5));

        state.device = Some(snapshot(DeviceType::Dashboard, false));
        assert_eq!(schedule.delay_for(&state), Duration::from_secs(30));

        state.device = Some(snapshot(DeviceType::Calendar, true));
        assert_eq!(schedule.delay_for(&state), Duration::from_secs(30));

        // Opening the all-calendars view keeps the room's cadence
        state.show_all_calendars = true;
        assert_eq!(schedule.delay_for(&state), Duration::from_secs(30));

        state.is_subscription_cancelled = true;
        assert_eq!(schedule.delay_for(&state), Duration::from_secs(600));

        state.is_removed = true;
        assert_eq!(schedule.delay_for(&state), schedule.removed);
    }

    #[test]
    fn test_connect_flow_polls_fast() {
        let schedule = PollSchedule::default();
        let mut state = AppState::default();
        state.device = Some(snapshot(DeviceType::Calendar, false));
        assert_eq!(schedule.delay_for(&state), Duration::from_secs(5));

        // All-calendars view without a bound room is still the fast path
        state.show_all_calendars = true;
        assert_eq!(schedule.delay_for(&state), Duration::from_secs(5));
    }
}
