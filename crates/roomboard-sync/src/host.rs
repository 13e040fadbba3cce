//! # Device Host
//!
//! Local collaborators the runtime calls but does not own: the reload
//! mechanism, the UI language, full screen, localized strings.

use roomboard_core::FullScreenState;

/// Implemented by whatever embeds the runtime (the display binary, a UI shell).
pub trait DeviceHost: Send + Sync {
    /// Throws the current runtime away and starts a fresh one.
    fn reload(&self);

    /// Switches the UI language, e.g. `"de"`.
    fn change_language(&self, language: &str);

    fn full_screen(&self) -> FullScreenState {
        FullScreenState::default()
    }

    /// Flips full screen and reports the new state.
    fn toggle_full_screen(&self) -> FullScreenState {
        self.full_screen()
    }

    /// Title of a meeting booked from the display.
    fn quick_meeting_title(&self, room_name: &str) -> String {
        format!("Quick meeting in {room_name}")
    }
}

/// Host that ignores everything.
pub struct NoOpHost;

impl DeviceHost for NoOpHost {
    fn reload(&self) {}
    fn change_language(&self, _language: &str) {}
}
