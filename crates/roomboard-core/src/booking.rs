//! Quick booking buttons for a free room.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::action::ActionSource;

/// Fixed booking lengths with the free time each one needs, in minutes.
const FIXED_OPTIONS: [(u32, i64); 4] = [(15, 20), (30, 40), (60, 70), (120, 130)];

/// One "book for N minutes" button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BookingOption {
    pub minutes: u32,
    pub source: ActionSource,
}

/// Options offered for the given free time.
///
/// `None` means nothing else is booked today: every fixed option, no custom
/// one. With a next meeting coming, a fixed option needs strictly more free
/// time than its threshold, and the remaining minutes are offered as a custom
/// option once they drop to the longest threshold or below.
pub fn quick_booking_options(minutes_available: Option<i64>) -> Vec<BookingOption> {
    let Some(available) = minutes_available else {
        return FIXED_OPTIONS
            .iter()
            .map(|&(minutes, _)| fixed(minutes))
            .collect();
    };

    let mut options: Vec<BookingOption> = FIXED_OPTIONS
        .iter()
        .filter(|&&(_, needs)| available > needs)
        .map(|&(minutes, _)| fixed(minutes))
        .collect();

    if available > 0 && available <= 130 {
        options.push(BookingOption {
            minutes: available as u32,
            source: ActionSource::from("create-custom"),
        });
    }
    options
}

fn fixed(minutes: u32) -> BookingOption {
    BookingOption {
        minutes,
        source: ActionSource::new(format!("create-{minutes}")),
    }
}
