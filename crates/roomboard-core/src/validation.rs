//! Input validation for meeting mutations.

use crate::error::ValidationError;
use crate::MAX_MEETING_MINUTES;

/// Checks that a duration or extension is within `1..=MAX_MEETING_MINUTES`.
pub fn validate_duration(field: &str, minutes: u32) -> Result<(), ValidationError> {
    if minutes == 0 || minutes > MAX_MEETING_MINUTES {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: i64::from(MAX_MEETING_MINUTES),
        });
    }
    Ok(())
}

/// Checks that an identifier is not blank.
pub fn validate_id(field: &str, id: &str) -> Result<(), ValidationError> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}
