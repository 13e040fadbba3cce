//! # Error Types
//!
//! Domain-specific error types for roomboard-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  roomboard-core errors (this file)                                     │
//! │  ├── CoreError        - Domain preconditions that do not hold           │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  roomboard-sync errors (separate crate)                                │
//! │  ├── ApiError         - Remote call failures (network/status/decode)   │
//! │  └── SyncError        - Runtime and configuration failures             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → SyncError → caller                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Domain precondition failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The action needs a current meeting but the room has none.
    #[error("No meeting is currently associated with this room")]
    NoCurrentMeeting,

    /// The requested calendar is not part of the synced calendar set.
    #[error("Unknown calendar: {0}")]
    UnknownCalendar(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
