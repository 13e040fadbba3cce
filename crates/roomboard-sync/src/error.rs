//! # Runtime Error Types
//!
//! Error types for remote calls and runtime operations.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Runtime Error Categories                           │
//! │                                                                         │
//! │  ApiError (one remote call)                                            │
//! │  ├── Network   - no response at all        → offline flag              │
//! │  ├── Status    - response with a status    → per-status handling       │
//! │  └── Decode    - unreadable or wrong body   → opaque                   │
//! │                                                                         │
//! │  SyncError (runtime operations)                                        │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │     Remote      │  │      Actions            │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Api            │  │  NothingToRetry         │ │
//! │  │  MissingToken   │  │                 │  │  RetryNotSupported      │ │
//! │  │  InvalidUrl     │  │                 │  │  Core (validation)      │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use roomboard_core::CoreError;
use thiserror::Error;

/// Result type alias for runtime operations.
pub type SyncResult<T> = Result<T, SyncError>;

// =============================================================================
// API Error
// =============================================================================

/// Failure of a single device API call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request never got a response (DNS, refused, reset, timeout).
    #[error("No response from device API: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("Device API returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The server answered, but the body was not what we expected.
    #[error("Unexpected device API response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when there was no response object at all.
    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network(_))
    }

    pub fn is_forbidden(&self) -> bool {
        self.status() == Some(403)
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_payment_required(&self) -> bool {
        self.status() == Some(402)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        // A failed body read still means a response arrived
        if err.is_decode() || err.is_body() {
            ApiError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ApiError::Status {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

// =============================================================================
// Sync Error
// =============================================================================

/// Runtime error type.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The device token is what the API knows this display by.
    #[error("Device token not configured")]
    MissingDeviceToken,

    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Remote Errors
    // =========================================================================
    #[error(transparent)]
    Api(#[from] ApiError),

    // =========================================================================
    // Action Errors
    // =========================================================================
    #[error(transparent)]
    Core(#[from] CoreError),

    /// `retry()` was called while the slot holds no failed action.
    #[error("No failed action to retry")]
    NothingToRetry,

    #[error("Action {0} cannot be retried")]
    RetryNotSupported(&'static str),

    // =========================================================================
    // Lifecycle Errors
    // =========================================================================
    #[error("Device runtime is shutting down")]
    ShuttingDown,
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for SyncError {
    fn from(err: toml::ser::Error) -> Self {
        SyncError::ConfigSaveFailed(err.to_string())
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        SyncError::Api(err.into())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl SyncError {
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidConfig(_)
                | SyncError::MissingDeviceToken
                | SyncError::InvalidUrl(_)
                | SyncError::ConfigLoadFailed(_)
                | SyncError::ConfigSaveFailed(_)
        )
    }
}
