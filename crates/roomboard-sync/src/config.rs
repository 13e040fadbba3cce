//! # Runtime Configuration
//!
//! Configuration management for the display runtime.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     ROOMBOARD_DEVICE_TOKEN=3f2c…                                       │
//! │     ROOMBOARD_API_URL=https://api.roomboard.example                    │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/roomboard-display/display.toml (Linux)                   │
//! │     ~/Library/Application Support/com.roomboard.display/display.toml   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     generated device token, production API URL                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # display.toml
//! [device]
//! token = "550e8400-e29b-41d4-a716-446655440000"
//! name = "Aurora entrance"
//!
//! [api]
//! base_url = "https://api.roomboard.example"
//! request_timeout_secs = 15
//!
//! [polling]
//! removed_secs = 31536000
//! subscription_cancelled_secs = 600
//! steady_secs = 30
//! active_secs = 5
//!
//! [watchdog]
//! interval_secs = 300
//!
//! [clock]
//! tick_secs = 1
//!
//! [views]
//! all_calendars_idle_secs = 30
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use roomboard_core::PollSchedule;

use crate::error::{SyncError, SyncResult};

/// Longest accepted interval or timeout (one leap year).
pub const MAX_INTERVAL_SECS: u64 = 366 * 24 * 60 * 60;

// =============================================================================
// Device Configuration
// =============================================================================

/// Identity of this display towards the device API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Opaque device token (UUID v4), sent as the bearer credential.
    /// Auto-generated on first run if not provided.
    pub token: String,

    /// Human-readable name, only used in logs.
    #[serde(default = "default_device_name")]
    pub name: String,
}

fn default_device_name() -> String {
    "Room display".to_string()
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig {
            token: Uuid::new_v4().to_string(),
            name: default_device_name(),
        }
    }
}

// =============================================================================
// API Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL of the device API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (seconds). A timed out request counts as no response.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.roomboard.app".to_string()
}

fn default_request_timeout() -> u64 {
    15
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

// =============================================================================
// Polling Settings
// =============================================================================

/// Sync loop delays, see [`PollSchedule`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingSettings {
    #[serde(default = "default_removed_secs")]
    pub removed_secs: u64,

    #[serde(default = "default_cancelled_secs")]
    pub subscription_cancelled_secs: u64,

    /// Dashboard devices and devices showing their room.
    #[serde(default = "default_steady_secs")]
    pub steady_secs: u64,

    #[serde(default = "default_active_secs")]
    pub active_secs: u64,
}

fn default_removed_secs() -> u64 {
    365 * 24 * 60 * 60
}
fn default_cancelled_secs() -> u64 {
    10 * 60
}
fn default_steady_secs() -> u64 {
    30
}
fn default_active_secs() -> u64 {
    5
}

impl Default for PollingSettings {
    fn default() -> Self {
        PollingSettings {
            removed_secs: default_removed_secs(),
            subscription_cancelled_secs: default_cancelled_secs(),
            steady_secs: default_steady_secs(),
            active_secs: default_active_secs(),
        }
    }
}

// =============================================================================
// Watchdog / Clock / Views
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchdogSettings {
    /// How often the API version is checked (seconds).
    #[serde(default = "default_watchdog_interval")]
    pub interval_secs: u64,
}

fn default_watchdog_interval() -> u64 {
    5 * 60
}

impl Default for WatchdogSettings {
    fn default() -> Self {
        WatchdogSettings {
            interval_secs: default_watchdog_interval(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockSettings {
    #[serde(default = "default_tick")]
    pub tick_secs: u64,
}

fn default_tick() -> u64 {
    1
}

impl Default for ClockSettings {
    fn default() -> Self {
        ClockSettings {
            tick_secs: default_tick(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewSettings {
    /// The all-calendars view closes after this much inactivity (seconds).
    #[serde(default = "default_all_calendars_idle")]
    pub all_calendars_idle_secs: u64,
}

fn default_all_calendars_idle() -> u64 {
    30
}

impl Default for ViewSettings {
    fn default() -> Self {
        ViewSettings {
            all_calendars_idle_secs: default_all_calendars_idle(),
        }
    }
}

/// The build this process runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSettings {
    /// Compared against the version the server reports on every sync.
    #[serde(default = "default_client_version")]
    pub version: String,
}

fn default_client_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

impl Default for ClientSettings {
    fn default() -> Self {
        ClientSettings {
            version: default_client_version(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete display configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoomboardConfig {
    #[serde(default)]
    pub device: DeviceConfig,

    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub polling: PollingSettings,

    #[serde(default)]
    pub watchdog: WatchdogSettings,

    #[serde(default)]
    pub clock: ClockSettings,

    #[serde(default)]
    pub views: ViewSettings,

    #[serde(default)]
    pub client: ClientSettings,
}

impl RoomboardConfig {
    /// Creates a new config with defaults and a generated device token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (display.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading display config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load display config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SyncResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SyncError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Display config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        if self.device.token.trim().is_empty() {
            return Err(SyncError::MissingDeviceToken);
        }

        let url = url::Url::parse(&self.api.base_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SyncError::InvalidUrl(format!(
                "API URL must start with http:// or https://, got: {}",
                self.api.base_url
            )));
        }

        let intervals = [
            ("api.request_timeout_secs", self.api.request_timeout_secs),
            ("polling.removed_secs", self.polling.removed_secs),
            (
                "polling.subscription_cancelled_secs",
                self.polling.subscription_cancelled_secs,
            ),
            ("polling.steady_secs", self.polling.steady_secs),
            ("polling.active_secs", self.polling.active_secs),
            ("watchdog.interval_secs", self.watchdog.interval_secs),
            ("clock.tick_secs", self.clock.tick_secs),
            ("views.all_calendars_idle_secs", self.views.all_calendars_idle_secs),
        ];
        if let Some((name, _)) = intervals.iter().find(|(_, secs)| *secs == 0) {
            return Err(SyncError::InvalidConfig(format!(
                "{} must be greater than 0",
                name
            )));
        }
        if let Some((name, _)) = intervals.iter().find(|(_, secs)| *secs > MAX_INTERVAL_SECS) {
            return Err(SyncError::InvalidConfig(format!(
                "{} must be at most {} seconds",
                name, MAX_INTERVAL_SECS
            )));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(token) = std::env::var("ROOMBOARD_DEVICE_TOKEN") {
            debug!("Overriding device token from environment");
            self.device.token = token;
        }

        if let Ok(name) = std::env::var("ROOMBOARD_DEVICE_NAME") {
            self.device.name = name;
        }

        if let Ok(url) = std::env::var("ROOMBOARD_API_URL") {
            debug!(url = %url, "Overriding API URL from environment");
            self.api.base_url = url;
        }

        if let Ok(timeout) = std::env::var("ROOMBOARD_API_TIMEOUT_SECS") {
            match timeout.parse::<u64>() {
                Ok(secs) => self.api.request_timeout_secs = secs,
                Err(_) => warn!(value = %timeout, "Ignoring invalid ROOMBOARD_API_TIMEOUT_SECS"),
            }
        }

        if let Ok(interval) = std::env::var("ROOMBOARD_WATCHDOG_INTERVAL_SECS") {
            if let Ok(secs) = interval.parse::<u64>() {
                self.watchdog.interval_secs = secs;
            }
        }

        if let Ok(version) = std::env::var("ROOMBOARD_CLIENT_VERSION") {
            debug!(version = %version, "Overriding client version from environment");
            self.client.version = version;
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "roomboard", "display")
            .map(|dirs| dirs.config_dir().join("display.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn device_token(&self) -> &str {
        &self.device.token
    }

    pub fn client_version(&self) -> &str {
        &self.client.version
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.request_timeout_secs)
    }

    pub fn poll_schedule(&self) -> PollSchedule {
        PollSchedule {
            removed: Duration::from_secs(self.polling.removed_secs),
            subscription_cancelled: Duration::from_secs(self.polling.subscription_cancelled_secs),
            steady: Duration::from_secs(self.polling.steady_secs),
            active: Duration::from_secs(self.polling.active_secs),
        }
    }

    pub fn watchdog_interval(&self) -> Duration {
        Duration::from_secs(self.watchdog.interval_secs)
    }

    pub fn clock_tick(&self) -> Duration {
        Duration::from_secs(self.clock.tick_secs)
    }

    pub fn all_calendars_idle(&self) -> Duration {
        Duration::from_secs(self.views.all_calendars_idle_secs)
    }
}
