//! # Roomboard Display Library
//!
//! Supervises the device runtime for one physical display.
//!
//! ## Module Organization
//! ```text
//! roomboard_display_lib/
//! ├── lib.rs          ◄─── You are here (supervisor loop, host, logging)
//! └── main.rs         ◄─── Binary entry point
//! ```
//!
//! ## Reload Handling
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Display Supervisor                               │
//! │                                                                         │
//! │  ┌──────────┐    ┌────────────┐    ┌──────────────────────────────┐    │
//! │  │  build   │───►│ initialize │───►│ wait: signal │ reload        │    │
//! │  └──────────┘    └────────────┘    └──────┬───────┴──────┬───────┘    │
//! │       ▲                                   │              │             │
//! │       │                                signal         reload           │
//! │       │                                   ▼              │             │
//! │       │                              shutdown, exit      │             │
//! │       └──────────────── shutdown, fresh runtime ◄────────┘             │
//! │                                                                         │
//! │  A reload throws away all in-memory state, like restarting the         │
//! │  process, but keeps the device token from the config file.             │
//! │                                                                         │
//! │  RELOAD BACKOFF:                                                        │
//! │  Runtime up < 60s  ─► wait 1s, 2s, 4s, ... (max 5 min) before rebuild   │
//! │  Runtime up ≥ 60s  ─► rebuild at once, backoff starts over              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::future::Future;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use tokio::sync::{watch, Notify};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use roomboard_core::{AppState, FullScreenState, Screen};
use roomboard_sync::{DeviceHost, DeviceRuntime, RoomboardConfig};

/// Runs the display until SIGINT/SIGTERM.
pub async fn run() {
    init_tracing();

    info!("Starting Roomboard display");

    let host = Arc::new(DisplayHost::new());
    let mut backoff = ReloadBackoff::new();

    loop {
        let started = Instant::now();
        let runtime = match DeviceRuntime::new(load_config(), host.clone()) {
            Ok(runtime) => runtime,
            Err(e) if e.is_config_error() => {
                error!(error = %e, "Invalid display configuration");
                return;
            }
            Err(e) => {
                error!(error = %e, "Could not build device runtime");
                return;
            }
        };

        if let Err(e) = runtime.initialize().await {
            error!(error = %e, "Device runtime failed to initialize");
        }
        let screens = tokio::spawn(log_screens(runtime.subscribe()));

        let reload = tokio::select! {
            _ = shutdown_signal() => false,
            _ = host.reload_requested() => true,
        };

        runtime.shutdown();
        screens.abort();

        if !reload {
            break;
        }

        let delay = backoff.next_delay(started.elapsed());
        info!(?delay, "Reloading display");
        if !wait_before_restart(delay, shutdown_signal()).await {
            break;
        }
    }

    info!("Display shutdown complete");
}

/// Sleeps out `delay` unless `shutdown` resolves first.
///
/// Returns `false` when the display should exit instead of restarting.
async fn wait_before_restart(delay: Duration, shutdown: impl Future<Output = ()>) -> bool {
    if delay.is_zero() {
        return true;
    }
    tokio::select! {
        _ = tokio::time::sleep(delay) => true,
        _ = shutdown => {
            info!("Shutdown during reload backoff");
            false
        }
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=roomboard_sync=trace` - Trace the runtime only
/// - Default: INFO, DEBUG for roomboard crates
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,roomboard_sync=debug,roomboard_display_lib=debug"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Loads the config, writing it out on first run so the generated device
/// token survives restarts.
///
/// Set `ROOMBOARD_CONFIG` to use a custom path.
fn load_config() -> RoomboardConfig {
    let path = std::env::var_os("ROOMBOARD_CONFIG")
        .map(PathBuf::from)
        .or_else(RoomboardConfig::default_config_path);
    let first_run = path.as_ref().is_some_and(|p| !p.exists());

    let config = RoomboardConfig::load_or_default(path.clone());
    if first_run {
        if let Err(e) = config.save(path) {
            warn!(error = %e, "Could not persist display config");
        }
    }
    config
}

/// Logs every change of the rendered screen.
async fn log_screens(mut updates: watch::Receiver<AppState>) {
    let mut shown: Option<Screen> = None;
    loop {
        let screen = updates.borrow_and_update().screen();
        if shown.as_ref() != Some(&screen) {
            info!(?screen, "Screen changed");
            shown = Some(screen);
        }
        if updates.changed().await.is_err() {
            break;
        }
    }
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

// =============================================================================
// Reload Backoff
// =============================================================================

/// A runtime that stayed up this long counts as healthy.
const STABLE_UPTIME: Duration = Duration::from_secs(60);

/// Paces runtime rebuilds so a reload that keeps firing right after start
/// (say a version the server never settles on) cannot spin the display.
pub struct ReloadBackoff {
    backoff: ExponentialBackoff,
}

impl ReloadBackoff {
    pub fn new() -> Self {
        let initial = Duration::from_secs(1);
        Self {
            backoff: ExponentialBackoff {
                initial_interval: initial,
                current_interval: initial,
                randomization_factor: 0.2,
                multiplier: 2.0,
                max_interval: Duration::from_secs(5 * 60),
                max_elapsed_time: None,
                ..Default::default()
            },
        }
    }

    /// Delay before the next runtime is built, given how long the last one ran.
    pub fn next_delay(&mut self, uptime: Duration) -> Duration {
        if uptime >= STABLE_UPTIME {
            self.backoff.reset();
            return Duration::ZERO;
        }
        self.backoff
            .next_backoff()
            .unwrap_or(self.backoff.max_interval)
    }
}

impl Default for ReloadBackoff {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Display Host
// =============================================================================

/// Host for a headless display: reloads restart the runtime in-process.
#[derive(Default)]
pub struct DisplayHost {
    reload: Notify,
    language: Mutex<Option<String>>,
}

impl DisplayHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves once `reload` has been called. A reload requested while
    /// nobody waits is kept for the next waiter.
    pub async fn reload_requested(&self) {
        self.reload.notified().await;
    }

    pub fn language(&self) -> Option<String> {
        self.language
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl DeviceHost for DisplayHost {
    fn reload(&self) {
        info!("Display reload requested");
        self.reload.notify_one();
    }

    fn change_language(&self, language: &str) {
        let mut current = self.language.lock().unwrap_or_else(|e| e.into_inner());
        if current.as_deref() != Some(language) {
            debug!(language, "Display language changed");
            *current = Some(language.to_string());
        }
    }

    fn full_screen(&self) -> FullScreenState {
        // Headless: the output is always the whole screen
        FullScreenState {
            supported: false,
            active: true,
        }
    }
}
