//! # Device Runtime
//!
//! Main orchestrator for one display process. Owns the state store, the
//! observed API and every background task.
//!
//! ## Runtime Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        DeviceRuntime Architecture                       │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                         DeviceRuntime                            │  │
//! │  │                                                                  │  │
//! │  │  • initialize(): register, start clock/sync/watchdog             │  │
//! │  │  • all-calendars view, full screen, disconnect                   │  │
//! │  │  • actions(): the meeting action pipeline                        │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │ Arc<RuntimeContext>                     │
//! │         ┌──────────────┬──────┴───────┬──────────────┐                  │
//! │         ▼              ▼              ▼              ▼                   │
//! │  ┌────────────┐ ┌────────────┐ ┌────────────┐ ┌────────────┐           │
//! │  │ Sync loop  │ │  Clock     │ │ Watchdog   │ │ Actions    │           │
//! │  └─────┬──────┘ └────────────┘ └─────┬──────┘ └─────┬──────┘           │
//! │        │                             │              │                   │
//! │        └─────────────┬───────────────┴──────────────┘                   │
//! │                      ▼                                                  │
//! │        ConnectivityObserver ──► RemoteApi (HTTP)                        │
//! │                                                                         │
//! │  SHARED: StateStore (watch channel) • EpochRegistry • DeviceHost        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use roomboard_core::booking::{quick_booking_options, BookingOption};
use roomboard_core::{AppState, DeviceSnapshot, PollSchedule};

use crate::actions::ActionPipeline;
use crate::api::{HttpApi, RemoteApi};
use crate::config::RoomboardConfig;
use crate::epoch::EpochRegistry;
use crate::error::{SyncError, SyncResult};
use crate::host::{DeviceHost, NoOpHost};
use crate::observer::ConnectivityObserver;
use crate::store::StateStore;
use crate::{clock, sync, watchdog};

// =============================================================================
// Runtime Context
// =============================================================================

/// Everything a background task needs, shared behind one `Arc`.
pub(crate) struct RuntimeContext {
    pub(crate) config: Arc<RoomboardConfig>,

    pub(crate) store: StateStore,

    /// The observed API; raw transport is never reachable from here.
    pub(crate) api: Arc<dyn RemoteApi>,

    pub(crate) epochs: EpochRegistry,

    pub(crate) host: Arc<dyn DeviceHost>,

    pub(crate) schedule: PollSchedule,

    /// Meetings the auto-checkout already deleted (or is deleting).
    pub(crate) checked_out: Mutex<HashSet<String>>,

    /// Last interaction with the all-calendars view.
    pub(crate) last_activity: Mutex<Instant>,

    pub(crate) shutdown: watch::Receiver<bool>,
}

impl RuntimeContext {
    /// Language first, then the snapshot itself.
    pub(crate) fn apply_device_data(&self, snapshot: DeviceSnapshot) {
        if let Some(language) = snapshot.language.as_deref() {
            self.host.change_language(language);
        }
        self.store.update_device_data(snapshot);
    }

    pub(crate) fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }
}

// =============================================================================
// Device Runtime
// =============================================================================

/// One display process worth of runtime.
pub struct DeviceRuntime {
    ctx: Arc<RuntimeContext>,

    actions: ActionPipeline,

    shutdown_tx: watch::Sender<bool>,
}

impl DeviceRuntime {
    /// Creates a runtime talking HTTP to the configured API.
    pub fn new(config: RoomboardConfig, host: Arc<dyn DeviceHost>) -> SyncResult<Self> {
        DeviceRuntimeBuilder::new(config).with_host(host).build()
    }

    fn from_parts(
        config: RoomboardConfig,
        api: Arc<dyn RemoteApi>,
        host: Arc<dyn DeviceHost>,
    ) -> Self {
        let store = StateStore::default();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let ctx = Arc::new(RuntimeContext {
            schedule: config.poll_schedule(),
            config: Arc::new(config),
            api: Arc::new(ConnectivityObserver::new(api, store.clone())),
            store,
            epochs: EpochRegistry::new(),
            host,
            checked_out: Mutex::new(HashSet::new()),
            last_activity: Mutex::new(Instant::now()),
            shutdown: shutdown_rx,
        });

        DeviceRuntime {
            actions: ActionPipeline::new(ctx.clone()),
            ctx,
            shutdown_tx,
        }
    }

    // =========================================================================
    // State Access
    // =========================================================================

    pub fn store(&self) -> &StateStore {
        &self.ctx.store
    }

    pub fn state(&self) -> AppState {
        self.ctx.store.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.ctx.store.subscribe()
    }

    /// Meeting mutations (create, cancel, end, check in, extend, start early).
    pub fn actions(&self) -> &ActionPipeline {
        &self.actions
    }

    /// Quick booking buttons for the displayed room.
    pub fn quick_booking_options(&self) -> Vec<BookingOption> {
        self.ctx
            .store
            .read(|s| quick_booking_options(s.minutes_available_till_next_meeting()))
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Registers the device if needed and starts every background task.
    ///
    /// Does nothing when called again.
    pub async fn initialize(&self) -> SyncResult<()> {
        if self.ctx.is_shutting_down() {
            return Err(SyncError::ShuttingDown);
        }
        if !self.ctx.store.mark_initialized() {
            debug!("Runtime already initialized");
            return Ok(());
        }

        info!(
            device = %self.ctx.config.device.name,
            version = %self.ctx.config.client_version(),
            "Initializing device runtime"
        );

        watchdog::start(&self.ctx);

        match self.ctx.api.get_device_details(false).await {
            Ok(_) => self.ctx.store.mark_registered(),
            Err(e) if e.is_forbidden() || e.is_not_found() => {
                info!(status = ?e.status(), "Device unknown to the API, registering");
                match self.ctx.api.create_device().await {
                    Ok(()) => self.ctx.store.mark_registered(),
                    Err(e) => error!(error = %e, "Device registration failed"),
                }
            }
            Err(e) => warn!(error = %e, "Initial device probe failed"),
        }

        clock::start(&self.ctx);
        sync::start(&self.ctx);

        self.ctx.store.set_full_screen(self.ctx.host.full_screen());

        info!("Device runtime started");
        Ok(())
    }

    /// Unregisters the device, then reloads. A failed removal does not reload.
    pub async fn disconnect_device(&self) -> SyncResult<()> {
        info!("Disconnecting device");
        self.ctx.api.remove_device().await?;
        self.ctx.host.reload();
        Ok(())
    }

    /// Stops every background task. Results still in flight are dropped.
    pub fn shutdown(&self) {
        info!("Shutting down device runtime");
        self.ctx.epochs.invalidate_all();
        let _ = self.shutdown_tx.send(true);
    }

    // =========================================================================
    // All-Calendars View
    // =========================================================================

    /// Opens the all-calendars view and closes it again after a quiet period.
    ///
    /// Resolves once the view is closed.
    pub async fn show_all_calendars_view(&self) {
        self.ctx.store.set_show_all_calendars(true);
        self.touch_all_calendars_view();

        sync::sync_now(&self.ctx, true).await;

        if self.wait_for_inactivity().await {
            debug!("All-calendars view idle, closing");
            self.close_all_calendars_view();
        }
    }

    /// Records user activity in the all-calendars view.
    pub fn touch_all_calendars_view(&self) {
        let mut last = self
            .ctx
            .last_activity
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        *last = Instant::now();
    }

    pub fn close_all_calendars_view(&self) {
        self.ctx.store.end_action();
        self.ctx.store.set_show_all_calendars(false);
    }

    /// Waits until nothing touched the view for the idle period. Returns false
    /// if the view was closed some other way, or the runtime shut down.
    async fn wait_for_inactivity(&self) -> bool {
        let idle = self.ctx.config.all_calendars_idle();
        let mut shutdown = self.ctx.shutdown.clone();

        loop {
            if !self.ctx.store.read(|s| s.show_all_calendars) || self.ctx.is_shutting_down() {
                return false;
            }
            let deadline = *self
                .ctx
                .last_activity
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                + idle;
            if Instant::now() >= deadline {
                return true;
            }
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => {}
                _ = shutdown.changed() => return false,
            }
        }
    }

    // =========================================================================
    // Full Screen
    // =========================================================================

    pub fn toggle_full_screen(&self) {
        if !self.ctx.store.read(|s| s.full_screen.supported) {
            debug!("Full screen not supported by host");
            return;
        }
        self.ctx
            .store
            .set_full_screen(self.ctx.host.toggle_full_screen());
    }

    #[cfg(test)]
    pub(crate) fn context(&self) -> Arc<RuntimeContext> {
        self.ctx.clone()
    }
}

impl Drop for DeviceRuntime {
    fn drop(&mut self) {
        self.ctx.epochs.invalidate_all();
        let _ = self.shutdown_tx.send(true);
    }
}

// =============================================================================
// Builder Pattern
// =============================================================================

/// Builder for creating a DeviceRuntime with options.
pub struct DeviceRuntimeBuilder {
    config: RoomboardConfig,
    api: Option<Arc<dyn RemoteApi>>,
    host: Option<Arc<dyn DeviceHost>>,
}

impl DeviceRuntimeBuilder {
    pub fn new(config: RoomboardConfig) -> Self {
        DeviceRuntimeBuilder {
            config,
            api: None,
            host: None,
        }
    }

    /// Replaces the HTTP client (tests, alternative transports).
    pub fn with_api(mut self, api: Arc<dyn RemoteApi>) -> Self {
        self.api = Some(api);
        self
    }

    pub fn with_host(mut self, host: Arc<dyn DeviceHost>) -> Self {
        self.host = Some(host);
        self
    }

    pub fn build(self) -> SyncResult<DeviceRuntime> {
        self.config.validate()?;

        let api = match self.api {
            Some(api) => api,
            None => Arc::new(HttpApi::new(&self.config)?),
        };
        let host = self.host.unwrap_or_else(|| Arc::new(NoOpHost));

        Ok(DeviceRuntime::from_parts(self.config, api, host))
    }
}
