//! # Version Watchdog
//!
//! Reloads the display once the API reports a different version than it
//! did earlier in this process.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │  t=0     version "4.1"  → baseline, no reload                        │
//! │  t=5m    version "4.1"  → same                                       │
//! │  t=10m   (error)        → logged, baseline kept                      │
//! │  t=15m   version "4.2"  → differs → reload, watchdog stops           │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::epoch::Operation;
use crate::runtime::RuntimeContext;

/// First observed version and comparison against it.
#[derive(Debug, Default)]
pub struct VersionBaseline {
    baseline: Option<String>,
}

impl VersionBaseline {
    /// Records `version`; true if it differs from an earlier observation.
    ///
    /// Responses without a version are ignored.
    pub fn observe(&mut self, version: Option<&str>) -> bool {
        let Some(version) = version else {
            return false;
        };
        match self.baseline.as_deref() {
            None => {
                debug!(version, "API version baseline recorded");
                self.baseline = Some(version.to_string());
                false
            }
            Some(known) => known != version,
        }
    }
}

/// Checks right away, then every configured interval.
pub(crate) fn start(ctx: &Arc<RuntimeContext>) -> JoinHandle<()> {
    let token = ctx.epochs.issue(Operation::VersionWatchdog);
    let interval = ctx.config.watchdog_interval();
    let ctx = ctx.clone();

    tokio::spawn(async move {
        let mut shutdown = ctx.shutdown.clone();
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut baseline = VersionBaseline::default();

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => return,
            }
            if token.is_stale() {
                return;
            }

            let result = ctx.api.get_api_version().await;
            if token.is_stale() {
                return;
            }

            match result {
                Ok(version) => {
                    if baseline.observe(version.version.as_deref()) {
                        info!(version = ?version.version, "API version changed, reloading");
                        ctx.host.reload();
                        return;
                    }
                }
                Err(e) => debug!(error = %e, "Version check failed"),
            }
        }
    })
}
