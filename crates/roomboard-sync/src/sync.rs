//! # Device Sync Loop
//!
//! Polls the device API on an adaptive interval and reconciles the answer
//! into shared state.
//!
//! ## Cycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Sync Loop States                                │
//! │                                                                         │
//! │   issue(DeviceSync)                                                     │
//! │        │                                                                │
//! │        ▼                                                                │
//! │   ┌──────────┐   Ok(snapshot)   version differs? ──yes──► reload, STOP  │
//! │   │ fetching │ ───────────────► stale? ──yes──► STOP (newer one wins)   │
//! │   └────┬─────┘                  apply, subscription ok, auto-checkout   │
//! │        │ Err                                                            │
//! │        ▼                                                                │
//! │   stale? ──yes──► STOP                                                  │
//! │   404 ─► removed    402 ─► subscription cancelled    else ─► log        │
//! │        │                                                                │
//! │        ▼                                                                │
//! │   ┌───────────┐  delay_for(state)   stale? ──yes──► STOP               │
//! │   │ scheduled │ ──────────────────► issue(DeviceSync), fetch again      │
//! │   └───────────┘                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Staleness is checked after every `.await` and nowhere else. Anything that
//! wants the loop to fetch now (the all-calendars view, auto-checkout) calls
//! [`sync_now`], which supersedes the running loop and continues as the new
//! one.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use roomboard_core::DisplayMode;

use crate::checkout;
use crate::epoch::{EpochToken, Operation};
use crate::runtime::RuntimeContext;

/// How one fetch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CycleOutcome {
    /// Snapshot applied to state.
    Applied,
    /// Fetch failed; state reflects what the failure means.
    Failed,
    /// A newer invocation took over; nothing was written.
    Superseded,
    /// Version drift; the host is reloading.
    Reloaded,
}

/// Starts the loop in the background.
pub(crate) fn start(ctx: &Arc<RuntimeContext>) -> JoinHandle<()> {
    let ctx = ctx.clone();
    tokio::spawn(async move {
        sync_now(&ctx, false).await;
    })
}

/// Fetches right away, superseding any in-flight fetch and sleeping loop,
/// then keeps polling in the background.
pub(crate) async fn sync_now(ctx: &Arc<RuntimeContext>, expand_calendars: bool) -> CycleOutcome {
    let token = ctx.epochs.issue(Operation::DeviceSync);
    let outcome = run_cycle(ctx, &token, expand_calendars).await;

    if matches!(outcome, CycleOutcome::Applied | CycleOutcome::Failed) {
        tokio::spawn(poll(ctx.clone(), token));
    }
    outcome
}

/// Sleep, re-check, fetch, forever (or until superseded).
async fn poll(ctx: Arc<RuntimeContext>, mut token: EpochToken) {
    let mut shutdown = ctx.shutdown.clone();

    loop {
        let delay = ctx.store.read(|s| ctx.schedule.delay_for(s));
        debug!(delay_secs = delay.as_secs(), "Next device sync scheduled");

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = shutdown.changed() => return,
        }
        if token.is_stale() {
            debug!("Sync loop superseded while sleeping");
            return;
        }

        token = ctx.epochs.issue(Operation::DeviceSync);
        match run_cycle(&ctx, &token, false).await {
            CycleOutcome::Applied | CycleOutcome::Failed => {}
            CycleOutcome::Superseded | CycleOutcome::Reloaded => return,
        }
    }
}

/// One fetch-and-reconcile. Never fails: every error ends up in state or the log.
async fn run_cycle(
    ctx: &Arc<RuntimeContext>,
    token: &EpochToken,
    expand_calendars: bool,
) -> CycleOutcome {
    let expand = expand_calendars
        || ctx
            .store
            .read(|s| s.display_mode() == DisplayMode::AllCalendars);

    let result = ctx.api.get_device_details(expand).await;

    match result {
        Ok(snapshot) => {
            if let Some(server_version) = snapshot.version.as_deref() {
                if server_version != ctx.config.client_version() {
                    info!(
                        running = %ctx.config.client_version(),
                        server = %server_version,
                        "Client version out of date, reloading"
                    );
                    ctx.host.reload();
                    return CycleOutcome::Reloaded;
                }
            }
            if token.is_stale() {
                debug!(epoch = token.epoch(), "Dropping superseded device snapshot");
                return CycleOutcome::Superseded;
            }

            ctx.apply_device_data(snapshot);
            ctx.store.set_subscription_cancelled(false);
            checkout::check(ctx);
            CycleOutcome::Applied
        }
        Err(e) => {
            if token.is_stale() {
                debug!(epoch = token.epoch(), error = %e, "Dropping superseded sync failure");
                return CycleOutcome::Superseded;
            }
            if e.is_not_found() {
                warn!("Device was removed from the account");
                ctx.store.mark_removed();
            } else if e.is_payment_required() {
                warn!("Subscription cancelled");
                ctx.store.set_subscription_cancelled(true);
            } else {
                warn!(error = %e, "Device sync failed");
            }
            CycleOutcome::Failed
        }
    }
}
