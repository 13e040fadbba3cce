//! Clock service: publishes "now" into state on a fixed cadence.

use chrono::Utc;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::epoch::Operation;
use crate::runtime::RuntimeContext;

/// Publishes the time immediately, then on every tick.
pub(crate) fn start(ctx: &Arc<RuntimeContext>) -> JoinHandle<()> {
    ctx.store.update_clock(Utc::now());

    let token = ctx.epochs.issue(Operation::Clock);
    let tick = ctx.config.clock_tick();
    let ctx = ctx.clone();

    tokio::spawn(async move {
        let mut shutdown = ctx.shutdown.clone();
        let mut ticker = tokio::time::interval(tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // First tick completes immediately; already published above
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => break,
            }
            if token.is_stale() {
                break;
            }
            ctx.store.update_clock(Utc::now());
        }
    })
}
