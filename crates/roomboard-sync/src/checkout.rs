//! # Auto-Checkout Guard
//!
//! Releases a room whose meeting nobody checked in to.
//!
//! Runs after every applied sync. If the current meeting's check-in deadline
//! is strictly in the past and it is not checked in, the meeting is deleted
//! silently and a fresh sync is started to show the freed room.
//!
//! A meeting id is only ever deleted once per process; a failed deletion is
//! forgotten so the next sync can try again.

use std::sync::Arc;
use tracing::{info, warn};

use crate::runtime::RuntimeContext;
use crate::sync;

/// Deletes the overdue meeting, if any, in the background.
pub(crate) fn check(ctx: &Arc<RuntimeContext>) {
    let Some(meeting_id) = ctx
        .store
        .read(|s| s.overdue_meeting().map(|m| m.id.clone()))
    else {
        return;
    };

    let first_time = ctx
        .checked_out
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .insert(meeting_id.clone());
    if !first_time {
        return;
    }

    info!(meeting_id = %meeting_id, "Check-in deadline passed, releasing room");

    let ctx = ctx.clone();
    tokio::spawn(async move {
        match ctx.api.delete_meeting(&meeting_id, true).await {
            Ok(()) => {
                sync::sync_now(&ctx, false).await;
            }
            Err(e) => {
                warn!(meeting_id = %meeting_id, error = %e, "Auto-checkout failed");
                ctx.checked_out
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .remove(&meeting_id);
            }
        }
    });
}
