//! # Meeting Action Pipeline
//!
//! Runs one room-state-changing operation at a time through the action slot.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Action Execution                                  │
//! │                                                                         │
//! │  validate ─► start (slot = running, new ticket)                         │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │            remote call ───────────────┐                                 │
//! │                 │                     │                                 │
//! │                 ▼                     ▼                                 │
//! │          fetch + apply          fetch + apply      (always, both paths) │
//! │                 │                     │                                 │
//! │                 ▼                     ▼                                 │
//! │          clear the slot        slot = error(status)                     │
//! │                                       │                                 │
//! │                                 retry() replays the stored descriptor   │
//! │                                                                         │
//! │  Cross-room create: success is shown (slot = success), never retried.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The refresh is the action's own fetch, applied whatever the sync loop is
//! doing at the time, so the slot never clears before the refreshed data
//! has landed.
//!
//! Errors from the device API never escape: they land in the slot. Only
//! precondition failures (no current meeting, invalid input) are returned.

use std::sync::Arc;
use tracing::{debug, info, warn};

use roomboard_core::{ActionSource, CoreError, MeetingAction};

use crate::error::{ApiError, SyncError, SyncResult};
use crate::runtime::RuntimeContext;

/// Meeting mutations for the displayed room.
pub struct ActionPipeline {
    ctx: Arc<RuntimeContext>,
}

impl ActionPipeline {
    pub(crate) fn new(ctx: Arc<RuntimeContext>) -> Self {
        Self { ctx }
    }

    // =========================================================================
    // Actions
    // =========================================================================

    /// Books the displayed room from now for `duration_minutes`.
    pub async fn create_meeting(
        &self,
        duration_minutes: u32,
        source: Option<ActionSource>,
    ) -> SyncResult<()> {
        let room_name = self
            .ctx
            .store
            .read(|s| s.calendar_name().unwrap_or_default().to_string());
        let title = self.ctx.host.quick_meeting_title(&room_name);
        self.run(
            MeetingAction::Create {
                duration_minutes,
                title,
            },
            source,
        )
        .await
    }

    pub async fn cancel_meeting(&self, source: Option<ActionSource>) -> SyncResult<()> {
        let meeting_id = self.current_meeting_id()?;
        self.run(MeetingAction::Cancel { meeting_id }, source).await
    }

    pub async fn end_meeting(&self, source: Option<ActionSource>) -> SyncResult<()> {
        let meeting_id = self.current_meeting_id()?;
        self.run(MeetingAction::End { meeting_id }, source).await
    }

    pub async fn check_in(&self, source: Option<ActionSource>) -> SyncResult<()> {
        let meeting_id = self.current_meeting_id()?;
        self.run(MeetingAction::CheckIn { meeting_id }, source).await
    }

    pub async fn extend_meeting(
        &self,
        minutes: u32,
        source: Option<ActionSource>,
    ) -> SyncResult<()> {
        let meeting_id = self.current_meeting_id()?;
        self.run(MeetingAction::Extend { meeting_id, minutes }, source)
            .await
    }

    pub async fn start_early(&self, source: Option<ActionSource>) -> SyncResult<()> {
        let meeting_id = self.current_meeting_id()?;
        self.run(MeetingAction::StartEarly { meeting_id }, source)
            .await
    }

    /// Books another room from the all-calendars view.
    pub async fn create_meeting_in_another_room(
        &self,
        calendar_id: &str,
        duration_minutes: u32,
        source: Option<ActionSource>,
    ) -> SyncResult<()> {
        let room_name = self
            .ctx
            .store
            .read(|s| s.calendar_name_for(calendar_id).map(str::to_string))
            .ok_or_else(|| CoreError::UnknownCalendar(calendar_id.to_string()))?;
        let title = self.ctx.host.quick_meeting_title(&room_name);
        self.run(
            MeetingAction::CreateInRoom {
                calendar_id: calendar_id.to_string(),
                duration_minutes,
                title,
            },
            source,
        )
        .await
    }

    /// Replays the failed action in the slot with its original parameters.
    pub async fn retry(&self) -> SyncResult<()> {
        let Some((ticket, action)) = self.ctx.store.begin_retry() else {
            return Err(self.ctx.store.read(|s| match &s.action {
                Some(current) if current.is_error() => {
                    SyncError::RetryNotSupported(current.action.kind())
                }
                _ => SyncError::NothingToRetry,
            }));
        };
        info!(kind = action.kind(), "Retrying meeting action");
        self.execute(ticket, action).await;
        Ok(())
    }

    /// Clears the slot, whatever it holds.
    pub fn end_action(&self) {
        self.ctx.store.end_action();
    }

    // =========================================================================
    // Execution
    // =========================================================================

    fn current_meeting_id(&self) -> SyncResult<String> {
        self.ctx
            .store
            .read(|s| s.current_meeting().map(|m| m.id.clone()))
            .ok_or(SyncError::Core(CoreError::NoCurrentMeeting))
    }

    async fn run(&self, action: MeetingAction, source: Option<ActionSource>) -> SyncResult<()> {
        action.validate()?;
        debug!(kind = action.kind(), source = ?source, "Starting meeting action");
        let ticket = self.ctx.store.start_action(action.clone(), source);
        self.execute(ticket, action).await;
        Ok(())
    }

    async fn execute(&self, ticket: u64, action: MeetingAction) {
        self.ctx.store.set_action_running(ticket);

        let result = self.call(&action).await;

        // Partial server-side effects are possible either way
        let cross_room = matches!(action, MeetingAction::CreateInRoom { .. });
        self.refresh(cross_room).await;

        match result {
            Ok(()) if cross_room => {
                self.ctx.store.set_action_success(ticket);
            }
            Ok(()) => {
                self.ctx.store.finish_action(ticket);
            }
            Err(e) => {
                warn!(kind = action.kind(), error = %e, "Meeting action failed");
                // Cross-room failures are shown without a code
                let code = if cross_room { None } else { e.status() };
                self.ctx.store.set_action_error(ticket, code);
            }
        }
    }

    /// Fetches device details and applies them unconditionally.
    async fn refresh(&self, expand_calendars: bool) {
        match self.ctx.api.get_device_details(expand_calendars).await {
            Ok(snapshot) => self.ctx.apply_device_data(snapshot),
            Err(e) => warn!(error = %e, "Refresh after meeting action failed"),
        }
    }

    async fn call(&self, action: &MeetingAction) -> Result<(), ApiError> {
        let api = &self.ctx.api;
        match action {
            MeetingAction::Create {
                duration_minutes,
                title,
            } => api.create_meeting(*duration_minutes, title, None).await,
            MeetingAction::CreateInRoom {
                calendar_id,
                duration_minutes,
                title,
            } => {
                api.create_meeting(*duration_minutes, title, Some(calendar_id))
                    .await
            }
            MeetingAction::Cancel { meeting_id } => api.delete_meeting(meeting_id, false).await,
            MeetingAction::End { meeting_id }
            | MeetingAction::CheckIn { meeting_id }
            | MeetingAction::Extend { meeting_id, .. }
            | MeetingAction::StartEarly { meeting_id } => {
                let update = action.meeting_update().unwrap_or_default();
                api.update_meeting(meeting_id, &update).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync;
    use crate::testing::{
        meeting, runtime, snapshot, snapshot_with, status, Call, FakeApi, RecordingHost,
    };
    use chrono::{Duration as ChronoDuration, Utc};
    use roomboard_core::{ActionPhase, Calendar, MeetingUpdate};
    use std::time::Duration;

    fn now() -> chrono::DateTime<Utc> {
        Utc::now()
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_fifteen_minutes_end_to_end() {
        let fake = Arc::new(FakeApi::new());
        let host = Arc::new(RecordingHost::new());
        let rt = runtime(&fake, &host);
        let now = now();
        rt.store().update_clock(now);

        // 25 free minutes before the next booking
        let mut free = snapshot();
        free.calendar.as_mut().unwrap().next_meeting =
            Some(meeting("m-next", now + ChronoDuration::minutes(25), 30, false));
        rt.store().update_device_data(free.clone());
        let options = rt.quick_booking_options();
        assert_eq!(options[0].minutes, 15);

        let mut booked = free;
        booked.calendar.as_mut().unwrap().current_meeting =
            Some(meeting("m-new", now, 15, true));
        fake.push_device(Ok(booked));

        assert_eq!(rt.state().action_phase(), ActionPhase::Idle);

        rt.actions()
            .create_meeting(15, Some(options[0].source.clone()))
            .await
            .unwrap();

        assert_eq!(
            fake.calls()[0],
            Call::CreateMeeting {
                duration_minutes: 15,
                title: "Quick meeting in Aurora".into(),
                calendar_id: None,
            }
        );

        let state = rt.state();
        let current = state.current_meeting().unwrap();
        assert_eq!(current.end_time - now, ChronoDuration::minutes(15));
        assert_eq!(state.action_phase(), ActionPhase::Idle);
        assert!(state.action_source().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_phase_is_running_while_call_in_flight() {
        let fake = Arc::new(FakeApi::new());
        let host = Arc::new(RecordingHost::new());
        let rt = Arc::new(runtime(&fake, &host));
        rt.store().update_device_data(snapshot());
        // The refresh hangs so the slot can be observed mid-flight
        fake.push_device_after(Duration::from_secs(5), Ok(snapshot()));

        let task = {
            let rt = rt.clone();
            tokio::spawn(async move { rt.actions().create_meeting(30, Some("create-30".into())).await })
        };
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(rt.state().action_phase(), ActionPhase::Running);
        assert_eq!(rt.state().action_source().unwrap().as_str(), "create-30");

        task.await.unwrap().unwrap();
        assert_eq!(rt.state().action_phase(), ActionPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_records_status_after_refresh() {
        let fake = Arc::new(FakeApi::new());
        let host = Arc::new(RecordingHost::new());
        let rt = runtime(&fake, &host);
        rt.store()
            .update_device_data(snapshot_with(meeting("m-1", now(), 30, false)));

        fake.push_mutation(Err(status(409)));
        fake.push_device(Ok(snapshot()));

        rt.actions().check_in(Some("check-in".into())).await.unwrap();

        let state = rt.state();
        // Refreshed data landed before the error was recorded
        assert!(state.current_meeting().is_none());
        assert_eq!(state.action_phase(), ActionPhase::Error);
        assert_eq!(state.action_error_code(), Some(409));
        assert_eq!(state.action_source().unwrap().as_str(), "check-in");
        assert_eq!(fake.device_fetches(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_replays_original_descriptor() {
        let fake = Arc::new(FakeApi::new());
        let host = Arc::new(RecordingHost::new());
        let rt = runtime(&fake, &host);
        rt.store()
            .update_device_data(snapshot_with(meeting("m-1", now(), 30, true)));

        fake.push_mutation(Err(status(500)));
        // After the failure the room shows a different current meeting
        fake.set_device(snapshot_with(meeting("m-2", now(), 30, true)));

        rt.actions()
            .extend_meeting(30, Some("extend-30".into()))
            .await
            .unwrap();
        assert_eq!(rt.state().action_phase(), ActionPhase::Error);

        rt.actions().retry().await.unwrap();

        let updates: Vec<Call> = fake
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::UpdateMeeting { .. }))
            .collect();
        let expected = Call::UpdateMeeting {
            meeting_id: "m-1".into(),
            update: MeetingUpdate::extend(30),
        };
        assert_eq!(updates, vec![expected.clone(), expected]);
        assert_eq!(rt.state().action_phase(), ActionPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_action_supersedes_running_one() {
        let fake = Arc::new(FakeApi::new());
        let host = Arc::new(RecordingHost::new());
        let rt = Arc::new(runtime(&fake, &host));
        rt.store()
            .update_device_data(snapshot_with(meeting("m-1", now(), 30, true)));

        // A fails and its refresh is slow; B's refresh lands first
        fake.push_mutation(Err(status(500)));
        fake.push_device_after(Duration::from_secs(5), Ok(snapshot()));
        fake.push_device_after(Duration::from_secs(2), Ok(snapshot()));

        let a = {
            let rt = rt.clone();
            tokio::spawn(async move { rt.actions().end_meeting(Some("end".into())).await })
        };
        tokio::time::sleep(Duration::from_secs(1)).await;

        let b = {
            let rt = rt.clone();
            tokio::spawn(async move { rt.actions().extend_meeting(15, Some("extend-15".into())).await })
        };
        tokio::time::sleep(Duration::from_secs(1)).await;
        let during_b = rt.state().action.unwrap();
        assert_eq!(during_b.source.unwrap().as_str(), "extend-15");
        assert_eq!(during_b.phase, ActionPhase::Running);

        b.await.unwrap().unwrap();
        a.await.unwrap().unwrap();

        // A's late failure left no trace
        let state = rt.state();
        assert!(state.action.is_none());
        assert_eq!(state.action_phase(), ActionPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_applies_even_when_a_newer_sync_started() {
        let fake = Arc::new(FakeApi::new());
        let host = Arc::new(RecordingHost::new());
        let rt = Arc::new(runtime(&fake, &host));
        rt.store()
            .update_device_data(snapshot_with(meeting("m-1", now(), 30, false)));

        // The action's refresh answers at t=5s; a sync started at t=1s
        // answers at t=11s
        fake.push_device_after(
            Duration::from_secs(5),
            Ok(snapshot_with(meeting("m-1", now(), 30, true))),
        );
        fake.push_device_after(
            Duration::from_secs(10),
            Ok(snapshot_with(meeting("m-1", now(), 30, true))),
        );

        let action = {
            let rt = rt.clone();
            tokio::spawn(async move { rt.actions().check_in(Some("check-in".into())).await })
        };
        tokio::time::sleep(Duration::from_secs(1)).await;
        let ctx = rt.context();
        let background = tokio::spawn(async move { sync::sync_now(&ctx, false).await });

        action.await.unwrap().unwrap();

        // Slot cleared only after the refreshed data was applied
        let state = rt.state();
        assert!(state.action.is_none());
        assert!(state.current_meeting().unwrap().is_checked_in);
        background.abort();
    }

    #[tokio::test]
    async fn test_missing_meeting_is_rejected_without_touching_slot() {
        let fake = Arc::new(FakeApi::new());
        let host = Arc::new(RecordingHost::new());
        let rt = runtime(&fake, &host);
        rt.store().update_device_data(snapshot());

        let err = rt.actions().end_meeting(None).await.unwrap_err();
        assert!(matches!(err, SyncError::Core(CoreError::NoCurrentMeeting)));
        assert!(rt.state().action.is_none());
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_duration_is_rejected() {
        let fake = Arc::new(FakeApi::new());
        let host = Arc::new(RecordingHost::new());
        let rt = runtime(&fake, &host);

        let err = rt.actions().create_meeting(0, None).await.unwrap_err();
        assert!(matches!(err, SyncError::Core(CoreError::Validation(_))));
        assert!(rt.state().action.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cross_room_create_shows_success_and_cannot_retry() {
        let fake = Arc::new(FakeApi::new());
        let host = Arc::new(RecordingHost::new());
        let rt = runtime(&fake, &host);

        let mut all = snapshot();
        all.calendars.push(Calendar {
            id: "cal-2".into(),
            name: "Borealis".into(),
            current_meeting: None,
            next_meeting: None,
        });
        rt.store().update_device_data(all.clone());
        fake.set_device(all);

        rt.actions()
            .create_meeting_in_another_room("cal-2", 30, Some("create-30".into()))
            .await
            .unwrap();
        assert_eq!(rt.state().action_phase(), ActionPhase::Success);
        assert!(fake.calls().contains(&Call::CreateMeeting {
            duration_minutes: 30,
            title: "Quick meeting in Borealis".into(),
            calendar_id: Some("cal-2".into()),
        }));
        assert!(fake.calls().contains(&Call::GetDeviceDetails {
            expand_calendars: true
        }));

        fake.push_mutation(Err(status(409)));
        rt.actions()
            .create_meeting_in_another_room("cal-2", 30, None)
            .await
            .unwrap();
        assert_eq!(rt.state().action_phase(), ActionPhase::Error);
        assert_eq!(rt.state().action_error_code(), None);
        assert!(matches!(
            rt.actions().retry().await,
            Err(SyncError::RetryNotSupported("create_in_room"))
        ));

        let err = rt
            .actions()
            .create_meeting_in_another_room("cal-9", 30, None)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Core(CoreError::UnknownCalendar(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_is_not_silent() {
        let fake = Arc::new(FakeApi::new());
        let host = Arc::new(RecordingHost::new());
        let rt = runtime(&fake, &host);
        rt.store()
            .update_device_data(snapshot_with(meeting("m-1", now(), 30, true)));
        fake.set_device(snapshot());

        rt.actions().cancel_meeting(Some("cancel".into())).await.unwrap();
        assert_eq!(fake.deletes(), vec![("m-1".to_string(), false)]);
    }

    #[tokio::test]
    async fn test_retry_without_failure() {
        let fake = Arc::new(FakeApi::new());
        let host = Arc::new(RecordingHost::new());
        let rt = runtime(&fake, &host);
        assert!(matches!(
            rt.actions().retry().await,
            Err(SyncError::NothingToRetry)
        ));
    }
}
