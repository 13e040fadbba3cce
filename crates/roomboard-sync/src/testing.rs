//! Scriptable in-memory `RemoteApi` for tests.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use roomboard_core::{
    ApiVersion, Calendar, DeviceSnapshot, DeviceType, FullScreenState, Meeting, MeetingUpdate,
};

use crate::api::RemoteApi;
use crate::config::RoomboardConfig;
use crate::error::ApiError;
use crate::host::DeviceHost;
use crate::runtime::{DeviceRuntime, DeviceRuntimeBuilder};

/// One recorded remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    GetDeviceDetails { expand_calendars: bool },
    CreateDevice,
    RemoveDevice,
    CreateMeeting {
        duration_minutes: u32,
        title: String,
        calendar_id: Option<String>,
    },
    UpdateMeeting {
        meeting_id: String,
        update: MeetingUpdate,
    },
    DeleteMeeting { meeting_id: String, silent: bool },
    GetApiVersion,
}

#[derive(Default)]
struct Script {
    devices: VecDeque<(Duration, Result<DeviceSnapshot, ApiError>)>,
    fallback_device: Option<DeviceSnapshot>,
    versions: VecDeque<Result<ApiVersion, ApiError>>,
    fallback_version: ApiVersion,
    mutations: VecDeque<Result<(), ApiError>>,
    fail_all: Option<ApiError>,
    calls: Vec<Call>,
}

/// Fake device API.
///
/// Queued responses are consumed in order; once a queue is empty the
/// fallback answers. `fail_all_with` overrides everything.
#[derive(Default)]
pub struct FakeApi {
    script: Mutex<Script>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap()
    }

    /// Answer for every fetch once the queue runs dry.
    pub fn set_device(&self, snapshot: DeviceSnapshot) {
        self.script().fallback_device = Some(snapshot);
    }

    pub fn push_device(&self, result: Result<DeviceSnapshot, ApiError>) {
        self.push_device_after(Duration::ZERO, result);
    }

    /// Queues a fetch answer that arrives only after `latency`.
    pub fn push_device_after(&self, latency: Duration, result: Result<DeviceSnapshot, ApiError>) {
        self.script().devices.push_back((latency, result));
    }

    pub fn set_version(&self, version: Option<&str>) {
        self.script().fallback_version = ApiVersion {
            version: version.map(str::to_string),
        };
    }

    pub fn push_version(&self, result: Result<ApiVersion, ApiError>) {
        self.script().versions.push_back(result);
    }

    /// Answer for the next mutation (create/update/delete/device calls).
    pub fn push_mutation(&self, result: Result<(), ApiError>) {
        self.script().mutations.push_back(result);
    }

    pub fn fail_all_with(&self, error: ApiError) {
        self.script().fail_all = Some(error);
    }

    pub fn clear_failure(&self) {
        self.script().fail_all = None;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.script().calls.clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.script().calls.iter().filter(|c| pred(c)).count()
    }

    pub fn device_fetches(&self) -> usize {
        self.count(|c| matches!(c, Call::GetDeviceDetails { .. }))
    }

    pub fn deletes(&self) -> Vec<(String, bool)> {
        self.script()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::DeleteMeeting { meeting_id, silent } => Some((meeting_id.clone(), *silent)),
                _ => None,
            })
            .collect()
    }

    fn mutation(&self, call: Call) -> Result<(), ApiError> {
        let mut script = self.script();
        script.calls.push(call);
        if let Some(err) = script.fail_all.clone() {
            return Err(err);
        }
        script.mutations.pop_front().unwrap_or(Ok(()))
    }
}

#[async_trait]
impl RemoteApi for FakeApi {
    async fn get_device_details(
        &self,
        expand_calendars: bool,
    ) -> Result<DeviceSnapshot, ApiError> {
        let (latency, result) = {
            let mut script = self.script();
            script.calls.push(Call::GetDeviceDetails { expand_calendars });
            if let Some(err) = script.fail_all.clone() {
                (Duration::ZERO, Err(err))
            } else if let Some(queued) = script.devices.pop_front() {
                queued
            } else {
                let result = script.fallback_device.clone().ok_or(ApiError::Status {
                    status: 503,
                    message: "no scripted device".into(),
                });
                (Duration::ZERO, result)
            }
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        result
    }

    async fn create_device(&self) -> Result<(), ApiError> {
        self.mutation(Call::CreateDevice)
    }

    async fn remove_device(&self) -> Result<(), ApiError> {
        self.mutation(Call::RemoveDevice)
    }

    async fn create_meeting(
        &self,
        duration_minutes: u32,
        title: &str,
        calendar_id: Option<&str>,
    ) -> Result<(), ApiError> {
        self.mutation(Call::CreateMeeting {
            duration_minutes,
            title: title.to_string(),
            calendar_id: calendar_id.map(str::to_string),
        })
    }

    async fn update_meeting(
        &self,
        meeting_id: &str,
        update: &MeetingUpdate,
    ) -> Result<(), ApiError> {
        self.mutation(Call::UpdateMeeting {
            meeting_id: meeting_id.to_string(),
            update: update.clone(),
        })
    }

    async fn delete_meeting(&self, meeting_id: &str, silent: bool) -> Result<(), ApiError> {
        self.mutation(Call::DeleteMeeting {
            meeting_id: meeting_id.to_string(),
            silent,
        })
    }

    async fn get_api_version(&self) -> Result<ApiVersion, ApiError> {
        let mut script = self.script();
        script.calls.push(Call::GetApiVersion);
        if let Some(err) = script.fail_all.clone() {
            return Err(err);
        }
        let fallback = script.fallback_version.clone();
        script.versions.pop_front().unwrap_or(Ok(fallback))
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// A connected room device bound to "Aurora", no meetings.
pub fn snapshot() -> DeviceSnapshot {
    DeviceSnapshot {
        id: "dev-1".into(),
        device_type: DeviceType::Calendar,
        connection_code: None,
        is_connected: true,
        language: Some("en".into()),
        version: None,
        calendar: Some(Calendar {
            id: "cal-1".into(),
            name: "Aurora".into(),
            current_meeting: None,
            next_meeting: None,
        }),
        calendars: vec![],
    }
}

/// The same device with `meeting` as the current one.
pub fn snapshot_with(meeting: Meeting) -> DeviceSnapshot {
    let mut snapshot = snapshot();
    if let Some(calendar) = snapshot.calendar.as_mut() {
        calendar.current_meeting = Some(meeting);
    }
    snapshot
}

/// A meeting from `start` lasting `minutes`, check-in deadline 5 minutes in.
pub fn meeting(id: &str, start: DateTime<Utc>, minutes: i64, checked_in: bool) -> Meeting {
    Meeting {
        id: id.into(),
        calendar_id: "cal-1".into(),
        title: "Planning".into(),
        start_time: start,
        end_time: start + ChronoDuration::minutes(minutes),
        check_in_deadline: Some(start + ChronoDuration::minutes(5)),
        is_checked_in: checked_in,
        can_extend: true,
    }
}

/// Shorthand for a status error.
pub fn status(code: u16) -> ApiError {
    ApiError::Status {
        status: code,
        message: String::new(),
    }
}

// =============================================================================
// Recording Host
// =============================================================================

/// `DeviceHost` that records what the runtime asked of it.
#[derive(Default)]
pub struct RecordingHost {
    reloads: AtomicUsize,
    languages: Mutex<Vec<String>>,
    full_screen: Mutex<FullScreenState>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// A host that supports full screen.
    pub fn with_full_screen() -> Self {
        let host = Self::default();
        *host.full_screen.lock().unwrap() = FullScreenState {
            supported: true,
            active: false,
        };
        host
    }

    pub fn reloads(&self) -> usize {
        self.reloads.load(Ordering::SeqCst)
    }

    pub fn languages(&self) -> Vec<String> {
        self.languages.lock().unwrap().clone()
    }
}

impl DeviceHost for RecordingHost {
    fn reload(&self) {
        self.reloads.fetch_add(1, Ordering::SeqCst);
    }

    fn change_language(&self, language: &str) {
        self.languages.lock().unwrap().push(language.to_string());
    }

    fn full_screen(&self) -> FullScreenState {
        *self.full_screen.lock().unwrap()
    }

    fn toggle_full_screen(&self) -> FullScreenState {
        let mut state = self.full_screen.lock().unwrap();
        state.active = !state.active;
        *state
    }
}

/// A runtime on default configuration wired to the fakes.
pub fn runtime(fake: &Arc<FakeApi>, host: &Arc<RecordingHost>) -> DeviceRuntime {
    DeviceRuntimeBuilder::new(RoomboardConfig::default())
        .with_api(fake.clone())
        .with_host(host.clone())
        .build()
        .unwrap()
}
