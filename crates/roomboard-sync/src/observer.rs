//! # Connectivity Observer
//!
//! A `RemoteApi` decorator that turns call outcomes into the offline flag.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   caller ──► ConnectivityObserver ──► inner RemoteApi (HTTP)            │
//! │                     │                                                   │
//! │     Ok(_)           ├─► record_response()       offline=false, slot=∅   │
//! │                     │                           (only if was offline)   │
//! │     Err(Status)     ├─► record_server_failure() offline=false           │
//! │     Err(Decode)     │                                                   │
//! │     Err(Network)    └─► record_network_failure() offline=true           │
//! │                                                                         │
//! │   The error is always handed back to the caller unchanged.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use std::sync::Arc;

use roomboard_core::{ApiVersion, DeviceSnapshot, MeetingUpdate};

use crate::api::RemoteApi;
use crate::error::ApiError;
use crate::store::StateStore;

/// Wraps every outbound call of `inner`.
pub struct ConnectivityObserver {
    inner: Arc<dyn RemoteApi>,
    store: StateStore,
}

impl ConnectivityObserver {
    pub fn new(inner: Arc<dyn RemoteApi>, store: StateStore) -> Self {
        Self { inner, store }
    }

    fn observe<T>(&self, result: Result<T, ApiError>) -> Result<T, ApiError> {
        match &result {
            Ok(_) => self.store.record_response(),
            Err(e) if e.is_network() => self.store.record_network_failure(),
            Err(_) => self.store.record_server_failure(),
        }
        result
    }
}

#[async_trait]
impl RemoteApi for ConnectivityObserver {
    async fn get_device_details(
        &self,
        expand_calendars: bool,
    ) -> Result<DeviceSnapshot, ApiError> {
        self.observe(self.inner.get_device_details(expand_calendars).await)
    }

    async fn create_device(&self) -> Result<(), ApiError> {
        self.observe(self.inner.create_device().await)
    }

    async fn remove_device(&self) -> Result<(), ApiError> {
        self.observe(self.inner.remove_device().await)
    }

    async fn create_meeting(
        &self,
        duration_minutes: u32,
        title: &str,
        calendar_id: Option<&str>,
    ) -> Result<(), ApiError> {
        self.observe(
            self.inner
                .create_meeting(duration_minutes, title, calendar_id)
                .await,
        )
    }

    async fn update_meeting(
        &self,
        meeting_id: &str,
        update: &MeetingUpdate,
    ) -> Result<(), ApiError> {
        self.observe(self.inner.update_meeting(meeting_id, update).await)
    }

    async fn delete_meeting(&self, meeting_id: &str, silent: bool) -> Result<(), ApiError> {
        self.observe(self.inner.delete_meeting(meeting_id, silent).await)
    }

    async fn get_api_version(&self) -> Result<ApiVersion, ApiError> {
        self.observe(self.inner.get_api_version().await)
    }
}
