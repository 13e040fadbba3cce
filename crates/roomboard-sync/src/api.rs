//! # Device API
//!
//! The remote operations the runtime consumes, and their HTTP implementation.
//!
//! ## Endpoints
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  operation            request                                           │
//! │  ───────────────────  ─────────────────────────────────────────────     │
//! │  get_device_details   GET    /device[?calendars=all]                    │
//! │  create_device        POST   /device                                    │
//! │  remove_device        DELETE /device                                    │
//! │  create_meeting       POST   /meetings                                  │
//! │  update_meeting       PATCH  /meetings/{id}                             │
//! │  delete_meeting       DELETE /meetings/{id}?silent={bool}               │
//! │  get_api_version      GET    /version                                   │
//! │                                                                         │
//! │  Every request carries `Authorization: Bearer <device token>`.          │
//! │  Meeting ids are percent-encoded as a single path segment.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Serialize;
use tracing::debug;
use url::Url;

use roomboard_core::{ApiVersion, DeviceSnapshot, MeetingUpdate};

use crate::config::RoomboardConfig;
use crate::error::{ApiError, SyncError, SyncResult};

// =============================================================================
// Remote API Trait
// =============================================================================

/// Remote operations of the device API.
///
/// Everything the runtime does remotely goes through this trait, so the
/// connectivity observer can wrap it and tests can script it.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// Fetches the device, its room and meetings. `expand_calendars` adds
    /// every bookable room.
    async fn get_device_details(&self, expand_calendars: bool)
        -> Result<DeviceSnapshot, ApiError>;

    /// Registers this device token. Idempotent server-side.
    async fn create_device(&self) -> Result<(), ApiError>;

    async fn remove_device(&self) -> Result<(), ApiError>;

    /// Books a meeting starting now. `None` books the device's own room.
    async fn create_meeting(
        &self,
        duration_minutes: u32,
        title: &str,
        calendar_id: Option<&str>,
    ) -> Result<(), ApiError>;

    async fn update_meeting(&self, meeting_id: &str, update: &MeetingUpdate)
        -> Result<(), ApiError>;

    /// `silent` deletions do not notify attendees.
    async fn delete_meeting(&self, meeting_id: &str, silent: bool) -> Result<(), ApiError>;

    async fn get_api_version(&self) -> Result<ApiVersion, ApiError>;
}

// =============================================================================
// HTTP Implementation
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateMeetingBody<'a> {
    duration: u32,
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    calendar_id: Option<&'a str>,
}

/// `RemoteApi` over HTTPS with reqwest.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    base_url: Url,
    token: String,
}

impl HttpApi {
    /// Builds a client from validated configuration.
    pub fn new(config: &RoomboardConfig) -> SyncResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(format!("roomboard-display/{}", config.client_version()))
            .build()?;

        let base_url = Url::parse(&config.api.base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(SyncError::InvalidUrl(config.api.base_url.clone()));
        }

        Ok(Self {
            client,
            base_url,
            token: config.device_token().to_string(),
        })
    }

    /// Appends `segments` to the base path, encoding each one.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Always Ok: the base was checked in `new`
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Turns non-success statuses into `ApiError::Status`.
    async fn check(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = if body.trim().is_empty() {
            status.canonical_reason().unwrap_or("error").to_string()
        } else {
            body
        };
        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl RemoteApi for HttpApi {
    async fn get_device_details(
        &self,
        expand_calendars: bool,
    ) -> Result<DeviceSnapshot, ApiError> {
        let mut request = self.client.get(self.url(&["device"])).bearer_auth(&self.token);
        if expand_calendars {
            request = request.query(&[("calendars", "all")]);
        }
        let response = Self::check(request.send().await?).await?;
        Ok(response.json().await?)
    }

    async fn create_device(&self) -> Result<(), ApiError> {
        debug!("Registering device");
        let request = self.client.post(self.url(&["device"])).bearer_auth(&self.token);
        Self::check(request.send().await?).await?;
        Ok(())
    }

    async fn remove_device(&self) -> Result<(), ApiError> {
        let request = self
            .client
            .delete(self.url(&["device"]))
            .bearer_auth(&self.token);
        Self::check(request.send().await?).await?;
        Ok(())
    }

    async fn create_meeting(
        &self,
        duration_minutes: u32,
        title: &str,
        calendar_id: Option<&str>,
    ) -> Result<(), ApiError> {
        let body = CreateMeetingBody {
            duration: duration_minutes,
            title,
            calendar_id,
        };
        let request = self
            .client
            .post(self.url(&["meetings"]))
            .bearer_auth(&self.token)
            .json(&body);
        Self::check(request.send().await?).await?;
        Ok(())
    }

    async fn update_meeting(
        &self,
        meeting_id: &str,
        update: &MeetingUpdate,
    ) -> Result<(), ApiError> {
        let request = self
            .client
            .patch(self.url(&["meetings", meeting_id]))
            .bearer_auth(&self.token)
            .json(update);
        Self::check(request.send().await?).await?;
        Ok(())
    }

    async fn delete_meeting(&self, meeting_id: &str, silent: bool) -> Result<(), ApiError> {
        let request = self
            .client
            .delete(self.url(&["meetings", meeting_id]))
            .bearer_auth(&self.token)
            .query(&[("silent", silent)]);
        Self::check(request.send().await?).await?;
        Ok(())
    }

    async fn get_api_version(&self) -> Result<ApiVersion, ApiError> {
        let request = self.client.get(self.url(&["version"])).bearer_auth(&self.token);
        let response = Self::check(request.send().await?).await?;
        Ok(response.json().await?)
    }
}
