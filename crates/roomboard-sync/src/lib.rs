//! # roomboard-sync: Device Runtime for Roomboard
//!
//! This crate keeps a meeting-room display in step with the device API:
//! it registers the device, polls its room data, runs meeting actions and
//! notices when the display itself has to reload.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Device Runtime Architecture                        │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                DeviceRuntime (Main Orchestrator)                 │  │
//! │  │                                                                  │  │
//! │  │  initialize() registers, then spawns the background services     │  │
//! │  │  Owns the StateStore every view reads from                       │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │         ┌─────────────────────┼─────────────────────┐                  │
//! │         ▼                     ▼                     ▼                   │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │   Sync loop    │  │ ActionPipeline │  │  Background services   │    │
//! │  │                │  │                │  │                        │    │
//! │  │ Adaptive poll  │  │ One action     │  │ Version watchdog       │    │
//! │  │ Latest request │  │ slot, retry,   │  │ Clock                  │    │
//! │  │ wins           │  │ forced refresh │  │ Auto-checkout          │    │
//! │  └───────┬────────┘  └───────┬────────┘  └───────────┬────────────┘    │
//! │          └───────────────────┼───────────────────────┘                  │
//! │                              ▼                                          │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │   ConnectivityObserver ─► RemoteApi (HttpApi / test fake)        │  │
//! │  │   Every response updates the offline flag                        │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  HOST CALLBACKS (DeviceHost):                                          │
//! │  • reload            - version drift, disconnect                       │
//! │  • change_language   - device language from the server                 │
//! │  • full screen       - query and toggle                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`runtime`] - `DeviceRuntime` orchestrator and its builder
//! - [`actions`] - Meeting action pipeline
//! - [`store`] - Observable application state
//! - [`api`] - Device API trait and HTTP client
//! - [`observer`] - Connectivity tracking around the API
//! - [`epoch`] - Cancellation of superseded background work
//! - [`watchdog`] - API version drift detection
//! - [`host`] - Display host callbacks
//! - [`config`] - Runtime configuration
//! - [`error`] - Error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use roomboard_sync::{DeviceRuntime, NoOpHost, RoomboardConfig};
//! use std::sync::Arc;
//!
//! let config = RoomboardConfig::load_or_default(None);
//! let runtime = DeviceRuntime::new(config, Arc::new(NoOpHost))?;
//! runtime.initialize().await;
//!
//! let mut updates = runtime.subscribe();
//! while updates.changed().await.is_ok() {
//!     println!("Showing {:?}", updates.borrow().screen());
//! }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod actions;
pub mod api;
pub mod config;
pub mod epoch;
pub mod error;
pub mod host;
pub mod observer;
pub mod runtime;
pub mod store;
pub mod watchdog;

// Background services driven by the runtime
mod checkout;
mod clock;
mod sync;

#[cfg(test)]
mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use actions::ActionPipeline;
pub use api::{HttpApi, RemoteApi};
pub use config::RoomboardConfig;
pub use epoch::{EpochRegistry, EpochToken, Operation};
pub use error::{ApiError, SyncError, SyncResult};
pub use host::{DeviceHost, NoOpHost};
pub use observer::ConnectivityObserver;
pub use runtime::{DeviceRuntime, DeviceRuntimeBuilder};
pub use store::StateStore;
pub use watchdog::VersionBaseline;
