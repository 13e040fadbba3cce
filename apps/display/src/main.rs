//! # Roomboard Display Entry Point
//!
//! ## Startup Sequence
//! 1. Initialize tracing (logging)
//! 2. Load configuration (file, then environment)
//! 3. Build the device runtime and initialize it
//! 4. Run until a signal arrives, rebuilding the runtime on reload

#[tokio::main]
async fn main() {
    // The actual setup is in lib.rs for better testability
    roomboard_display_lib::run().await;
}
