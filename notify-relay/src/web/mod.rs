//! HTTP surface of the relays.
//!
//! Each relay gets its own router and state; the binaries decide which
//! routers to mount.

pub mod handlers;
pub mod response;

use axum::{
    routing::{get, post},
    Router,
};

pub use handlers::{
    health, notify_new_firmware, send_email_notification, EmailState, FirmwareState,
};
pub use response::{ErrorBody, HealthResponse, MessageBody};

pub const FIRMWARE_ROUTE: &str = "/notify-new-firmware";
pub const EMAIL_ROUTE: &str = "/send-email-notification";

/// Routes for the Firmware-Notify Relay.
pub fn firmware_routes(state: FirmwareState) -> Router {
    Router::new()
        .route(FIRMWARE_ROUTE, post(notify_new_firmware))
        .with_state(state)
}

/// Routes for the Email-Notify Relay.
pub fn email_routes(state: EmailState) -> Router {
    Router::new()
        .route(EMAIL_ROUTE, post(send_email_notification))
        .with_state(state)
}

/// Liveness check, mounted by every binary.
pub fn health_routes() -> Router {
    Router::new().route("/health", get(health))
}
