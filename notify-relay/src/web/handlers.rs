//! Relay endpoint handlers.
//!
//! Each handler is one stateless request/response cycle:
//! 1. Decode and validate the JSON body
//! 2. Make exactly one outbound call (MQTT publish or email send)
//! 3. Map the outcome to `200 {message}` or `500 {error}`
//!
//! Bodies are decoded here rather than through axum's `Json` extractor so
//! that malformed JSON gets the same 500 envelope as every other failure.

use std::sync::Arc;

use axum::{body::Bytes, extract::State, Json};
use tracing::{error, info};

use crate::email::{render, EmailSender, Notification, NotificationRequest};
use crate::error::RelayError;
use crate::firmware::{FirmwarePublisher, FirmwareWebhookEnvelope};
use crate::web::response::{HealthResponse, MessageBody};

/// State for the Firmware-Notify Relay.
#[derive(Clone)]
pub struct FirmwareState {
    pub publisher: Arc<dyn FirmwarePublisher>,
    pub topic: Arc<str>,
}

impl FirmwareState {
    pub fn new(publisher: Arc<dyn FirmwarePublisher>, topic: impl Into<Arc<str>>) -> Self {
        Self {
            publisher,
            topic: topic.into(),
        }
    }
}

/// State for the Email-Notify Relay.
#[derive(Clone)]
pub struct EmailState {
    pub sender: Arc<dyn EmailSender>,
}

impl EmailState {
    pub fn new(sender: Arc<dyn EmailSender>) -> Self {
        Self { sender }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Firmware-Notify Relay
// =============================================================================

/// Firmware webhook endpoint.
///
/// Publishes `{version, release_notes, url}` retained with QoS 1 and only
/// responds once the broker acknowledged or the attempt failed.
pub async fn notify_new_firmware(
    State(state): State<FirmwareState>,
    body: Bytes,
) -> Result<Json<MessageBody>, RelayError> {
    match relay_firmware(&state, &body).await {
        Ok(version) => {
            info!(version = %version, topic = %state.topic, "firmware_notice_published");
            Ok(Json(MessageBody {
                message: format!("Firmware notice for version {} published", version),
            }))
        }
        Err(e) => {
            error!(kind = e.kind(), error = %e, "firmware_relay_failed");
            Err(e)
        }
    }
}

async fn relay_firmware(state: &FirmwareState, body: &[u8]) -> Result<String, RelayError> {
    let envelope: FirmwareWebhookEnvelope = serde_json::from_slice(body)?;

    info!(
        version = envelope.record.version.as_deref().unwrap_or(""),
        has_file_url = envelope.record.file_url.is_some(),
        has_release_notes = envelope.record.release_notes.is_some(),
        "firmware_webhook_received"
    );

    let notice = envelope.record.into_notice()?;
    let payload = notice.to_payload()?;

    state.publisher.publish_retained(&state.topic, payload).await?;

    Ok(notice.version)
}

// =============================================================================
// Email-Notify Relay
// =============================================================================

/// Email notification endpoint.
///
/// Renders the template for the request's `type` and sends one email.
/// Identical requests send identical emails; nothing is deduplicated.
pub async fn send_email_notification(
    State(state): State<EmailState>,
    body: Bytes,
) -> Result<Json<MessageBody>, RelayError> {
    match relay_email(&state, &body).await {
        Ok(kind) => {
            info!(notification_type = kind, "email_notification_processed");
            Ok(Json(MessageBody {
                message: format!("Email notification ({}) sent", kind),
            }))
        }
        Err(e) => {
            error!(kind = e.kind(), error = %e, "email_relay_failed");
            Err(e)
        }
    }
}

async fn relay_email(state: &EmailState, body: &[u8]) -> Result<&'static str, RelayError> {
    let request: NotificationRequest = serde_json::from_slice(body)?;

    let kind_name = request.kind_name();
    info!(
        notification_type = kind_name.as_deref().unwrap_or(""),
        has_message = request.message.is_some(),
        "email_notification_received"
    );

    let notification = Notification::try_from(request)?;
    let email = render(&notification);

    state.sender.send(&email).await?;

    Ok(notification.kind())
}
