//! Error taxonomy shared by both relays.
//!
//! Every variant is turned into `500 { "error": "<message>" }` at the top of
//! the handler. Client-caused and upstream-caused failures are not
//! distinguished by status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::web::response::ErrorBody;

#[derive(Debug, Error)]
pub enum RelayError {
    /// A required input field is missing or empty.
    #[error("{0}")]
    Validation(String),

    /// The request body is not the expected JSON shape.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The broker was unreachable, refused the session, or timed out.
    #[error("mqtt connection failed: {0}")]
    UpstreamConnection(String),

    /// The broker accepted the session but the publish did not complete.
    #[error("mqtt publish failed: {0}")]
    UpstreamPublish(String),

    #[error("invalid notification type: {0}")]
    UnknownNotificationType(String),

    /// The email provider rejected the request or could not be reached.
    #[error("email send failed: {0}")]
    UpstreamSend(String),
}

impl RelayError {
    /// Stable label used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::Validation(_) => "validation",
            RelayError::MalformedPayload(_) => "malformed_payload",
            RelayError::UpstreamConnection(_) => "upstream_connection",
            RelayError::UpstreamPublish(_) => "upstream_publish",
            RelayError::UnknownNotificationType(_) => "unknown_notification_type",
            RelayError::UpstreamSend(_) => "upstream_send",
        }
    }

    /// HTTP status for this error.
    ///
    /// Always 500: bad input and upstream failures share one status.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(e: serde_json::Error) -> Self {
        RelayError::MalformedPayload(e.to_string())
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (
            self.status_code(),
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
