//! Response envelope shared by both relays.

use serde::Serialize;

/// `200 { "message": ... }`
#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: String,
}

/// `500 { "error": ... }`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
