//! Firmware webhook payloads and the MQTT notice derived from them.

use serde::{Deserialize, Serialize};

use crate::error::RelayError;

/// Substituted when a record carries no release notes.
pub const NO_RELEASE_NOTES: &str = "No release notes.";

/// Database change-trigger webhook body. The inserted row sits under `record`.
#[derive(Debug, Clone, Deserialize)]
pub struct FirmwareWebhookEnvelope {
    pub record: FirmwareRecord,
}

/// A new row in the firmware table.
///
/// Fields are optional at the serde level so that a missing field is
/// reported as a validation failure rather than a decode error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FirmwareRecord {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub release_notes: Option<String>,
}

/// Retained message published for devices and the frontend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirmwareNotice {
    pub version: String,
    pub release_notes: String,
    pub url: String,
}

impl FirmwareRecord {
    /// Check the required fields and build the notice to publish.
    pub fn into_notice(self) -> Result<FirmwareNotice, RelayError> {
        let version = self.version.filter(|v| !v.is_empty());
        let file_url = self.file_url.filter(|u| !u.is_empty());

        let (version, url) = match (version, file_url) {
            (Some(version), Some(url)) => (version, url),
            (version, url) => {
                let mut missing = Vec::new();
                if version.is_none() {
                    missing.push("version");
                }
                if url.is_none() {
                    missing.push("file_url");
                }
                return Err(RelayError::Validation(format!(
                    "webhook record is missing required field(s): {}",
                    missing.join(", ")
                )));
            }
        };

        let release_notes = self
            .release_notes
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| NO_RELEASE_NOTES.to_string());

        Ok(FirmwareNotice {
            version,
            release_notes,
            url,
        })
    }
}

impl FirmwareNotice {
    /// JSON bytes sent as the MQTT payload.
    pub fn to_payload(&self) -> Result<Vec<u8>, RelayError> {
        serde_json::to_vec(self)
            .map_err(|e| RelayError::UpstreamPublish(format!("failed to encode notice: {}", e)))
    }
}
