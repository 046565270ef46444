//! Email notification request types.

use serde::{Deserialize, Serialize};

use crate::error::RelayError;

/// Raw request body as the device firmware sends it.
///
/// `type` stays untyped here; `Notification::try_from` closes it over the
/// known kinds.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationRequest {
    /// Any JSON value, so a non-string type is still reported by name.
    #[serde(rename = "type", default)]
    pub kind: Option<serde_json::Value>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub release_notes: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub temperature: Option<f64>,
}

/// Sensor context attached to alert-style notifications.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reading {
    pub message: Option<String>,
    pub humidity: Option<f64>,
    pub temperature: Option<f64>,
}

/// A validated notification, one variant per template.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    FirmwareUpdate {
        version: Option<String>,
        release_notes: Option<String>,
    },
    CriticalAlert(Reading),
    Warning(Reading),
    Info(Reading),
}

impl NotificationRequest {
    /// The requested type as text; `None` when absent or null.
    pub fn kind_name(&self) -> Option<String> {
        match &self.kind {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        }
    }
}

impl Notification {
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::FirmwareUpdate { .. } => "firmware_update",
            Notification::CriticalAlert(_) => "critical_alert",
            Notification::Warning(_) => "warning",
            Notification::Info(_) => "info",
        }
    }
}

impl TryFrom<NotificationRequest> for Notification {
    type Error = RelayError;

    fn try_from(request: NotificationRequest) -> Result<Self, Self::Error> {
        let reading = || Reading {
            message: request.message.clone(),
            humidity: request.humidity,
            temperature: request.temperature,
        };

        match request.kind_name().as_deref() {
            Some("firmware_update") => Ok(Notification::FirmwareUpdate {
                version: request.version.clone(),
                release_notes: request.release_notes.clone(),
            }),
            Some("critical_alert") => Ok(Notification::CriticalAlert(reading())),
            Some("warning") => Ok(Notification::Warning(reading())),
            Some("info") => Ok(Notification::Info(reading())),
            Some(other) => Err(RelayError::UnknownNotificationType(other.to_string())),
            None => Err(RelayError::UnknownNotificationType("<missing>".to_string())),
        }
    }
}

/// Rendered email, ready for the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub subject: String,
    pub html: String,
}

/// JSON body for the Resend send endpoint.
#[derive(Debug, Serialize)]
pub struct SendEmailBody<'a> {
    pub from: &'a str,
    pub to: [&'a str; 1],
    pub subject: &'a str,
    pub html: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: &str) -> NotificationRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_firmware_update_request() {
        let n = Notification::try_from(request(
            r#"{"type":"firmware_update","message":"Firmware update tersedia!","version":"2.3.1","release_notes":"fixes bug"}"#,
        ))
        .unwrap();

        assert_eq!(
            n,
            Notification::FirmwareUpdate {
                version: Some("2.3.1".to_string()),
                release_notes: Some("fixes bug".to_string()),
            }
        );
    }

    #[test]
    fn test_alert_kinds_carry_reading() {
        let json = r#"{"type":"%","message":"Humidity low","humidity":42.5,"temperature":27.0}"#;
        let expected = Reading {
            message: Some("Humidity low".to_string()),
            humidity: Some(42.5),
            temperature: Some(27.0),
        };

        for kind in ["critical_alert", "warning", "info"] {
            let n = Notification::try_from(request(&json.replace('%', kind))).unwrap();
            assert_eq!(n.kind(), kind);
            match n {
                Notification::CriticalAlert(r) | Notification::Warning(r) | Notification::Info(r) => {
                    assert_eq!(r, expected)
                }
                other => panic!("unexpected variant {:?}", other),
            }
        }
    }

    #[test]
    fn test_integer_readings_accepted() {
        let n = Notification::try_from(request(r#"{"type":"info","humidity":80}"#)).unwrap();
        assert_eq!(
            n,
            Notification::Info(Reading {
                message: None,
                humidity: Some(80.0),
                temperature: None,
            })
        );
    }

    #[test]
    fn test_unknown_type() {
        let err = Notification::try_from(request(r#"{"type":"unknown_type"}"#)).unwrap_err();
        assert!(matches!(err, RelayError::UnknownNotificationType(ref t) if t == "unknown_type"));
    }

    #[test]
    fn test_non_string_type_is_named() {
        let err = Notification::try_from(request(r#"{"type":5}"#)).unwrap_err();
        assert_eq!(err.to_string(), "invalid notification type: 5");

        let err = Notification::try_from(request(r#"{"type":null}"#)).unwrap_err();
        assert_eq!(err.to_string(), "invalid notification type: <missing>");
    }

    #[test]
    fn test_missing_type() {
        let err = Notification::try_from(request(r#"{"message":"hi"}"#)).unwrap_err();
        assert!(matches!(err, RelayError::UnknownNotificationType(_)));
    }

    #[test]
    fn test_send_body_shape() {
        let body = SendEmailBody {
            from: "Jamur IoT <jamur@example.com>",
            to: ["ops@example.com"],
            subject: "s",
            html: "<p>h</p>",
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["to"], serde_json::json!(["ops@example.com"]));
        assert_eq!(value["from"], "Jamur IoT <jamur@example.com>");
    }
}
