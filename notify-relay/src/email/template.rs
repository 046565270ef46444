//! Subject and HTML body for each notification kind.
//!
//! Plain string building; there is no template engine. Interpolated values
//! are HTML-escaped.

use super::types::{Notification, OutboundEmail, Reading};

pub const NO_NOTES: &str = "No release notes.";
pub const NO_MESSAGE: &str = "No message.";
pub const UNKNOWN_VERSION: &str = "unknown";

/// Rendered in place of a missing sensor value.
pub const MISSING_READING: &str = "-";

/// Render a notification into the email that will be sent.
pub fn render(notification: &Notification) -> OutboundEmail {
    match notification {
        Notification::FirmwareUpdate {
            version,
            release_notes,
        } => {
            let version = escape_html(non_empty(version).unwrap_or(UNKNOWN_VERSION));
            let notes = escape_html(non_empty(release_notes).unwrap_or(NO_NOTES));

            OutboundEmail {
                subject: format!("🚀 New Firmware Available: {}", version),
                html: format!(
                    "<h1>New Firmware Update!</h1>\n\
                     <p>Version <strong>{version}</strong> has been deployed successfully.</p>\n\
                     <p><strong>Release notes:</strong></p>\n\
                     <pre>{notes}</pre>\n"
                ),
            }
        }
        Notification::CriticalAlert(reading) => OutboundEmail {
            subject: "⚠️ Critical Alert - Mushroom House".to_string(),
            html: format!(
                "<h1>Critical Alert!</h1>\n\
                 <p>Humidity is below the critical threshold and needs immediate attention.</p>\n\
                 {}",
                reading_list(reading, "Measured")
            ),
        },
        Notification::Warning(reading) => OutboundEmail {
            subject: "🔔 Warning - Mushroom House".to_string(),
            html: format!(
                "<h1>Warning Notification</h1>\n\
                 <p>Growing conditions are approaching the threshold.</p>\n\
                 {}",
                reading_list(reading, "Measured")
            ),
        },
        Notification::Info(reading) => OutboundEmail {
            subject: "ℹ️ Info - Mushroom House Back to Normal".to_string(),
            html: format!(
                "<h1>Information Notification</h1>\n{}",
                reading_list(reading, "Current")
            ),
        },
    }
}

/// One decimal place with `unit`, or the bare dash when absent.
pub fn format_reading(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{:.1}{}", v, unit),
        None => MISSING_READING.to_string(),
    }
}

fn reading_list(reading: &Reading, qualifier: &str) -> String {
    let message = escape_html(non_empty(&reading.message).unwrap_or(NO_MESSAGE));

    format!(
        "<ul>\n\
         <li><strong>Message:</strong> {}</li>\n\
         <li><strong>{} humidity:</strong> {}</li>\n\
         <li><strong>{} temperature:</strong> {}</li>\n\
         </ul>\n",
        message,
        qualifier,
        format_reading(reading.humidity, "%"),
        qualifier,
        format_reading(reading.temperature, "°C"),
    )
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
