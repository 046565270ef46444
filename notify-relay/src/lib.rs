//! Jamur notify relays - webhook-triggered notifications for the mushroom
//! house monitoring platform.
//!
//! Two independent relays share this library:
//! - Firmware-Notify: database insert webhook → retained MQTT message
//! - Email-Notify: typed notification → rendered email via Resend
//!
//! ## Architecture
//!
//! ```text
//! firmware table webhook → /notify-new-firmware     → MQTT broker (retained, QoS 1)
//! device alert           → /send-email-notification → Resend API → inbox
//! ```

pub mod config;
pub mod email;
pub mod error;
pub mod firmware;
pub mod server;
pub mod web;

// Re-export commonly used types
pub use config::{Config, EmailConfig, MqttConfig};
pub use error::RelayError;
pub use web::{email_routes, firmware_routes, EmailState, FirmwareState};
