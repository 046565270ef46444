//! Firmware-Notify Relay.
//!
//! ```text
//! DB insert webhook → validate record → MQTT session → retained publish → close
//! ```

pub mod publisher;
pub mod session;
pub mod types;

#[cfg(test)]
mod test_broker;

pub use publisher::{random_client_id, BrokerEndpoint, FirmwarePublisher, MqttPublisher};
pub use session::{MqttSession, SessionState, SessionTimeouts};
pub use types::{FirmwareNotice, FirmwareRecord, FirmwareWebhookEnvelope, NO_RELEASE_NOTES};
