//! Retained-message publisher for firmware notices.
//!
//! Each call opens its own MQTT session with a random client id, so
//! concurrent requests never share or steal a broker session.

use std::sync::Arc;

use async_trait::async_trait;
use rumqttc::{MqttOptions, Transport};
use tracing::{error, info};
use url::Url;

use super::session::{MqttSession, SessionTimeouts};
use crate::config::MqttConfig;
use crate::error::RelayError;

/// Publishes one retained message and reports whether the broker took it.
#[async_trait]
pub trait FirmwarePublisher: Send + Sync {
    async fn publish_retained(&self, topic: &str, payload: Vec<u8>) -> Result<(), RelayError>;
}

/// Where and how to reach the broker, parsed from the broker URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerEndpoint {
    pub host: String,
    pub port: u16,
    pub tls: bool,
}

impl BrokerEndpoint {
    /// Parse `mqtts://host[:port]` (TLS) or `mqtt://host[:port]` (plain TCP).
    pub fn parse(broker_url: &str) -> Result<Self, RelayError> {
        let url = Url::parse(broker_url).map_err(|e| {
            RelayError::UpstreamConnection(format!("invalid broker url {:?}: {}", broker_url, e))
        })?;

        let tls = match url.scheme() {
            "mqtts" | "ssl" | "tls" => true,
            "mqtt" | "tcp" => false,
            other => {
                return Err(RelayError::UpstreamConnection(format!(
                    "unsupported broker scheme {:?}",
                    other
                )))
            }
        };

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| {
                RelayError::UpstreamConnection(format!("broker url {:?} has no host", broker_url))
            })?
            .to_string();

        let port = url.port().unwrap_or(if tls { 8883 } else { 1883 });

        Ok(Self { host, port, tls })
    }
}

/// Production publisher backed by rumqttc.
#[derive(Clone)]
pub struct MqttPublisher {
    config: Arc<MqttConfig>,
}

impl MqttPublisher {
    pub fn new(config: MqttConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    fn timeouts(&self) -> SessionTimeouts {
        SessionTimeouts {
            connect: self.config.connect_timeout,
            publish: self.config.publish_timeout,
            disconnect: self.config.disconnect_timeout,
        }
    }

    /// Build options for one session.
    fn options(&self, client_id: &str) -> Result<MqttOptions, RelayError> {
        let endpoint = BrokerEndpoint::parse(&self.config.broker_url)?;

        let mut options = MqttOptions::new(client_id, endpoint.host, endpoint.port);
        options.set_keep_alive(self.config.keep_alive);
        options.set_clean_session(true);

        if let Some(user) = &self.config.username {
            let pass = self.config.password.clone().unwrap_or_default();
            options.set_credentials(user, pass);
        }

        if endpoint.tls {
            options.set_transport(Transport::tls_with_default_config());
        }

        Ok(options)
    }
}

#[async_trait]
impl FirmwarePublisher for MqttPublisher {
    async fn publish_retained(&self, topic: &str, payload: Vec<u8>) -> Result<(), RelayError> {
        let client_id = random_client_id(&self.config.client_id_prefix);
        let options = self.options(&client_id)?;

        info!(
            client_id = %client_id,
            broker_url = %self.config.broker_url,
            "mqtt_connecting"
        );

        let mut session = MqttSession::new(client_id.clone(), options, self.timeouts());

        if let Err(e) = session.connect().await {
            error!(client_id = %client_id, error = %e, "mqtt_connect_failed");
            session.close().await;
            return Err(e);
        }

        let payload_length = payload.len();
        let result = session.publish_retained(topic, payload).await;
        session.close().await;

        match &result {
            Ok(()) => info!(
                client_id = %client_id,
                topic = topic,
                payload_length = payload_length,
                "mqtt_published"
            ),
            Err(e) => error!(client_id = %client_id, topic = topic, error = %e, "mqtt_publish_failed"),
        }

        result
    }
}

/// `<prefix><16 hex chars>`, fresh for every session.
pub fn random_client_id(prefix: &str) -> String {
    let suffix: [u8; 8] = rand::random();
    format!("{}{}", prefix, hex::encode(suffix))
}
