//! Configuration module for environment variable parsing.
//!
//! All configuration is read once at process start and then handed to each
//! relay as its own read-only struct.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

/// Default broker for firmware notices (HiveMQ Cloud, TLS).
pub const DEFAULT_BROKER_URL: &str =
    "mqtts://e21436f97e4c46358cda880324a5a6ba.s2.eu.hivemq.cloud:8883";

/// Topic the frontend and devices watch for new firmware.
pub const DEFAULT_FIRMWARE_TOPIC: &str = "jamur/firmware/new_available";

/// Resend send endpoint.
pub const DEFAULT_RESEND_API_URL: &str = "https://api.resend.com/emails";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    pub mqtt: MqttConfig,

    pub email: EmailConfig,
}

/// Settings for the Firmware-Notify Relay.
#[derive(Clone)]
pub struct MqttConfig {
    /// Broker URL, `mqtts://host:port` or `mqtt://host:port`
    pub broker_url: String,

    pub username: Option<String>,

    pub password: Option<String>,

    /// Topic receiving the retained firmware notice
    pub topic: String,

    /// Prefix of the per-request random client id
    pub client_id_prefix: String,

    pub keep_alive: Duration,

    pub connect_timeout: Duration,

    pub publish_timeout: Duration,

    pub disconnect_timeout: Duration,
}

/// Settings for the Email-Notify Relay.
#[derive(Clone)]
pub struct EmailConfig {
    /// Bearer token for the email API
    pub api_key: Option<String>,

    pub api_url: String,

    /// Display name shown in the `from` header
    pub from_name: String,

    pub from_address: String,

    /// The single recipient of every notification
    pub to_address: String,

    pub request_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Config {
            port: parse_or("PORT", 8080),

            mqtt: MqttConfig {
                broker_url: env::var("MQTT_BROKER_URL")
                    .unwrap_or_else(|_| DEFAULT_BROKER_URL.to_string()),
                username: non_empty_var("MQTT_USER_SECRET"),
                password: non_empty_var("MQTT_PASS_SECRET"),
                topic: env::var("MQTT_FIRMWARE_TOPIC")
                    .unwrap_or_else(|_| DEFAULT_FIRMWARE_TOPIC.to_string()),
                client_id_prefix: env::var("MQTT_CLIENT_ID_PREFIX")
                    .unwrap_or_else(|_| "notify-relay-".to_string()),
                keep_alive: Duration::from_secs(parse_or("MQTT_KEEP_ALIVE_SECS", 30)),
                connect_timeout: Duration::from_millis(parse_or("MQTT_CONNECT_TIMEOUT_MS", 10_000)),
                publish_timeout: Duration::from_millis(parse_or("MQTT_PUBLISH_TIMEOUT_MS", 10_000)),
                disconnect_timeout: Duration::from_millis(parse_or(
                    "MQTT_DISCONNECT_TIMEOUT_MS",
                    2_000,
                )),
            },

            email: EmailConfig {
                api_key: non_empty_var("RESEND_API_KEY"),
                api_url: env::var("RESEND_API_URL")
                    .unwrap_or_else(|_| DEFAULT_RESEND_API_URL.to_string()),
                from_name: env::var("EMAIL_FROM_NAME")
                    .unwrap_or_else(|_| "Jamur IoT Notifications".to_string()),
                from_address: env::var("EMAIL_FROM")
                    .unwrap_or_else(|_| "jamurmen@resend.dev".to_string()),
                to_address: env::var("EMAIL_TO")
                    .unwrap_or_else(|_| "bagus251001@gmail.com".to_string()),
                request_timeout: Duration::from_millis(parse_or(
                    "EMAIL_REQUEST_TIMEOUT_MS",
                    10_000,
                )),
            },
        }
    }

    /// Warn about secrets that are not set. Never logs their values.
    pub fn warn_missing_secrets(&self) {
        self.mqtt.warn_missing_secrets();
        self.email.warn_missing_secrets();
    }
}

impl MqttConfig {
    /// Names of the unset broker credentials.
    pub fn missing_secrets(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.username.is_none() {
            missing.push("MQTT_USER_SECRET");
        }
        if self.password.is_none() {
            missing.push("MQTT_PASS_SECRET");
        }
        missing
    }

    pub fn warn_missing_secrets(&self) {
        let missing = self.missing_secrets();
        if !missing.is_empty() {
            warn!(missing = ?missing, "mqtt_credentials_missing");
        }
    }
}

impl EmailConfig {
    /// Names of the unset provider secrets.
    pub fn missing_secrets(&self) -> Vec<&'static str> {
        match self.api_key {
            Some(_) => Vec::new(),
            None => vec!["RESEND_API_KEY"],
        }
    }

    pub fn warn_missing_secrets(&self) {
        let missing = self.missing_secrets();
        if !missing.is_empty() {
            warn!(missing = ?missing, "resend_api_key_missing");
        }
    }

    /// Sender header in `Name <address>` form.
    pub fn from_header(&self) -> String {
        format!("{} <{}>", self.from_name, self.from_address)
    }
}

// Secrets stay out of Debug output.
impl std::fmt::Debug for MqttConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MqttConfig")
            .field("broker_url", &self.broker_url)
            .field("username_set", &self.username.is_some())
            .field("password_set", &self.password.is_some())
            .field("topic", &self.topic)
            .field("client_id_prefix", &self.client_id_prefix)
            .field("keep_alive", &self.keep_alive)
            .field("connect_timeout", &self.connect_timeout)
            .field("publish_timeout", &self.publish_timeout)
            .field("disconnect_timeout", &self.disconnect_timeout)
            .finish()
    }
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("api_key_set", &self.api_key.is_some())
            .field("api_url", &self.api_url)
            .field("from_name", &self.from_name)
            .field("from_address", &self.from_address)
            .field("to_address", &self.to_address)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Parse a variable into `T`, falling back to `default` when unset or invalid.
fn parse_or<T: FromStr>(name: &str, default: T) -> T {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().parse::<T>() {
        Ok(v) => v,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid value, using default");
            default
        }
    }
}

/// Read a variable, treating an empty or blank value as unset.
fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
