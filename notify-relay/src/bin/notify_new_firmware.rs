//! Firmware-Notify Relay on its own.
//!
//! Receives firmware-table insert webhooks and publishes a retained notice to
//! the MQTT broker.

use anyhow::Result;
use tracing::info;

use jamur_relay::{firmware_routes, server, Config};

#[tokio::main]
async fn main() -> Result<()> {
    server::init_tracing();

    info!("firmware_relay_starting");

    let config = Config::from_env();
    info!(port = config.port, mqtt = ?config.mqtt, "config_loaded");
    config.mqtt.warn_missing_secrets();

    let relays = firmware_routes(server::firmware_state(config.mqtt));

    server::serve(relays, config.port).await
}
