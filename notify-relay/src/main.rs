//! Jamur Notify Relay - hosts both relays on one port.

use anyhow::Result;
use tracing::info;

use jamur_relay::{email_routes, firmware_routes, server, Config};

#[tokio::main]
async fn main() -> Result<()> {
    server::init_tracing();

    info!("notify_relay_starting");

    let config = Config::from_env();
    info!(
        port = config.port,
        mqtt = ?config.mqtt,
        email = ?config.email,
        "config_loaded"
    );
    config.warn_missing_secrets();

    let relays = firmware_routes(server::firmware_state(config.mqtt.clone()))
        .merge(email_routes(server::email_state(config.email.clone())?));

    server::serve(relays, config.port).await
}
