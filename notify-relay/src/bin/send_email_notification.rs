//! Email-Notify Relay on its own.
//!
//! Renders typed notifications into HTML email and sends them through Resend.

use anyhow::Result;
use tracing::info;

use jamur_relay::{email_routes, server, Config};

#[tokio::main]
async fn main() -> Result<()> {
    server::init_tracing();

    info!("email_relay_starting");

    let config = Config::from_env();
    info!(port = config.port, email = ?config.email, "config_loaded");
    config.email.warn_missing_secrets();

    let relays = email_routes(server::email_state(config.email)?);

    server::serve(relays, config.port).await
}
