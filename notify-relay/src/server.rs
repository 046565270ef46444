//! Process bootstrap shared by the binaries: logging, relay wiring, and the
//! HTTP server with graceful shutdown.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use reqwest::Client;
use tokio::{net::TcpListener, signal};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{EmailConfig, MqttConfig};
use crate::email::ResendSender;
use crate::firmware::MqttPublisher;
use crate::web::{health_routes, EmailState, FirmwareState};

/// Initialize structured JSON logging.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();
}

/// Wire the firmware relay to a real broker.
pub fn firmware_state(config: MqttConfig) -> FirmwareState {
    let topic = config.topic.clone();
    FirmwareState::new(Arc::new(MqttPublisher::new(config)), topic)
}

/// Wire the email relay to the Resend API.
pub fn email_state(config: EmailConfig) -> Result<EmailState> {
    let client = Client::builder()
        .pool_max_idle_per_host(10)
        .build()
        .context("Failed to create HTTP client")?;

    Ok(EmailState::new(Arc::new(ResendSender::new(client, config))))
}

/// Serve `relays` plus `/health` on `port` until SIGINT/SIGTERM.
pub async fn serve(relays: Router, port: u16) -> Result<()> {
    let app = health_routes()
        .merge(relays)
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("web_server_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}
