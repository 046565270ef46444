//! Outbound email delivery through the Resend HTTP API.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{error, info};

use super::types::{OutboundEmail, SendEmailBody};
use crate::config::EmailConfig;
use crate::error::RelayError;

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<(), RelayError>;
}

/// Sends every email from the configured sender to the configured recipient.
#[derive(Clone)]
pub struct ResendSender {
    client: Client,
    config: Arc<EmailConfig>,
}

impl ResendSender {
    pub fn new(client: Client, config: EmailConfig) -> Self {
        Self {
            client,
            config: Arc::new(config),
        }
    }
}

#[async_trait]
impl EmailSender for ResendSender {
    async fn send(&self, email: &OutboundEmail) -> Result<(), RelayError> {
        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            error!("email_api_key_not_configured");
            RelayError::UpstreamSend("email API key is not configured".to_string())
        })?;

        let from = self.config.from_header();
        let body = SendEmailBody {
            from: &from,
            to: [self.config.to_address.as_str()],
            subject: &email.subject,
            html: &email.html,
        };

        info!(
            to = %self.config.to_address,
            subject = %email.subject,
            html_length = email.html.len(),
            "email_send_starting"
        );

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(api_key)
            .timeout(self.config.request_timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    error!(
                        timeout_seconds = self.config.request_timeout.as_secs_f64(),
                        error = %e,
                        "email_send_timeout"
                    );
                } else {
                    error!(error = %e, "email_send_request_error");
                }
                RelayError::UpstreamSend(format!("request to email provider failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            // The provider body can echo request details; keep it in logs only.
            let provider_body = response.text().await.unwrap_or_default();
            error!(
                status_code = status.as_u16(),
                provider_body = %provider_body,
                "email_send_failed"
            );
            return Err(RelayError::UpstreamSend(format!(
                "email provider responded with status {}",
                status.as_u16()
            )));
        }

        info!(status_code = status.as_u16(), to = %self.config.to_address, "email_sent");

        Ok(())
    }
}
