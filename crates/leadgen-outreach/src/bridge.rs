//! HTTP client for the self-hosted messaging bridge.
//!
//! The bridge exposes three endpoints: `GET /health`, `POST /check-whatsapp`
//! and `POST /send-message`. It wants bare digits without the leading `+`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use leadgen_core::phone;

use crate::error::OutreachError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Messaging-channel seam: reachability check plus a single text send.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Whether the number can receive messages on the network. A number that
    /// fails validation is simply not reachable, not an error.
    async fn is_reachable(&self, phone: &str) -> Result<bool, OutreachError>;

    async fn send_text(&self, phone: &str, message: &str) -> Result<(), OutreachError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckRequest<'a> {
    phone_number: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckResponse {
    is_on_whats_app: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendRequest<'a> {
    phone_number: &'a str,
    message: &'a str,
}

/// Client for the bridge service. Built without a base URL it reports every
/// number unreachable and refuses to send, so a run without a bridge simply
/// records the channel as unavailable.
#[derive(Debug, Clone)]
pub struct BridgeClient {
    client: reqwest::Client,
    base_url: Option<String>,
}

impl BridgeClient {
    /// # Errors
    ///
    /// Returns [`OutreachError::Http`] when the underlying client cannot be
    /// constructed.
    pub fn new(base_url: Option<String>) -> Result<Self, OutreachError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(OutreachError::Http)?;
        Ok(Self {
            client,
            base_url: base_url.map(|url| url.trim_end_matches('/').to_owned()),
        })
    }

    fn endpoint(&self, path: &str) -> Result<String, OutreachError> {
        let base = self
            .base_url
            .as_deref()
            .ok_or(OutreachError::NotConfigured { channel: "whatsapp" })?;
        Ok(format!("{base}{path}"))
    }

    /// `GET /health`; any 2xx means the bridge is up and connected.
    ///
    /// # Errors
    ///
    /// Fails when the bridge is unconfigured or does not answer with 2xx.
    pub async fn health(&self) -> Result<(), OutreachError> {
        let url = self.endpoint("/health")?;
        let response = self.client.get(&url).send().await.map_err(OutreachError::Http)?;
        let status = response.status();
        if !status.is_success() {
            return Err(OutreachError::UnexpectedStatus {
                status: status.as_u16(),
                endpoint: "/health".to_owned(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Messenger for BridgeClient {
    async fn is_reachable(&self, phone_number: &str) -> Result<bool, OutreachError> {
        if self.base_url.is_none() {
            return Err(OutreachError::NotConfigured { channel: "whatsapp" });
        }
        let Some(digits) = phone::bare_digits(phone_number) else {
            debug!(phone = %phone_number, "skipping reachability check for invalid number");
            return Ok(false);
        };
        let url = self.endpoint("/check-whatsapp")?;
        let response = self
            .client
            .post(&url)
            .json(&CheckRequest { phone_number: &digits })
            .send()
            .await
            .map_err(OutreachError::Http)?;
        let status = response.status();
        if !status.is_success() {
            return Err(OutreachError::UnexpectedStatus {
                status: status.as_u16(),
                endpoint: "/check-whatsapp".to_owned(),
            });
        }
        let text = response.text().await.map_err(OutreachError::Http)?;
        let body: CheckResponse = serde_json::from_str(&text).map_err(|source| {
            OutreachError::Deserialize {
                context: "/check-whatsapp".to_owned(),
                source,
            }
        })?;
        Ok(body.is_on_whats_app)
    }

    async fn send_text(&self, phone_number: &str, message: &str) -> Result<(), OutreachError> {
        if self.base_url.is_none() {
            return Err(OutreachError::NotConfigured { channel: "whatsapp" });
        }
        let Some(digits) = phone::bare_digits(phone_number) else {
            return Err(OutreachError::InvalidPhone(phone_number.to_owned()));
        };
        let url = self.endpoint("/send-message")?;
        let response = self
            .client
            .post(&url)
            .json(&SendRequest {
                phone_number: &digits,
                message,
            })
            .send()
            .await
            .map_err(OutreachError::Http)?;
        let status = response.status();
        if !status.is_success() {
            return Err(OutreachError::UnexpectedStatus {
                status: status.as_u16(),
                endpoint: "/send-message".to_owned(),
            });
        }
        debug!(phone = %phone_number, "message handed to bridge");
        Ok(())
    }
}

#[cfg(test)]
#[path = "bridge_test.rs"]
mod tests;
