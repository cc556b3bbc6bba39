//! Transactional-mail client (SendGrid-style v3 API).

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::error::OutreachError;

const DEFAULT_BASE_URL: &str = "https://api.sendgrid.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Email-channel seam.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), OutreachError>;
}

#[derive(Debug, Serialize)]
struct MailAddress<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct Personalization<'a> {
    to: Vec<MailAddress<'a>>,
}

#[derive(Debug, Serialize)]
struct MailContent<'a> {
    #[serde(rename = "type")]
    content_type: &'a str,
    value: &'a str,
}

#[derive(Debug, Serialize)]
struct SendMailRequest<'a> {
    personalizations: Vec<Personalization<'a>>,
    from: MailAddress<'a>,
    subject: &'a str,
    content: Vec<MailContent<'a>>,
}

/// Client for the mail provider. Without an API key every send reports the
/// channel as unconfigured.
#[derive(Debug, Clone)]
pub struct MailClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    from_email: String,
    from_name: String,
}

impl MailClient {
    /// # Errors
    ///
    /// Returns [`OutreachError::Http`] when the underlying client cannot be
    /// constructed.
    pub fn new(
        api_key: Option<String>,
        from_email: String,
        from_name: String,
    ) -> Result<Self, OutreachError> {
        Self::with_base_url(api_key, from_email, from_name, DEFAULT_BASE_URL.to_owned())
    }

    /// Same as [`MailClient::new`] with an explicit base URL, for tests.
    ///
    /// # Errors
    ///
    /// Returns [`OutreachError::Http`] when the underlying client cannot be
    /// constructed.
    pub fn with_base_url(
        api_key: Option<String>,
        from_email: String,
        from_name: String,
        base_url: String,
    ) -> Result<Self, OutreachError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(OutreachError::Http)?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_owned(),
            from_email,
            from_name,
        })
    }
}

#[async_trait]
impl Mailer for MailClient {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), OutreachError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(OutreachError::NotConfigured { channel: "email" })?;

        let request = SendMailRequest {
            personalizations: vec![Personalization {
                to: vec![MailAddress { email: to, name: None }],
            }],
            from: MailAddress {
                email: &self.from_email,
                name: Some(&self.from_name),
            },
            subject,
            content: vec![MailContent {
                content_type: "text/plain",
                value: body,
            }],
        };

        let url = format!("{}/v3/mail/send", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(OutreachError::Http)?;
        let status = response.status();
        if !status.is_success() {
            return Err(OutreachError::UnexpectedStatus {
                status: status.as_u16(),
                endpoint: "/v3/mail/send".to_owned(),
            });
        }
        debug!(to = %to, "email accepted by provider");
        Ok(())
    }
}
