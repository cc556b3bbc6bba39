//! Message generation with a deterministic template fallback.
//!
//! When a generation API key is configured the client asks a chat-completion
//! backend for personalized copy; on any failure, and when no key is set, it
//! falls back to the static templates so outreach never stalls on the
//! generator.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use leadgen_core::record::BusinessRecord;

use crate::error::OutreachError;
use crate::message::{self, AgencyIdentity, Message, Tone};
use crate::outcome::Channel;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const MODEL: &str = "gpt-4o-mini";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Generation seam. Infallible: implementations fall back to templates
/// rather than surfacing generation errors to the outreach loop.
#[async_trait]
pub trait MessageGenerator: Send + Sync {
    async fn generate(&self, business: &BusinessRecord, channel: Channel) -> Message;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// Chat-completion client with template fallback.
#[derive(Debug, Clone)]
pub struct GeneratorClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    identity: AgencyIdentity,
    tone: Tone,
}

impl GeneratorClient {
    /// # Errors
    ///
    /// Returns [`OutreachError::Http`] when the underlying client cannot be
    /// constructed.
    pub fn new(
        api_key: Option<String>,
        identity: AgencyIdentity,
        tone: Tone,
    ) -> Result<Self, OutreachError> {
        Self::with_base_url(api_key, identity, tone, DEFAULT_BASE_URL.to_owned())
    }

    /// Same as [`GeneratorClient::new`] with an explicit base URL, for tests.
    ///
    /// # Errors
    ///
    /// Returns [`OutreachError::Http`] when the underlying client cannot be
    /// constructed.
    pub fn with_base_url(
        api_key: Option<String>,
        identity: AgencyIdentity,
        tone: Tone,
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
            identity,
            tone,
        })
    }

    /// `Ok(None)` means the backend answered but produced no usable text.
    async fn complete(
        &self,
        api_key: &str,
        business: &BusinessRecord,
        channel: Channel,
    ) -> Result<Option<Message>, OutreachError> {
        let prompt = message::build_prompt(business, channel, self.tone);
        let request = ChatRequest {
            model: MODEL,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content:
                        "You write short, warm business-development outreach for a Kenyan \
                         web-design agency. Reply with the message only, no commentary.",
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            max_tokens: 500,
            temperature: 0.7,
        };

        let url = format!("{}/v1/chat/completions", self.base_url);
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
                endpoint: "/v1/chat/completions".to_owned(),
            });
        }
        let text = response.text().await.map_err(OutreachError::Http)?;
        let body: ChatResponse = serde_json::from_str(&text).map_err(|source| {
            OutreachError::Deserialize {
                context: "/v1/chat/completions".to_owned(),
                source,
            }
        })?;
        let content = body
            .choices
            .first()
            .map(|choice| choice.message.content.trim())
            .unwrap_or_default();
        if content.is_empty() {
            return Ok(None);
        }
        Ok(Some(parse_completion(content, channel)))
    }
}

/// Splits a completion into subject and body for the email channel. The
/// backend is asked to start email replies with a `Subject:` line; without
/// one the whole completion becomes the body under the default subject.
fn parse_completion(content: &str, channel: Channel) -> Message {
    match channel {
        Channel::Whatsapp => Message::Text(content.to_owned()),
        Channel::Email => {
            let mut lines = content.lines();
            let first = lines.next().unwrap_or_default();
            if let Some(subject) = first.strip_prefix("Subject:") {
                let body = lines.collect::<Vec<_>>().join("\n").trim().to_owned();
                Message::Email {
                    subject: subject.trim().to_owned(),
                    body,
                }
            } else {
                Message::Email {
                    subject: "Professional Website Services".to_owned(),
                    body: content.to_owned(),
                }
            }
        }
    }
}

#[async_trait]
impl MessageGenerator for GeneratorClient {
    async fn generate(&self, business: &BusinessRecord, channel: Channel) -> Message {
        if let Some(api_key) = self.api_key.clone() {
            match self.complete(&api_key, business, channel).await {
                Ok(Some(message)) => return message,
                Ok(None) => {
                    warn!(business = %business.name, %channel,
                          "empty completion, using template");
                }
                Err(error) => {
                    warn!(business = %business.name, %channel, %error,
                          "generation failed, using template");
                }
            }
        }
        message::fallback_message(business, channel, &self.identity)
    }
}

#[cfg(test)]
#[path = "generate_test.rs"]
mod tests;
