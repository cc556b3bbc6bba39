//! Outreach message shapes and deterministic fallback templates.
//!
//! Generated content is either a plain text message (messaging channel) or a
//! subject/body pair (email). The fallback templates require no network and
//! no configuration; generation can therefore never produce an empty
//! message, whatever happens upstream.

use serde::{Deserialize, Serialize};

use leadgen_core::record::BusinessRecord;

use crate::outcome::Channel;

const DEFAULT_EMAIL_SUBJECT: &str = "Professional Website Services";

/// Who the outreach is sent on behalf of; substituted into every template.
#[derive(Debug, Clone)]
pub struct AgencyIdentity {
    pub name: String,
    pub phone: String,
    pub email: String,
}

/// Requested register for generated messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Professional,
    Friendly,
}

impl std::fmt::Display for Tone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tone::Professional => write!(f, "professional"),
            Tone::Friendly => write!(f, "friendly"),
        }
    }
}

/// One generated outreach message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Message {
    Text(String),
    Email { subject: String, body: String },
}

impl Message {
    /// The plain-text rendition, for channels that take a single string.
    #[must_use]
    pub fn as_text(&self) -> &str {
        match self {
            Message::Text(text) => text,
            Message::Email { body, .. } => body,
        }
    }

    /// Subject and body for the email channel. A bare text message gets the
    /// default subject.
    #[must_use]
    pub fn email_parts(&self) -> (&str, &str) {
        match self {
            Message::Text(text) => (DEFAULT_EMAIL_SUBJECT, text),
            Message::Email { subject, body } => (subject, body),
        }
    }
}

/// Best-effort location for personalization: the segment of the address
/// before the first comma, or a generic stand-in.
#[must_use]
pub fn location_from_address(address: &str) -> &str {
    let first = address.split(',').next().unwrap_or("").trim();
    if first.is_empty() {
        "your area"
    } else {
        first
    }
}

/// The deterministic template used when generation is unconfigured or
/// failing. Never empty.
#[must_use]
pub fn fallback_message(
    business: &BusinessRecord,
    channel: Channel,
    identity: &AgencyIdentity,
) -> Message {
    let business_name = if business.name.is_empty() {
        "Business Owner"
    } else {
        &business.name
    };
    let location = location_from_address(&business.address);

    match channel {
        Channel::Whatsapp => Message::Text(format!(
            "Hi {business_name}!\n\n\
             I noticed your business in {location} and wanted to reach out. Many customers \
             now search online for services like yours, and having a professional website \
             can really help you stand out and attract more clients.\n\n\
             We at {agency} specialize in creating websites for local Kenyan businesses. \
             We'd love to help you establish a strong online presence.\n\n\
             Interested in learning more? Let's chat!\n\n\
             {agency}\n{phone}",
            agency = identity.name,
            phone = identity.phone,
        )),
        Channel::Email => Message::Email {
            subject: format!("Professional Website for {business_name} - Grow Your Business Online"),
            body: format!(
                "Hello {business_name},\n\n\
                 I hope this email finds you well. I came across your business in {location} \
                 and wanted to reach out with an opportunity that could help you grow.\n\n\
                 In today's digital world, more customers are searching online for services \
                 like yours. Having a professional website can help you reach them, build \
                 trust, and stand out from competitors.\n\n\
                 We at {agency} specialize in websites for local Kenyan businesses, and we'd \
                 love to help you establish a strong online presence.\n\n\
                 Feel free to reply to this email or call us on {phone}.\n\n\
                 Kind regards,\n{agency}\n{phone}\n{email}",
                agency = identity.name,
                phone = identity.phone,
                email = identity.email,
            ),
        },
    }
}

/// Prompt sent to the generation backend when it is configured.
#[must_use]
pub fn build_prompt(business: &BusinessRecord, channel: Channel, tone: Tone) -> String {
    let channel_spec = match channel {
        Channel::Whatsapp => "WhatsApp message (keep under 200 words, casual but professional)",
        Channel::Email => "email subject line and body (can be longer, more detailed)",
    };
    let categories = if business.categories.is_empty() {
        "local services".to_owned()
    } else {
        business.categories.join(", ")
    };
    let location = location_from_address(&business.address);

    format!(
        "Create a personalized {channel_spec} for a {tone} outreach to \"{name}\", \
         a {categories} business located in {location}, Kenya.\n\n\
         The message should address them by business name, mention their location and \
         business type naturally, explain how a professional website can help their \
         specific business, include a clear value proposition with a soft call-to-action, \
         and note that many customers now search online for their services. \
         Avoid being too salesy.{email_extra}",
        name = business.name,
        email_extra = match channel {
            Channel::Email => "\nStart the reply with a line \"Subject: ...\".",
            Channel::Whatsapp => "",
        },
    )
}
