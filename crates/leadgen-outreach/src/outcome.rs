//! Per-business, per-channel outreach results.
//!
//! A `ContactOutcome` is owned by the state machine while one business is
//! being processed, then handed off immutably to the lead recorder. Channels
//! start out `NotAttempted`; every state transition overwrites exactly one
//! channel's attempt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An outbound contact medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Whatsapp,
    Email,
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Channel::Whatsapp => write!(f, "whatsapp"),
            Channel::Email => write!(f, "email"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    NotAttempted,
    /// The channel works but this business offers nothing to send to
    /// (no email address, number not on the messaging network).
    NoTarget,
    /// The channel itself is unusable: session not ready, transport not
    /// configured, availability check failed.
    ChannelUnavailable,
    Sent,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelAttempt {
    pub status: AttemptStatus,
    pub error: Option<String>,
    pub attempted_at: Option<DateTime<Utc>>,
}

impl ChannelAttempt {
    #[must_use]
    pub fn not_attempted() -> Self {
        Self {
            status: AttemptStatus::NotAttempted,
            error: None,
            attempted_at: None,
        }
    }

    #[must_use]
    pub fn no_target() -> Self {
        Self {
            status: AttemptStatus::NoTarget,
            error: None,
            attempted_at: None,
        }
    }

    #[must_use]
    pub fn unavailable(error: Option<String>) -> Self {
        Self {
            status: AttemptStatus::ChannelUnavailable,
            error,
            attempted_at: None,
        }
    }

    #[must_use]
    pub fn sent() -> Self {
        Self {
            status: AttemptStatus::Sent,
            error: None,
            attempted_at: Some(Utc::now()),
        }
    }

    #[must_use]
    pub fn failed(error: String) -> Self {
        Self {
            status: AttemptStatus::Failed,
            error: Some(error),
            attempted_at: Some(Utc::now()),
        }
    }
}

impl Default for ChannelAttempt {
    fn default() -> Self {
        Self::not_attempted()
    }
}

/// The complete result of processing one business.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactOutcome {
    pub whatsapp: ChannelAttempt,
    pub email: ChannelAttempt,
    pub skip_reason: Option<String>,
    pub contacted_at: DateTime<Utc>,
}

impl ContactOutcome {
    #[must_use]
    pub fn new() -> Self {
        Self {
            whatsapp: ChannelAttempt::not_attempted(),
            email: ChannelAttempt::not_attempted(),
            skip_reason: None,
            contacted_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn attempt(&self, channel: Channel) -> &ChannelAttempt {
        match channel {
            Channel::Whatsapp => &self.whatsapp,
            Channel::Email => &self.email,
        }
    }

    /// True when no channel got a message out.
    #[must_use]
    pub fn nothing_sent(&self) -> bool {
        self.whatsapp.status != AttemptStatus::Sent && self.email.status != AttemptStatus::Sent
    }
}

impl Default for ContactOutcome {
    fn default() -> Self {
        Self::new()
    }
}
