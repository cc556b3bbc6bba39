use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Operating status reported by the directory service.
///
/// Permanently closed businesses are discarded during ingestion, so a
/// `Closed` record should never survive past the batch executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessStatus {
    Operational,
    Closed,
}

impl std::fmt::Display for BusinessStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BusinessStatus::Operational => write!(f, "operational"),
            BusinessStatus::Closed => write!(f, "closed"),
        }
    }
}

/// One business discovered through the directory lookup.
///
/// `phone_numbers` only ever contains normalized, validated numbers; the
/// first entry is the primary contact number. `has_live_website` starts
/// `false` and is computed by the presence filter — a claimed website that
/// does not answer a probe still counts as absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessRecord {
    pub name: String,
    pub phone_numbers: Vec<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub address: String,
    pub categories: Vec<String>,
    pub rating: Option<f64>,
    pub rating_count: u32,
    /// Stable identifier assigned by the directory service.
    pub external_id: String,
    pub status: BusinessStatus,
    pub has_live_website: bool,
    /// The search query that surfaced this record.
    pub source_query: String,
    pub discovered_at: DateTime<Utc>,
}

impl BusinessRecord {
    /// The primary phone number, when the record has any.
    #[must_use]
    pub fn primary_phone(&self) -> Option<&str> {
        self.phone_numbers.first().map(String::as_str)
    }
}
