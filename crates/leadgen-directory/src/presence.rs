//! Website presence probing.
//!
//! Decides whether a record's claimed website is actually reachable. Records
//! with no website field are classified as absent without any network call.
//! Claimed sites get a header-only request with a short timeout; any response
//! with a status below 400 counts as live. A 4xx response is still a
//! response and settles the question as "not live" without retrying. When
//! the transport itself fails for an `http://` URL, the `https://`
//! equivalent is probed once before the site is declared unreachable.
//!
//! This stage intentionally probes one record at a time: by the time it
//! runs, volumes are already small, and simplicity beats throughput here.

use std::time::Duration;

use reqwest::Client;

use leadgen_core::record::BusinessRecord;

use crate::error::DirectoryError;

pub struct PresenceFilter {
    client: Client,
}

impl PresenceFilter {
    /// Creates a probe client with the given per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, DirectoryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            // A redirect answer already proves the site is alive; following
            // it would only re-classify based on the target.
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { client })
    }

    /// Keeps the records whose website is absent or dead, updating
    /// `has_live_website` on every record as it goes.
    pub async fn filter_without_website(
        &self,
        records: Vec<BusinessRecord>,
    ) -> Vec<BusinessRecord> {
        let total = records.len();
        let mut filtered: Vec<BusinessRecord> = Vec::new();

        for mut record in records {
            let live = match record.website.as_deref() {
                None => false,
                Some(website) => self.has_live_website(website).await,
            };
            record.has_live_website = live;

            if live {
                tracing::debug!(
                    name = %record.name,
                    website = record.website.as_deref().unwrap_or(""),
                    "skipping business with a live website"
                );
            } else {
                filtered.push(record);
            }
        }

        tracing::info!(
            kept = filtered.len(),
            total,
            "presence filter kept businesses without a live website"
        );
        filtered
    }

    /// Probes `website`, falling back from `http://` to `https://` on a
    /// transport-level failure.
    pub async fn has_live_website(&self, website: &str) -> bool {
        self.probe_candidates(&probe_candidates(website)).await
    }

    /// Tries each candidate URL with a HEAD request until one answers.
    /// A response of any status settles the question (live iff `< 400`);
    /// only transport failures move on to the next candidate.
    pub(crate) async fn probe_candidates(&self, candidates: &[String]) -> bool {
        for url in candidates {
            match self.client.head(url).send().await {
                Ok(response) => return response.status().as_u16() < 400,
                Err(err) => {
                    tracing::debug!(url = %url, error = %err, "presence probe failed");
                }
            }
        }
        false
    }
}

/// The ordered probe targets for a claimed website: the URL itself, then the
/// `https://` rewrite when the original is plain `http://`.
pub(crate) fn probe_candidates(website: &str) -> Vec<String> {
    let mut candidates = vec![website.to_owned()];
    if let Some(rest) = website.strip_prefix("http://") {
        candidates.push(format!("https://{rest}"));
    }
    candidates
}

#[cfg(test)]
#[path = "presence_test.rs"]
mod tests;
