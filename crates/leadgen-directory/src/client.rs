//! HTTP client for the Places-style directory API.
//!
//! A query resolves in two steps: a text search returning candidate place
//! ids, then a details fetch per id. Both calls go through the linear-backoff
//! retry policy independently; a failed details fetch drops that one
//! candidate, never the whole query. Permanently closed businesses are
//! discarded here, before deduplication.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Url};

use leadgen_core::phone;
use leadgen_core::record::{BusinessRecord, BusinessStatus};

use crate::error::DirectoryError;
use crate::retry::retry_with_backoff;
use crate::types::{
    DetailsResponse, PlaceDetails, SearchResponse, STATUS_OK, STATUS_ZERO_RESULTS,
};

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/place";

const DETAIL_FIELDS: &str = "name,formatted_phone_number,international_phone_number,website,\
                             formatted_address,business_status,types,vicinity,rating,\
                             user_ratings_total";

const CLOSED_PERMANENTLY: &str = "CLOSED_PERMANENTLY";

/// Resolves one search query to zero or more business records.
///
/// Implementors must not panic; a failed query surfaces as an error the
/// batch executor downgrades to zero records.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<BusinessRecord>, DirectoryError>;
}

/// Client for the directory lookup service.
///
/// Use [`DirectoryClient::new`] for production or
/// [`DirectoryClient::with_base_url`] to point at a mock server in tests.
pub struct DirectoryClient {
    client: Client,
    api_key: String,
    base_url: Url,
    max_retries: u32,
    retry_base_delay_ms: u64,
}

impl DirectoryClient {
    /// Creates a client pointed at the production directory API.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        api_key: &str,
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        retry_base_delay_ms: u64,
    ) -> Result<Self, DirectoryError> {
        Self::with_base_url(
            api_key,
            timeout_secs,
            user_agent,
            max_retries,
            retry_base_delay_ms,
            DEFAULT_BASE_URL,
        )
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`DirectoryError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        retry_base_delay_ms: u64,
        base_url: &str,
    ) -> Result<Self, DirectoryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Keep exactly one trailing slash so join() appends path segments
        // instead of replacing the last one.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url =
            Url::parse(&normalised).map_err(|e| DirectoryError::InvalidBaseUrl {
                base_url: normalised.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url,
            max_retries,
            retry_base_delay_ms,
        })
    }

    /// Resolves `query` to business records: text search, then a details
    /// fetch per candidate.
    ///
    /// A details failure (after retries) drops only that candidate, with an
    /// error log. Permanently closed businesses are dropped silently.
    ///
    /// # Errors
    ///
    /// Returns an error when the text search itself fails after retries;
    /// callers treat that as zero records for the query.
    pub async fn search_places(
        &self,
        query: &str,
    ) -> Result<Vec<BusinessRecord>, DirectoryError> {
        tracing::debug!(query, "searching directory");

        let url = self.build_url("textsearch/json", &[("query", query)])?;
        let search = retry_with_backoff(self.max_retries, self.retry_base_delay_ms, || {
            let url = url.clone();
            async move {
                let body = self.request_json(&url).await?;
                let parsed: SearchResponse =
                    serde_json::from_value(body).map_err(|e| DirectoryError::Deserialize {
                        context: format!("text search for \"{query}\""),
                        source: e,
                    })?;
                if parsed.status != STATUS_OK && parsed.status != STATUS_ZERO_RESULTS {
                    return Err(DirectoryError::Api {
                        status: parsed.status,
                        message: parsed.error_message,
                    });
                }
                Ok(parsed)
            }
        })
        .await?;

        if search.status == STATUS_ZERO_RESULTS {
            tracing::debug!(query, "no results for query");
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        for place in search.results {
            match self.place_details(&place.place_id).await {
                Ok(Some(mut record)) => {
                    record.source_query = query.to_owned();
                    records.push(record);
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::error!(
                        place_id = %place.place_id,
                        error = %err,
                        "failed to fetch place details, dropping candidate"
                    );
                }
            }
        }

        tracing::info!(query, found = records.len(), "directory search complete");
        Ok(records)
    }

    /// Fetches the details for one place id and maps it to a
    /// [`BusinessRecord`].
    ///
    /// Returns `Ok(None)` for permanently closed businesses and for OK
    /// responses with no payload.
    ///
    /// # Errors
    ///
    /// - [`DirectoryError::Api`] if the API returns a failure status.
    /// - [`DirectoryError::Http`] / [`DirectoryError::UnexpectedStatus`] on
    ///   transport failures after retries.
    /// - [`DirectoryError::Deserialize`] if the body does not match the
    ///   expected shape.
    pub async fn place_details(
        &self,
        place_id: &str,
    ) -> Result<Option<BusinessRecord>, DirectoryError> {
        let url = self.build_url(
            "details/json",
            &[("place_id", place_id), ("fields", DETAIL_FIELDS)],
        )?;

        let details = retry_with_backoff(self.max_retries, self.retry_base_delay_ms, || {
            let url = url.clone();
            async move {
                let body = self.request_json(&url).await?;
                let parsed: DetailsResponse =
                    serde_json::from_value(body).map_err(|e| DirectoryError::Deserialize {
                        context: format!("details for place {place_id}"),
                        source: e,
                    })?;
                if parsed.status != STATUS_OK {
                    return Err(DirectoryError::Api {
                        status: parsed.status,
                        message: parsed.error_message,
                    });
                }
                Ok(parsed)
            }
        })
        .await?;

        let Some(place) = details.result else {
            tracing::warn!(place_id, "details response had no payload");
            return Ok(None);
        };

        if place.business_status.as_deref() == Some(CLOSED_PERMANENTLY) {
            tracing::debug!(place_id, "skipping permanently closed business");
            return Ok(None);
        }

        Ok(Some(Self::build_record(place_id, place)))
    }

    fn build_record(place_id: &str, place: PlaceDetails) -> BusinessRecord {
        let mut phones: Vec<String> = Vec::new();
        for field in [
            place.formatted_phone_number.as_deref(),
            place.international_phone_number.as_deref(),
        ]
        .into_iter()
        .flatten()
        {
            for number in phone::extract(field) {
                if !phones.contains(&number) {
                    phones.push(number);
                }
            }
        }

        let address = place
            .formatted_address
            .or(place.vicinity)
            .unwrap_or_default();

        BusinessRecord {
            name: place.name,
            phone_numbers: phones,
            email: None,
            website: place.website,
            address,
            categories: place.types,
            rating: place.rating,
            rating_count: place.user_ratings_total.unwrap_or(0),
            external_id: place_id.to_owned(),
            status: BusinessStatus::Operational,
            has_live_website: false,
            source_query: String::new(),
            discovered_at: Utc::now(),
        }
    }

    /// Builds an endpoint URL with the API key and query parameters
    /// percent-encoded.
    fn build_url(&self, path: &str, extra: &[(&str, &str)]) -> Result<Url, DirectoryError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| DirectoryError::InvalidBaseUrl {
                base_url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in extra {
                pairs.append_pair(k, v);
            }
            pairs.append_pair("key", &self.api_key);
        }
        Ok(url)
    }

    /// Sends a GET request, asserts a 2xx status, and parses the body as
    /// JSON. Error context uses the URL path only, never the full query
    /// string, so the API key stays out of logs.
    async fn request_json(&self, url: &Url) -> Result<serde_json::Value, DirectoryError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DirectoryError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.path().to_owned(),
            });
        }
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| DirectoryError::Deserialize {
            context: url.path().to_owned(),
            source: e,
        })
    }
}

#[async_trait]
impl Directory for DirectoryClient {
    async fn search(&self, query: &str) -> Result<Vec<BusinessRecord>, DirectoryError> {
        self.search_places(query).await
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
