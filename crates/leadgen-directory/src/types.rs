//! Wire types for the Places-style directory API.
//!
//! Two endpoints are involved: a text search that resolves a query to
//! candidate place ids, and a details fetch per id. Both wrap their payload
//! in an envelope with a `status` field (`"OK"`, `"ZERO_RESULTS"`, or an
//! error code with an optional `error_message`).

use serde::Deserialize;

pub const STATUS_OK: &str = "OK";
pub const STATUS_ZERO_RESULTS: &str = "ZERO_RESULTS";
/// Quota exhaustion; transient from the caller's point of view.
pub const STATUS_OVER_QUERY_LIMIT: &str = "OVER_QUERY_LIMIT";

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub status: String,
    #[serde(default)]
    pub results: Vec<PlaceSummary>,
    pub error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlaceSummary {
    pub place_id: String,
}

#[derive(Debug, Deserialize)]
pub struct DetailsResponse {
    pub status: String,
    pub result: Option<PlaceDetails>,
    pub error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlaceDetails {
    pub name: String,
    pub formatted_phone_number: Option<String>,
    pub international_phone_number: Option<String>,
    pub website: Option<String>,
    pub formatted_address: Option<String>,
    pub vicinity: Option<String>,
    pub business_status: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
    pub rating: Option<f64>,
    pub user_ratings_total: Option<u32>,
}
