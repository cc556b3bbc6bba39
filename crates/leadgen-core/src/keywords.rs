//! Search-term configuration.
//!
//! Queries are the cross product of business types and locations from a YAML
//! file, rendered as `"{business type} in {location}"`. A targeted run can
//! bypass the file entirely and supply its own types and locations.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::ConfigError;

#[derive(Debug, Clone, Deserialize)]
pub struct KeywordsFile {
    pub business_types: Vec<String>,
    pub locations: Vec<String>,
}

impl KeywordsFile {
    /// Expand to the full list of search terms, types-major order.
    #[must_use]
    pub fn search_terms(&self) -> Vec<String> {
        expand_terms(&self.business_types, &self.locations)
    }
}

/// Render `"{business type} in {location}"` for every pair.
#[must_use]
pub fn expand_terms(business_types: &[String], locations: &[String]) -> Vec<String> {
    let mut terms = Vec::with_capacity(business_types.len() * locations.len());
    for business in business_types {
        for location in locations {
            terms.push(format!("{business} in {location}"));
        }
    }
    terms
}

/// Load and validate the keywords configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails
/// validation (empty lists, blank or duplicate entries).
pub fn load_keywords(path: &Path) -> Result<KeywordsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::KeywordsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let keywords: KeywordsFile = serde_yaml::from_str(&content)?;

    validate_keywords(&keywords)?;

    Ok(keywords)
}

fn validate_keywords(keywords: &KeywordsFile) -> Result<(), ConfigError> {
    if keywords.business_types.is_empty() {
        return Err(ConfigError::Validation(
            "business_types must be non-empty".to_string(),
        ));
    }
    if keywords.locations.is_empty() {
        return Err(ConfigError::Validation(
            "locations must be non-empty".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for entry in keywords.business_types.iter().chain(&keywords.locations) {
        if entry.trim().is_empty() {
            return Err(ConfigError::Validation(
                "keywords entries must be non-empty".to_string(),
            ));
        }
        if !seen.insert(entry.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate keywords entry: '{entry}'"
            )));
        }
    }

    Ok(())
}
