use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the
/// process, without touching `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// The core parsing/validation logic is decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var).ok().filter(|v| !v.trim().is_empty())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let log_level = or_default("LEADGEN_LOG_LEVEL", "info");
    let keywords_path = PathBuf::from(or_default(
        "LEADGEN_KEYWORDS_PATH",
        "./config/keywords.yaml",
    ));
    let leads_path = PathBuf::from(or_default("LEADGEN_LEADS_PATH", "./leads.jsonl"));

    let directory_api_key = optional("LEADGEN_DIRECTORY_API_KEY");
    let directory_base_url = or_default(
        "LEADGEN_DIRECTORY_BASE_URL",
        "https://maps.googleapis.com/maps/api/place",
    );
    let bridge_url = optional("LEADGEN_BRIDGE_URL");
    let mail_api_key = optional("LEADGEN_MAIL_API_KEY");
    let mail_base_url = or_default("LEADGEN_MAIL_BASE_URL", "https://api.sendgrid.com");
    let mail_from = or_default("LEADGEN_MAIL_FROM", "kidanga.agency@gmail.com");
    let generator_api_key = optional("LEADGEN_GENERATOR_API_KEY");
    let generator_base_url =
        or_default("LEADGEN_GENERATOR_BASE_URL", "https://api.openai.com");

    let agency_name = or_default("LEADGEN_AGENCY_NAME", "Kidanga");
    let agency_phone = or_default("LEADGEN_AGENCY_PHONE", "+254790147060");
    let agency_email = or_default("LEADGEN_AGENCY_EMAIL", "kidanga.agency@gmail.com");

    let request_timeout_secs = parse_u64("LEADGEN_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("LEADGEN_USER_AGENT", "leadgen/0.1 (lead-generation)");
    let max_concurrent_requests = parse_usize("LEADGEN_MAX_CONCURRENT_REQUESTS", "5")?;
    let retry_attempts = parse_u32("LEADGEN_RETRY_ATTEMPTS", "3")?;
    let retry_base_delay_ms = parse_u64("LEADGEN_RETRY_BASE_DELAY_MS", "1000")?;
    let inter_batch_delay_ms = parse_u64("LEADGEN_INTER_BATCH_DELAY_MS", "2000")?;
    let outreach_batch_size = parse_usize("LEADGEN_OUTREACH_BATCH_SIZE", "5")?;
    let outreach_batch_delay_ms = parse_u64("LEADGEN_OUTREACH_BATCH_DELAY_MS", "2000")?;
    let probe_timeout_secs = parse_u64("LEADGEN_PROBE_TIMEOUT_SECS", "5")?;

    Ok(AppConfig {
        log_level,
        keywords_path,
        leads_path,
        directory_api_key,
        directory_base_url,
        bridge_url,
        mail_api_key,
        mail_base_url,
        mail_from,
        generator_api_key,
        generator_base_url,
        agency_name,
        agency_phone,
        agency_email,
        request_timeout_secs,
        user_agent,
        max_concurrent_requests,
        retry_attempts,
        retry_base_delay_ms,
        inter_batch_delay_ms,
        outreach_batch_size,
        outreach_batch_delay_ms,
        probe_timeout_secs,
    })
}
