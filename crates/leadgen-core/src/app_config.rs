use std::path::PathBuf;

/// Runtime configuration for a lead-generation run.
///
/// Optional credentials (`directory_api_key`, `bridge_url`, `mail_api_key`,
/// `generator_api_key`) being absent is not an error — the dependent service
/// simply reports itself unavailable and the pipeline degrades gracefully.
#[derive(Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub keywords_path: PathBuf,
    pub leads_path: PathBuf,

    pub directory_api_key: Option<String>,
    pub directory_base_url: String,
    pub bridge_url: Option<String>,
    pub mail_api_key: Option<String>,
    pub mail_base_url: String,
    pub mail_from: String,
    pub generator_api_key: Option<String>,
    pub generator_base_url: String,

    pub agency_name: String,
    pub agency_phone: String,
    pub agency_email: String,

    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_concurrent_requests: usize,
    pub retry_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub inter_batch_delay_ms: u64,
    pub outreach_batch_size: usize,
    pub outreach_batch_delay_ms: u64,
    pub probe_timeout_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("log_level", &self.log_level)
            .field("keywords_path", &self.keywords_path)
            .field("leads_path", &self.leads_path)
            .field(
                "directory_api_key",
                &self.directory_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("directory_base_url", &self.directory_base_url)
            .field("bridge_url", &self.bridge_url)
            .field(
                "mail_api_key",
                &self.mail_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("mail_base_url", &self.mail_base_url)
            .field("mail_from", &self.mail_from)
            .field(
                "generator_api_key",
                &self.generator_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("generator_base_url", &self.generator_base_url)
            .field("agency_name", &self.agency_name)
            .field("agency_phone", &self.agency_phone)
            .field("agency_email", &self.agency_email)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_concurrent_requests", &self.max_concurrent_requests)
            .field("retry_attempts", &self.retry_attempts)
            .field("retry_base_delay_ms", &self.retry_base_delay_ms)
            .field("inter_batch_delay_ms", &self.inter_batch_delay_ms)
            .field("outreach_batch_size", &self.outreach_batch_size)
            .field("outreach_batch_delay_ms", &self.outreach_batch_delay_ms)
            .field("probe_timeout_secs", &self.probe_timeout_secs)
            .finish()
    }
}
