use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutreachError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected HTTP status {status} from {endpoint}")]
    UnexpectedStatus { status: u16, endpoint: String },

    #[error("{channel} channel is not configured")]
    NotConfigured { channel: &'static str },

    #[error("invalid phone number: {0}")]
    InvalidPhone(String),
}

#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("failed to serialize lead entry: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to append to lead file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
