use reqwest::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors raised while bringing the view up.
#[derive(Debug, Error)]
pub enum CoreError {
    // Configuration errors
    #[error("Invalid config: {message}")]
    ConfigInvalid { message: String },

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid service base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),

    // Input errors
    #[error("Invalid date/time input {value:?}, expected YYYY-MM-DDTHH:MM")]
    InvalidDateTime { value: String },

    // Network errors
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    // IO errors
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;

/// Failure of a single request against the time service.
///
/// These never leave the poller or requester that issued the request: they
/// are logged and the affected part of the view keeps its previous state.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request could not be sent or no response was received.
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// The body was not valid JSON or lacked an expected field.
    #[error("Failed to decode {endpoint} response: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The service answered with a non-success status.
    #[error(
        "{endpoint} returned status {status}: {}",
        .detail.as_deref().unwrap_or("no detail")
    )]
    Status {
        endpoint: &'static str,
        status: StatusCode,
        detail: Option<String>,
    },
}

impl ServiceError {
    /// Short classification used in log lines.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Decode { .. } => "decode",
            Self::Status { .. } => "status",
        }
    }
}
