use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use tzview_core::{
    ConversionRequest, ConversionResult, CoreError, CurrentTime, ServiceConfig, ServiceError,
    TimeZoneEntry, TimeZoneService,
};
use url::Url;

const LOG_TARGET: &str = "tzview::http";

const TIMEZONES_PATH: &str = "timezones";
const CURRENT_TIME_PATH: &str = "current_time";
const CONVERT_TIME_PATH: &str = "convert-time";

/// Default timeout for HTTP requests (10 seconds)
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Time service reached over HTTP/JSON
pub struct HttpTimeZoneService {
    client: Client,
    timezones_url: Url,
    current_time_url: Url,
    convert_time_url: Url,
}

impl HttpTimeZoneService {
    /// Create a service client with the default 10-second timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is invalid or the HTTP client cannot be created.
    pub fn new(base_url: &str) -> Result<Self, CoreError> {
        Self::with_timeout(Url::parse(base_url)?, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a service client from the `[service]` config section.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot be created.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, CoreError> {
        Self::with_timeout(config.parse_base_url()?, config.request_timeout())
    }

    /// Create a service client with an explicit per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoints cannot be resolved against `base_url`
    /// or the HTTP client cannot be created.
    pub fn with_timeout(mut base_url: Url, timeout: Duration) -> Result<Self, CoreError> {
        // Resolve endpoints below the base path, not next to its last segment
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .user_agent(concat!("tzview/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            timezones_url: base_url.join(TIMEZONES_PATH)?,
            current_time_url: base_url.join(CURRENT_TIME_PATH)?,
            convert_time_url: base_url.join(CONVERT_TIME_PATH)?,
        })
    }
}

/// Response from `GET /timezones`
#[derive(Debug, Deserialize)]
struct TimeZonesResponse {
    timezones: Vec<TimeZoneEntry>,
}

/// Error body of a rejected request. The service sends either a message
/// string or a list of validation errors under `detail`.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    detail: serde_json::Value,
}

impl ErrorResponse {
    fn into_message(self) -> String {
        match self.detail {
            serde_json::Value::String(message) => message,
            other => other.to_string(),
        }
    }
}

/// Read the body and decode it, classifying status and decode failures.
async fn read_json<T: DeserializeOwned>(
    endpoint: &'static str,
    response: Response,
) -> Result<T, ServiceError> {
    let status = response.status();
    let body = response.bytes().await?;
    debug!(target: LOG_TARGET, "{} -> {} ({} bytes)", endpoint, status, body.len());

    if !status.is_success() {
        let detail = serde_json::from_slice::<ErrorResponse>(&body)
            .ok()
            .map(ErrorResponse::into_message);
        return Err(ServiceError::Status {
            endpoint,
            status,
            detail,
        });
    }

    serde_json::from_slice(&body).map_err(|source| ServiceError::Decode { endpoint, source })
}

#[async_trait]
impl TimeZoneService for HttpTimeZoneService {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn list_time_zones(&self) -> Result<Vec<TimeZoneEntry>, ServiceError> {
        let response = self.client.get(self.timezones_url.clone()).send().await?;
        let body: TimeZonesResponse = read_json("/timezones", response).await?;
        Ok(body.timezones)
    }

    async fn current_time(&self) -> Result<CurrentTime, ServiceError> {
        let response = self.client.get(self.current_time_url.clone()).send().await?;
        read_json("/current_time", response).await
    }

    async fn convert_time(
        &self,
        request: &ConversionRequest,
    ) -> Result<ConversionResult, ServiceError> {
        let response = self
            .client
            .post(self.convert_time_url.clone())
            .json(request)
            .send()
            .await?;
        read_json("/convert-time", response).await
    }
}
