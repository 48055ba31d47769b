use crate::error::{CoreError, Result};
use const_format::concatcp;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use url::Url;

/// Default base URL of the time service
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TzviewConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL the three service endpoints are resolved against
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

const fn default_request_timeout() -> u64 {
    10
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ServiceConfig {
    /// Parse the configured base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is malformed or cannot carry a path.
    pub fn parse_base_url(&self) -> Result<Url> {
        let url = Url::parse(&self.base_url)?;
        if url.cannot_be_a_base() {
            return Err(CoreError::ConfigInvalid {
                message: format!("service.base_url {:?} cannot be a base URL", self.base_url),
            });
        }
        Ok(url)
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Interval of the time zone list poller in milliseconds
    #[serde(default = "default_timezones_interval")]
    pub timezones_interval_ms: u64,
    /// Interval of the current time poller in milliseconds
    #[serde(default = "default_current_time_interval")]
    pub current_time_interval_ms: u64,
}

const fn default_timezones_interval() -> u64 {
    5000
}

const fn default_current_time_interval() -> u64 {
    1000
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            timezones_interval_ms: default_timezones_interval(),
            current_time_interval_ms: default_current_time_interval(),
        }
    }
}

impl PollingConfig {
    #[must_use]
    pub const fn timezones_interval(&self) -> Duration {
        Duration::from_millis(self.timezones_interval_ms)
    }

    #[must_use]
    pub const fn current_time_interval(&self) -> Duration {
        Duration::from_millis(self.current_time_interval_ms)
    }
}

/// Placeholder values shown before the first successful poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default = "default_selected_timezone")]
    pub selected_timezone: String,
    #[serde(default = "default_source_timezone")]
    pub source_timezone: String,
    #[serde(default = "default_target_timezone")]
    pub target_timezone: String,
}

fn default_selected_timezone() -> String {
    "Asia/Kolkata".to_string()
}

fn default_source_timezone() -> String {
    "America/New_York".to_string()
}

fn default_target_timezone() -> String {
    "Asia/Kolkata".to_string()
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            selected_timezone: default_selected_timezone(),
            source_timezone: default_source_timezone(),
            target_timezone: default_target_timezone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Also write logs to a file in the cache directory
    #[serde(default)]
    pub enabled: bool,
}

impl TzviewConfig {
    /// Get the config file path (~/.config/tzview/config.toml)
    #[must_use]
    pub fn config_path() -> PathBuf {
        crate::paths::config_path()
    }

    /// Load config from the default location, writing the template on first run.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read, written, parsed or
    /// fails validation.
    pub fn load_or_create() -> Result<Self> {
        Self::load_or_create_at(&Self::config_path())
    }

    /// Load config from `path`, writing the template there if it is missing.
    ///
    /// A freshly written template holds the defaults, so first run proceeds
    /// with them.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read, written, parsed or
    /// fails validation.
    pub fn load_or_create_at(path: &Path) -> Result<Self> {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, CONFIG_TEMPLATE)?;
            info!("Created config template at {}", path.display());
        }

        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|source| {
            CoreError::ConfigParseError {
                path: path.to_path_buf(),
                source,
            }
        })?;
        config.validate()?;

        Ok(config)
    }

    /// Check values serde cannot check on its own.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero polling interval, a zero timeout or an
    /// unusable base URL.
    pub fn validate(&self) -> Result<()> {
        self.service.parse_base_url()?;

        if self.service.request_timeout_secs == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "service.request_timeout_secs must be greater than 0".into(),
            });
        }
        if self.polling.timezones_interval_ms == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "polling.timezones_interval_ms must be greater than 0".into(),
            });
        }
        if self.polling.current_time_interval_ms == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "polling.current_time_interval_ms must be greater than 0".into(),
            });
        }

        Ok(())
    }
}

/// Template written on first run. Every value matches the serde default.
pub const CONFIG_TEMPLATE: &str = concatcp!(
    r#"# tzview Configuration
# ~/.config/tzview/config.toml

[service]
# Time service serving /timezones, /current_time and /convert-time
base_url = ""#,
    DEFAULT_BASE_URL,
    r#""
request_timeout_secs = 10

[polling]
timezones_interval_ms = 5000
current_time_interval_ms = 1000

[defaults]
# Shown until the service answers
selected_timezone = "Asia/Kolkata"
# Initial conversion form values
source_timezone = "America/New_York"
target_timezone = "Asia/Kolkata"

[logging]
# Also write logs to the cache directory (tzview.log)
enabled = false
"#
);
