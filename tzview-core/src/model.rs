//! Records exchanged with the time service.

use serde::{Deserialize, Serialize};

/// A time zone offered by the service, with its current wall-clock time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeZoneEntry {
    /// Zone identifier (e.g. "Asia/Kolkata")
    pub timezone: String,
    /// Current time in the zone, formatted by the service
    pub current_time: String,
}

impl TimeZoneEntry {
    /// Create a new entry
    pub fn new(timezone: impl Into<String>, current_time: impl Into<String>) -> Self {
        Self {
            timezone: timezone.into(),
            current_time: current_time.into(),
        }
    }
}

/// The service host's own time zone and time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentTime {
    pub current_time: String,
    pub timezone: String,
}

/// Body of a conversion request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRequest {
    pub source_timezone: String,
    pub target_timezone: String,
    /// Local date/time in the source zone, `YYYY-MM-DDTHH:MM`
    pub time: String,
}

/// A completed conversion as returned by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub source_time: String,
    pub source_timezone: String,
    pub target_time: String,
    pub target_timezone: String,
}
