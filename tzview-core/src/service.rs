use crate::error::ServiceError;
use crate::model::{ConversionRequest, ConversionResult, CurrentTime, TimeZoneEntry};
use async_trait::async_trait;

/// Remote time service the view polls and submits conversions to.
///
/// All time zone math happens behind this trait. Implementations return one
/// result per call and never retry; callers decide what a failure means.
#[async_trait]
pub trait TimeZoneService: Send + Sync {
    /// Get the service name (used in log lines)
    fn name(&self) -> &'static str;

    /// Fetch the full list of supported zones with their current times.
    async fn list_time_zones(&self) -> Result<Vec<TimeZoneEntry>, ServiceError>;

    /// Fetch the service host's own zone and time.
    async fn current_time(&self) -> Result<CurrentTime, ServiceError>;

    /// Convert a local time from one zone to another.
    async fn convert_time(
        &self,
        request: &ConversionRequest,
    ) -> Result<ConversionResult, ServiceError>;
}
