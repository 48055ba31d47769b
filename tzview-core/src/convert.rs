//! User-triggered time conversion.

use crate::service::TimeZoneService;
use crate::state::{Outcome, Slot, ViewModel};
use std::sync::Arc;
use tracing::{info, warn};

const LOG_TARGET: &str = "tzview::convert";

/// Sends the conversion form to the time service.
///
/// Each call sends exactly one request; nothing is retried or deduplicated.
#[derive(Clone)]
pub struct ConversionRequester {
    service: Arc<dyn TimeZoneService>,
    view: Arc<ViewModel>,
}

impl ConversionRequester {
    pub fn new(service: Arc<dyn TimeZoneService>, view: Arc<ViewModel>) -> Self {
        Self { service, view }
    }

    /// Start a conversion in a background task and return immediately.
    ///
    /// Repeated submissions overlap; the last one submitted wins.
    #[must_use]
    pub fn submit(&self) -> tokio::task::JoinHandle<Outcome> {
        let requester = self.clone();
        tokio::spawn(async move { requester.convert().await })
    }

    /// Convert the current form values and store the result in the view.
    ///
    /// On failure the previous result stays in place and older conversions
    /// still in flight are discarded when they land.
    pub async fn convert(&self) -> Outcome {
        let ticket = self.view.issue_ticket(Slot::Conversion);
        let request = self.view.conversion_request().await;

        info!(
            target: LOG_TARGET,
            "Converting {} from {} to {} (#{})",
            request.time,
            request.source_timezone,
            request.target_timezone,
            ticket.seq()
        );

        match self.service.convert_time(&request).await {
            Ok(result) => {
                info!(
                    target: LOG_TARGET,
                    "Converted {} ({}) -> {} ({})",
                    result.source_time,
                    result.source_timezone,
                    result.target_time,
                    result.target_timezone
                );
                self.view.apply_conversion(ticket, result).await
            }
            Err(e) => {
                warn!(target: LOG_TARGET, "Error converting time ({}): {}", e.kind(), e);
                self.view.record_failure(ticket).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DefaultsConfig;
    use crate::error::ServiceError;
    use crate::model::{ConversionRequest, ConversionResult, CurrentTime, TimeZoneEntry};
    use crate::state::ClientState;
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Answers conversions from a script and rejects `Bad/*` targets; records
    /// every request it sees.
    struct ScriptedService {
        requests: Mutex<Vec<ConversionRequest>>,
        answer: Mutex<Option<ConversionResult>>,
        delays: Mutex<Vec<Duration>>,
    }

    impl ScriptedService {
        fn new(answer: Option<ConversionResult>) -> Arc<Self> {
            Arc::new(Self {
                requests: Mutex::new(Vec::new()),
                answer: Mutex::new(answer),
                delays: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<ConversionRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TimeZoneService for ScriptedService {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn list_time_zones(&self) -> Result<Vec<TimeZoneEntry>, ServiceError> {
            Ok(Vec::new())
        }

        async fn current_time(&self) -> Result<CurrentTime, ServiceError> {
            Ok(CurrentTime {
                current_time: String::new(),
                timezone: String::new(),
            })
        }

        async fn convert_time(
            &self,
            request: &ConversionRequest,
        ) -> Result<ConversionResult, ServiceError> {
            let delay = {
                self.requests.lock().unwrap().push(request.clone());
                let mut delays = self.delays.lock().unwrap();
                if delays.is_empty() {
                    Duration::ZERO
                } else {
                    delays.remove(0)
                }
            };
            tokio::time::sleep(delay).await;

            let answer = self
                .answer
                .lock()
                .unwrap()
                .clone()
                .filter(|_| !request.target_timezone.starts_with("Bad/"));
            answer.map_or_else(
                || {
                    Err(ServiceError::Status {
                        endpoint: "/convert-time",
                        status: StatusCode::BAD_REQUEST,
                        detail: Some("Target timezone is not supported.".into()),
                    })
                },
                |result| {
                    Ok(ConversionResult {
                        target_time: format!("{} for {}", result.target_time, request.time),
                        ..result
                    })
                },
            )
        }
    }

    fn kolkata_result() -> ConversionResult {
        ConversionResult {
            source_time: "2025-03-08T05:08:00-05:00".into(),
            source_timezone: "America/New_York".into(),
            target_time: "2025-03-08T15:38:00+05:30".into(),
            target_timezone: "Asia/Kolkata".into(),
        }
    }

    fn view_at(time: &str) -> Arc<ViewModel> {
        ViewModel::new(ClientState::new(&DefaultsConfig::default(), time), None)
    }

    fn requester(service: &Arc<ScriptedService>, view: &Arc<ViewModel>) -> ConversionRequester {
        let service: Arc<dyn TimeZoneService> = service.clone();
        ConversionRequester::new(service, Arc::clone(view))
    }

    #[tokio::test]
    async fn test_successful_conversion_populates_result() {
        let service = ScriptedService::new(Some(kolkata_result()));
        let view = view_at("2025-03-08T05:08");

        let outcome = requester(&service, &view).convert().await;

        assert_eq!(outcome, Outcome::Applied);
        assert_eq!(
            service.requests(),
            vec![ConversionRequest {
                source_timezone: "America/New_York".into(),
                target_timezone: "Asia/Kolkata".into(),
                time: "2025-03-08T05:08".into(),
            }]
        );
        assert_eq!(
            view.snapshot().await.conversion_result,
            Some(ConversionResult {
                target_time: "2025-03-08T15:38:00+05:30 for 2025-03-08T05:08".into(),
                ..kolkata_result()
            })
        );
    }

    #[tokio::test]
    async fn test_failed_conversion_keeps_prior_result() {
        let service = ScriptedService::new(Some(kolkata_result()));
        let view = view_at("2025-03-08T05:08");
        let requester = requester(&service, &view);

        requester.convert().await;
        let prior = view.snapshot().await.conversion_result;
        assert!(prior.is_some());

        *service.answer.lock().unwrap() = None;
        view.set_target_timezone("Mars/Olympus_Mons").await;
        let outcome = requester.convert().await;

        assert_eq!(outcome, Outcome::Failed);
        assert_eq!(view.snapshot().await.conversion_result, prior);
        assert_eq!(service.requests().len(), 2);
        assert_eq!(service.requests()[1].target_timezone, "Mars/Olympus_Mons");
    }

    #[tokio::test]
    async fn test_failed_first_conversion_leaves_none() {
        let service = ScriptedService::new(None);
        let view = view_at("2025-03-08T05:08");

        assert_eq!(requester(&service, &view).convert().await, Outcome::Failed);
        assert!(view.snapshot().await.conversion_result.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_submitted_wins_when_responses_reorder() {
        let service = ScriptedService::new(Some(kolkata_result()));
        // First request answers slowly, second quickly
        *service.delays.lock().unwrap() =
            vec![Duration::from_millis(500), Duration::from_millis(10)];
        let view = view_at("2025-03-08T05:08");
        let requester = requester(&service, &view);

        let first = requester.submit();
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
        assert_eq!(service.requests().len(), 1);
        view.set_time_to_convert("2025-03-08T06:00").await.unwrap();
        let second = requester.submit();

        let second_outcome = second.await.unwrap();
        let first_outcome = first.await.unwrap();

        assert_eq!(second_outcome, Outcome::Applied);
        assert_eq!(first_outcome, Outcome::Stale);
        let result = view.snapshot().await.conversion_result.unwrap();
        assert!(result.target_time.ends_with("for 2025-03-08T06:00"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_older_conversion_discarded_after_newer_fails() {
        let service = ScriptedService::new(Some(kolkata_result()));
        *service.delays.lock().unwrap() =
            vec![Duration::from_millis(500), Duration::from_millis(10)];
        let view = view_at("2025-03-08T05:08");
        let requester = requester(&service, &view);

        let older = requester.submit();
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
        assert_eq!(service.requests().len(), 1);

        // The service answers the second request with a rejection
        view.set_target_timezone("Bad/Zone").await;
        let newer = requester.submit();
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
        assert_eq!(service.requests().len(), 2);

        assert_eq!(newer.await.unwrap(), Outcome::Failed);
        assert_eq!(older.await.unwrap(), Outcome::Stale);
        assert!(view.snapshot().await.conversion_result.is_none());
    }
}
