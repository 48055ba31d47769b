//! Timer-driven pollers that keep the view in sync with the time service.

use crate::service::TimeZoneService;
use crate::state::{Outcome, Slot, Ticket, ViewModel};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

const LOG_TARGET: &str = "tzview::poller";

/// Which piece of state a poller keeps fresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollKind {
    /// `GET /timezones` into the available zone list
    TimeZoneList,
    /// `GET /current_time` into the current time / selected zone pair
    CurrentTime,
}

impl PollKind {
    #[must_use]
    pub const fn slot(self) -> Slot {
        match self {
            Self::TimeZoneList => Slot::TimeZones,
            Self::CurrentTime => Slot::CurrentTime,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::TimeZoneList => "time zone list",
            Self::CurrentTime => "current time",
        }
    }

    /// Issue one request and hand its result to the view.
    ///
    /// Failures are logged and leave the view unchanged.
    pub async fn poll_once(
        self,
        service: &dyn TimeZoneService,
        view: &ViewModel,
        ticket: Ticket,
    ) -> Outcome {
        let outcome = match self {
            Self::TimeZoneList => match service.list_time_zones().await {
                Ok(entries) => {
                    debug!(
                        target: LOG_TARGET,
                        "Polled {} time zones from {} (#{})",
                        entries.len(),
                        service.name(),
                        ticket.seq()
                    );
                    view.apply_time_zones(ticket, entries).await
                }
                Err(e) => {
                    warn!(
                        target: LOG_TARGET,
                        "Error fetching time zones ({}): {}", e.kind(), e
                    );
                    view.record_failure(ticket).await
                }
            },
            Self::CurrentTime => match service.current_time().await {
                Ok(current) => {
                    debug!(
                        target: LOG_TARGET,
                        "Polled current time {} {} from {} (#{})",
                        current.current_time,
                        current.timezone,
                        service.name(),
                        ticket.seq()
                    );
                    view.apply_current_time(ticket, current).await
                }
                Err(e) => {
                    warn!(
                        target: LOG_TARGET,
                        "Error fetching current time ({}): {}", e.kind(), e
                    );
                    view.record_failure(ticket).await
                }
            },
        };

        if outcome == Outcome::TornDown {
            debug!(target: LOG_TARGET, "View gone, dropped {} response", self.name());
        }
        outcome
    }
}

/// Periodic poller for one piece of view state.
///
/// Fires immediately on start and then once per interval. Every tick sends
/// its request on its own task, so a slow response never delays the next
/// tick; ordering between overlapping responses is settled by the view's
/// tickets.
pub struct Poller {
    kind: PollKind,
    service: Arc<dyn TimeZoneService>,
    view: Arc<ViewModel>,
    interval: Duration,
    cancel_token: CancellationToken,
    in_flight: TaskTracker,
}

impl Poller {
    /// Create a new poller
    ///
    /// # Arguments
    /// * `kind` - What to poll
    /// * `service` - Time service to poll
    /// * `view` - View to update; the poller stops when the view is torn down
    /// * `interval` - Time between two requests
    pub fn new(
        kind: PollKind,
        service: Arc<dyn TimeZoneService>,
        view: Arc<ViewModel>,
        interval: Duration,
    ) -> Self {
        let cancel_token = view.cancel_token();
        Self {
            kind,
            service,
            view,
            interval,
            cancel_token,
            in_flight: TaskTracker::new(),
        }
    }

    /// Tracker of dispatched requests; `wait()` on it after the poller stops
    /// to let in-flight requests finish.
    #[must_use]
    pub fn in_flight(&self) -> TaskTracker {
        self.in_flight.clone()
    }

    /// Start polling in a background task
    #[must_use]
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    /// Run the polling loop until the view is torn down
    pub async fn run(&self) {
        info!(
            target: LOG_TARGET,
            "Starting {} poller (interval: {}ms)",
            self.kind.name(),
            self.interval.as_millis()
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = self.cancel_token.cancelled() => {
                    info!(target: LOG_TARGET, "{} poller shutting down", self.kind.name());
                    break;
                }
                _ = ticker.tick() => {
                    self.dispatch();
                }
            }
        }

        self.in_flight.close();
    }

    fn dispatch(&self) {
        let kind = self.kind;
        let ticket = self.view.issue_ticket(kind.slot());
        let service = Arc::clone(&self.service);
        let view = Arc::clone(&self.view);

        self.in_flight.spawn(async move {
            kind.poll_once(service.as_ref(), &view, ticket).await;
        });
    }
}
