use crate::config::DefaultsConfig;
use crate::error::{CoreError, Result};
use crate::filter::filter_time_zones;
use crate::model::{ConversionRequest, ConversionResult, CurrentTime, TimeZoneEntry};
use crate::time::{datetime_input_now, parse_datetime_input};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::debug;

const LOG_TARGET: &str = "tzview::state";

/// Shown in place of the current time until the first poll succeeds
pub const CURRENT_TIME_PLACEHOLDER: &str = "current time loading...";

/// Everything the view renders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientState {
    pub available_time_zones: Vec<TimeZoneEntry>,
    pub selected_time_zone: String,
    pub current_time: String,
    pub search_query: String,
    pub source_timezone: String,
    pub target_timezone: String,
    /// Local date/time input value, `YYYY-MM-DDTHH:MM`
    pub time_to_convert: String,
    pub conversion_result: Option<ConversionResult>,
}

impl ClientState {
    /// Initial state with placeholder values and the given time input.
    #[must_use]
    pub fn new(defaults: &DefaultsConfig, time_to_convert: impl Into<String>) -> Self {
        Self {
            available_time_zones: Vec::new(),
            selected_time_zone: defaults.selected_timezone.clone(),
            current_time: CURRENT_TIME_PLACEHOLDER.to_string(),
            search_query: String::new(),
            source_timezone: defaults.source_timezone.clone(),
            target_timezone: defaults.target_timezone.clone(),
            time_to_convert: time_to_convert.into(),
            conversion_result: None,
        }
    }

    /// Initial state with the time input set to the current local minute.
    #[must_use]
    pub fn from_defaults(defaults: &DefaultsConfig) -> Self {
        Self::new(defaults, datetime_input_now())
    }

    /// Entries matching the current search query
    #[must_use]
    pub fn filtered_time_zones(&self) -> Vec<&TimeZoneEntry> {
        filter_time_zones(&self.available_time_zones, &self.search_query)
    }

    /// Payload for a conversion of the current form values
    #[must_use]
    pub fn conversion_request(&self) -> ConversionRequest {
        ConversionRequest {
            source_timezone: self.source_timezone.clone(),
            target_timezone: self.target_timezone.clone(),
            time: self.time_to_convert.clone(),
        }
    }
}

impl Default for ClientState {
    fn default() -> Self {
        Self::from_defaults(&DefaultsConfig::default())
    }
}

/// Independent streams of responses that update the state.
///
/// Each slot sequences its own requests; slots never order against each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    TimeZones,
    CurrentTime,
    Conversion,
}

impl Slot {
    const COUNT: usize = 3;

    const fn index(self) -> usize {
        match self {
            Self::TimeZones => 0,
            Self::CurrentTime => 1,
            Self::Conversion => 2,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TimeZones => "timezones",
            Self::CurrentTime => "current_time",
            Self::Conversion => "conversion",
        }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Issue order of a request within its slot.
///
/// A response is applied only if its ticket is newer than the last one
/// settled (applied or failed) for the same slot, so a slow response can
/// never overwrite the outcome of a request issued after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    slot: Slot,
    seq: u64,
}

impl Ticket {
    #[must_use]
    pub const fn slot(&self) -> Slot {
        self.slot
    }

    #[must_use]
    pub const fn seq(&self) -> u64 {
        self.seq
    }
}

/// What happened to a response handed to the view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The state now reflects the response
    Applied,
    /// A newer response for the same slot was already applied
    Stale,
    /// The view was torn down before the response arrived
    TornDown,
    /// The request failed; nothing changed
    Failed,
}

/// Events emitted whenever the view state changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    /// The time zone list was replaced
    TimeZonesUpdated { count: usize },
    /// Current time and selected zone were replaced together
    CurrentTimeUpdated {
        current_time: String,
        timezone: String,
    },
    /// The search query changed
    SearchChanged { query: String },
    /// Source zone, target zone or time input changed
    FormChanged,
    /// A conversion result replaced the previous one
    ConversionCompleted { result: ConversionResult },
}

struct ViewModelInner {
    state: ClientState,
    applied: [u64; Slot::COUNT],
}

/// The view's single owned state object.
///
/// Created when the view mounts and torn down when it unmounts. Pollers and
/// the conversion requester hold it by `Arc` and write through the `apply_*`
/// methods; the renderer subscribes to [`ViewEvent`]s.
pub struct ViewModel {
    inner: RwLock<ViewModelInner>,
    issued: [AtomicU64; Slot::COUNT],
    event_tx: broadcast::Sender<ViewEvent>,
    cancel_token: CancellationToken,
}

impl ViewModel {
    /// Create a new view model
    ///
    /// # Arguments
    /// * `initial` - State shown before any response arrives
    /// * `cancel_token` - Optional external token scoping the view's lifetime
    #[must_use]
    pub fn new(initial: ClientState, cancel_token: Option<CancellationToken>) -> Arc<Self> {
        let (event_tx, _) = broadcast::channel(64);

        Arc::new(Self {
            inner: RwLock::new(ViewModelInner {
                state: initial,
                applied: [0; Slot::COUNT],
            }),
            issued: [AtomicU64::new(0), AtomicU64::new(0), AtomicU64::new(0)],
            event_tx,
            cancel_token: cancel_token.unwrap_or_default(),
        })
    }

    /// Subscribe to view events
    pub fn subscribe(&self) -> broadcast::Receiver<ViewEvent> {
        self.event_tx.subscribe()
    }

    /// Token cancelled when the view is torn down
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Tear the view down: stops pollers and discards late responses.
    pub fn teardown(&self) {
        self.cancel_token.cancel();
    }

    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Take the next ticket for a request about to be sent.
    pub fn issue_ticket(&self, slot: Slot) -> Ticket {
        let seq = self.issued[slot.index()].fetch_add(1, Ordering::Relaxed) + 1;
        Ticket { slot, seq }
    }

    /// Copy of the current state
    pub async fn snapshot(&self) -> ClientState {
        self.inner.read().await.state.clone()
    }

    /// Payload for a conversion of the current form values
    pub async fn conversion_request(&self) -> ConversionRequest {
        self.inner.read().await.state.conversion_request()
    }

    /// Replace the time zone list wholesale.
    pub async fn apply_time_zones(&self, ticket: Ticket, entries: Vec<TimeZoneEntry>) -> Outcome {
        let mut inner = self.inner.write().await;
        let outcome = self.admit(&mut inner, ticket, Slot::TimeZones);
        if outcome == Outcome::Applied {
            let count = entries.len();
            inner.state.available_time_zones = entries;
            let _ = self.event_tx.send(ViewEvent::TimeZonesUpdated { count });
        }
        outcome
    }

    /// Replace current time and selected zone as a pair.
    pub async fn apply_current_time(&self, ticket: Ticket, current: CurrentTime) -> Outcome {
        let mut inner = self.inner.write().await;
        let outcome = self.admit(&mut inner, ticket, Slot::CurrentTime);
        if outcome == Outcome::Applied {
            inner.state.current_time.clone_from(&current.current_time);
            inner.state.selected_time_zone.clone_from(&current.timezone);
            let _ = self.event_tx.send(ViewEvent::CurrentTimeUpdated {
                current_time: current.current_time,
                timezone: current.timezone,
            });
        }
        outcome
    }

    /// Replace the conversion result wholesale.
    pub async fn apply_conversion(&self, ticket: Ticket, result: ConversionResult) -> Outcome {
        let mut inner = self.inner.write().await;
        let outcome = self.admit(&mut inner, ticket, Slot::Conversion);
        if outcome == Outcome::Applied {
            inner.state.conversion_result = Some(result.clone());
            let _ = self.event_tx.send(ViewEvent::ConversionCompleted { result });
        }
        outcome
    }

    /// Settle a failed request.
    ///
    /// Nothing in the state changes, but older requests of the same slot
    /// still in flight become stale, so the slot never falls back to an
    /// answer issued before the failed one.
    pub async fn record_failure(&self, ticket: Ticket) -> Outcome {
        let mut inner = self.inner.write().await;
        let last = &mut inner.applied[ticket.slot.index()];
        if ticket.seq > *last {
            *last = ticket.seq;
        }
        Outcome::Failed
    }

    /// Set the search text
    pub async fn set_search_query(&self, query: impl Into<String>) {
        let query = query.into();
        self.inner.write().await.state.search_query.clone_from(&query);
        let _ = self.event_tx.send(ViewEvent::SearchChanged { query });
    }

    /// Set the conversion source zone
    pub async fn set_source_timezone(&self, timezone: impl Into<String>) {
        self.inner.write().await.state.source_timezone = timezone.into();
        let _ = self.event_tx.send(ViewEvent::FormChanged);
    }

    /// Set the conversion target zone
    pub async fn set_target_timezone(&self, timezone: impl Into<String>) {
        self.inner.write().await.state.target_timezone = timezone.into();
        let _ = self.event_tx.send(ViewEvent::FormChanged);
    }

    /// Set the date/time input.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidDateTime`] and keeps the previous value if
    /// `value` is not a `YYYY-MM-DDTHH:MM` local date/time.
    pub async fn set_time_to_convert(&self, value: &str) -> Result<()> {
        let value = value.trim();
        if parse_datetime_input(value).is_none() {
            return Err(CoreError::InvalidDateTime {
                value: value.to_string(),
            });
        }
        self.inner.write().await.state.time_to_convert = value.to_string();
        let _ = self.event_tx.send(ViewEvent::FormChanged);
        Ok(())
    }

    fn admit(&self, inner: &mut ViewModelInner, ticket: Ticket, slot: Slot) -> Outcome {
        debug_assert_eq!(ticket.slot, slot);

        if self.is_torn_down() {
            debug!(target: LOG_TARGET, "Discarding {} response #{} after teardown", slot, ticket.seq);
            return Outcome::TornDown;
        }

        let last = &mut inner.applied[slot.index()];
        if ticket.seq <= *last {
            debug!(
                target: LOG_TARGET,
                "Discarding stale {} response #{} (already applied #{})", slot, ticket.seq, *last
            );
            return Outcome::Stale;
        }

        *last = ticket.seq;
        Outcome::Applied
    }
}
