use crate::render::render;
use std::io::Write;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{broadcast::error::RecvError, Mutex, Notify};
use tracing::{debug, info, warn};
use tzview_core::{ViewEvent, ViewModel};

const LOG_TARGET: &str = "tzview::bridge";

/// Clears the terminal and homes the cursor
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

type Output = Box<dyn Write + Send>;

/// Terminal surface of the view: the view model plus a one-line notice for
/// command feedback.
pub struct Screen {
    view: Arc<ViewModel>,
    notice: Mutex<Option<String>>,
    redraw: Notify,
    output: StdMutex<Output>,
}

impl Screen {
    /// Screen drawing to stdout
    #[must_use]
    pub fn new(view: Arc<ViewModel>) -> Arc<Self> {
        Self::with_output(view, Box::new(std::io::stdout()))
    }

    #[must_use]
    pub fn with_output(view: Arc<ViewModel>, output: Output) -> Arc<Self> {
        Arc::new(Self {
            view,
            notice: Mutex::new(None),
            redraw: Notify::new(),
            output: StdMutex::new(output),
        })
    }

    #[must_use]
    pub fn view(&self) -> &ViewModel {
        &self.view
    }

    /// Show `message` under the view until the next successful command.
    pub async fn set_notice(&self, message: impl Into<String>) {
        *self.notice.lock().await = Some(message.into());
        self.request_redraw();
    }

    pub async fn clear_notice(&self) {
        self.notice.lock().await.take();
    }

    pub fn request_redraw(&self) {
        self.redraw.notify_one();
    }

    pub(crate) async fn frame(&self) -> String {
        let state = self.view.snapshot().await;
        let notice = self.notice.lock().await.clone();
        render(&state, notice.as_deref())
    }

    async fn draw(&self) {
        let frame = self.frame().await;
        let Ok(mut output) = self.output.lock() else {
            warn!(target: LOG_TARGET, "Output lock poisoned, skipping redraw");
            return;
        };
        if let Err(e) = write_frame(output.as_mut(), &frame) {
            warn!(target: LOG_TARGET, "Failed to draw view: {}", e);
        }
    }
}

fn write_frame(out: &mut dyn Write, frame: &str) -> std::io::Result<()> {
    out.write_all(CLEAR_SCREEN.as_bytes())?;
    out.write_all(frame.as_bytes())?;
    out.write_all(b"\n> ")?;
    out.flush()
}

/// Redraw the screen whenever the view changes, until the view is torn down.
pub async fn run_view_bridge(screen: Arc<Screen>) {
    let mut rx = screen.view.subscribe();
    let cancel_token = screen.view.cancel_token();

    screen.draw().await;

    loop {
        tokio::select! {
            () = cancel_token.cancelled() => {
                info!(target: LOG_TARGET, "View torn down, stopping redraws");
                break;
            }
            () = screen.redraw.notified() => {
                screen.draw().await;
            }
            event = rx.recv() => {
                match event {
                    Ok(event) => {
                        log_view_event(&event);
                        screen.draw().await;
                    }
                    Err(RecvError::Closed) => {
                        info!(target: LOG_TARGET, "View event channel closed");
                        break;
                    }
                    Err(RecvError::Lagged(n)) => {
                        debug!(target: LOG_TARGET, "Missed {} view events", n);
                        screen.draw().await;
                    }
                }
            }
        }
    }
}

fn log_view_event(event: &ViewEvent) {
    match event {
        ViewEvent::TimeZonesUpdated { count } => {
            debug!(target: LOG_TARGET, "Time zone list replaced ({} entries)", count);
        }
        ViewEvent::CurrentTimeUpdated {
            current_time,
            timezone,
        } => {
            debug!(target: LOG_TARGET, "Current time {} ({})", current_time, timezone);
        }
        ViewEvent::SearchChanged { query } => {
            debug!(target: LOG_TARGET, "Search changed to {:?}", query);
        }
        ViewEvent::FormChanged => {
            debug!(target: LOG_TARGET, "Conversion form changed");
        }
        ViewEvent::ConversionCompleted { result } => {
            info!(
                target: LOG_TARGET,
                "Conversion result: {} ({}) -> {} ({})",
                result.source_time,
                result.source_timezone,
                result.target_time,
                result.target_timezone
            );
        }
    }
}
