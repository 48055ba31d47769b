mod bridge;
mod commands;
mod render;

use crate::bridge::{run_view_bridge, Screen};
use crate::commands::{execute, Command};
use std::fs::File;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tzview_core::{
    ClientState, ConversionRequester, PollKind, Poller, TimeZoneService, TzviewConfig, ViewModel,
};
use tzview_http::HttpTimeZoneService;

/// How long shutdown waits for detached work (such as the stdin reader)
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

fn main() {
    // Check config for logging.enabled before full config load
    let file_logging_enabled = check_file_logging_enabled();
    init_tracing(file_logging_enabled);

    // Load config or create template on first run
    let config = match TzviewConfig::load_or_create() {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    let service: Arc<dyn TimeZoneService> = match HttpTimeZoneService::from_config(&config.service)
    {
        Ok(service) => Arc::new(service),
        Err(e) => {
            error!("Failed to create time service client: {e}");
            std::process::exit(1);
        }
    };
    info!("Using time service at {}", config.service.base_url);

    // Create tokio runtime for background tasks
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {e}");
            std::process::exit(1);
        }
    };

    // The view's lifetime: cancelled on quit or Ctrl+C
    let cancel_token = CancellationToken::new();

    let ctrlc_token = cancel_token.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received Ctrl+C, shutting down gracefully...");
        ctrlc_token.cancel();
    }) {
        error!("Failed to set Ctrl+C handler: {}", e);
    }

    let view = ViewModel::new(
        ClientState::from_defaults(&config.defaults),
        Some(cancel_token),
    );

    runtime.block_on(run_view(&config, service, view));

    // Stdin is read on a blocking thread that cannot be interrupted
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    info!("Goodbye");
}

/// Mount the view, run it until quit, then tear it down.
async fn run_view(config: &TzviewConfig, service: Arc<dyn TimeZoneService>, view: Arc<ViewModel>) {
    let list_poller = Arc::new(Poller::new(
        PollKind::TimeZoneList,
        Arc::clone(&service),
        Arc::clone(&view),
        config.polling.timezones_interval(),
    ));
    let time_poller = Arc::new(Poller::new(
        PollKind::CurrentTime,
        Arc::clone(&service),
        Arc::clone(&view),
        config.polling.current_time_interval(),
    ));
    let pollers = [list_poller.start(), time_poller.start()];

    let screen = Screen::new(Arc::clone(&view));
    let bridge = tokio::spawn(run_view_bridge(Arc::clone(&screen)));

    let requester = ConversionRequester::new(service, Arc::clone(&view));
    read_commands(&screen, &requester).await;

    // Stop timers; in-flight requests are left to finish and be discarded
    view.teardown();
    for handle in pollers {
        if let Err(e) = handle.await {
            warn!("Poller task failed: {e}");
        }
    }
    if let Err(e) = bridge.await {
        warn!("View bridge task failed: {e}");
    }
}

/// Feed stdin lines to the view until quit, EOF or teardown.
async fn read_commands(screen: &Screen, requester: &ConversionRequester) {
    let cancel_token = screen.view().cancel_token();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            () = cancel_token.cancelled() => return,
            line = lines.next_line() => line,
        };

        match line {
            Ok(Some(line)) => match line.parse::<Command>() {
                Ok(command) => {
                    if execute(command, screen, requester).await.is_break() {
                        return;
                    }
                }
                Err(e) => screen.set_notice(e.to_string()).await,
            },
            Ok(None) => {
                // No more input: keep showing the view until Ctrl+C
                info!("Input closed, press Ctrl+C to exit");
                break;
            }
            Err(e) => {
                warn!("Failed to read input: {e}");
                break;
            }
        }
    }

    cancel_token.cancelled().await;
}

/// Check if file logging is enabled by reading the config file.
/// This is done before full config loading to set up tracing first.
/// Returns `false` if config doesn't exist or can't be parsed.
fn check_file_logging_enabled() -> bool {
    // Minimal structs to parse just the logging.enabled field
    #[derive(serde::Deserialize)]
    struct PartialConfig {
        #[serde(default)]
        logging: PartialLoggingConfig,
    }
    #[derive(serde::Deserialize, Default)]
    struct PartialLoggingConfig {
        #[serde(default)]
        enabled: bool,
    }

    let Ok(content) = std::fs::read_to_string(TzviewConfig::config_path()) else {
        return false;
    };

    toml::from_str::<PartialConfig>(&content)
        .map(|c| c.logging.enabled)
        .unwrap_or(false)
}

/// Initialize tracing with console output and optional file logging.
///
/// Console logs go to stderr so they do not interleave with the view on stdout.
fn init_tracing(file_logging_enabled: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper_util=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    if file_logging_enabled {
        let log_path = tzview_core::log_file_path();

        // Create cache directory if needed
        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        match File::create(&log_path) {
            Ok(file) => {
                let file_layer = tracing_subscriber::fmt::layer()
                    .with_writer(Arc::new(file))
                    .with_ansi(false);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt_layer)
                    .with(file_layer)
                    .init();

                return;
            }
            Err(e) => {
                eprintln!("Failed to create log file at {}: {e}", log_path.display());
            }
        }
    }

    // Fallback: console only
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
