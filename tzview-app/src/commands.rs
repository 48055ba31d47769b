//! Line commands standing in for the view's inputs and buttons.

use crate::bridge::Screen;
use std::ops::ControlFlow;
use std::str::FromStr;
use thiserror::Error;
use tracing::info;
use tzview_core::ConversionRequester;

pub const HELP: &str = "commands: search <text> | source <zone> | target <zone> | \
time <YYYY-MM-DDTHH:MM> | convert | show | help | quit";

/// One user action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Replace the search text; empty clears it
    Search(String),
    /// Pick the conversion source zone
    Source(String),
    /// Pick the conversion target zone
    Target(String),
    /// Set the date/time input
    Time(String),
    /// Submit the conversion form
    Convert,
    /// Redraw the view
    Show,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command {0:?} (try `help`)")]
    Unknown(String),

    #[error("usage: {0}")]
    MissingArgument(&'static str),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (name, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(name, rest)| (name, rest.trim()));

        let required = |usage: &'static str| {
            if rest.is_empty() {
                Err(CommandError::MissingArgument(usage))
            } else {
                Ok(rest.to_string())
            }
        };

        match name.to_ascii_lowercase().as_str() {
            "search" | "/" => Ok(Self::Search(rest.to_string())),
            "source" | "from" => required("source <zone>").map(Self::Source),
            "target" | "to" => required("target <zone>").map(Self::Target),
            "time" => required("time <YYYY-MM-DDTHH:MM>").map(Self::Time),
            "convert" => Ok(Self::Convert),
            "" | "show" => Ok(Self::Show),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" | "q" => Ok(Self::Quit),
            _ => Err(CommandError::Unknown(name.to_string())),
        }
    }
}

/// Apply a command to the view.
///
/// Returns `Break` when the user asked to leave.
pub async fn execute(
    command: Command,
    screen: &Screen,
    requester: &ConversionRequester,
) -> ControlFlow<()> {
    let view = screen.view();

    match command {
        Command::Search(query) => {
            screen.clear_notice().await;
            view.set_search_query(query).await;
        }
        Command::Source(zone) => {
            screen.clear_notice().await;
            view.set_source_timezone(zone).await;
        }
        Command::Target(zone) => {
            screen.clear_notice().await;
            view.set_target_timezone(zone).await;
        }
        Command::Time(value) => match view.set_time_to_convert(&value).await {
            Ok(()) => screen.clear_notice().await,
            Err(e) => screen.set_notice(e.to_string()).await,
        },
        Command::Convert => {
            screen.clear_notice().await;
            // The result panel updates when the response lands
            drop(requester.submit());
        }
        Command::Show => screen.request_redraw(),
        Command::Help => screen.set_notice(HELP).await,
        Command::Quit => {
            info!("Quit requested");
            return ControlFlow::Break(());
        }
    }

    ControlFlow::Continue(())
}
