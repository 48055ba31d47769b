//! Text rendering of the view state.

use std::fmt::Write;
use tzview_core::{ClientState, FilteredList};

/// Shown instead of the list when the search matches nothing
pub const NO_RESULTS: &str = "No time zones found";

const TITLE: &str = "Timezone App";

/// Render the whole view.
#[must_use]
pub fn render(state: &ClientState, notice: Option<&str>) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{TITLE}\n");
    let _ = writeln!(out, "Your current time and timezone are:");
    let _ = writeln!(out, "  {}", state.current_time);
    let _ = writeln!(out, "  {}\n", state.selected_time_zone);

    let _ = writeln!(out, "Search: {}", state.search_query);
    let _ = writeln!(out, "Available Time Zones");
    render_list(&mut out, state);

    let _ = writeln!(out, "\nConvert Time");
    let _ = writeln!(out, "  Source timezone: {}", state.source_timezone);
    let _ = writeln!(out, "  Target timezone: {}", state.target_timezone);
    let _ = writeln!(out, "  Time (ISO format): {}", state.time_to_convert);
    if !state.available_time_zones.is_empty() {
        let options: Vec<_> = state
            .available_time_zones
            .iter()
            .map(|entry| entry.timezone.as_str())
            .collect();
        let _ = writeln!(out, "  Zones: {}", options.join(", "));
    }

    if let Some(result) = &state.conversion_result {
        let _ = writeln!(out, "\nConversion Result:");
        let _ = writeln!(
            out,
            "  Source: {} ({})",
            result.source_time, result.source_timezone
        );
        let _ = writeln!(
            out,
            "  Target: {} ({})",
            result.target_time, result.target_timezone
        );
    }

    if let Some(notice) = notice {
        let _ = writeln!(out, "\n{notice}");
    }

    out
}

fn render_list(out: &mut String, state: &ClientState) {
    match FilteredList::new(&state.available_time_zones, &state.search_query) {
        FilteredList::Entries(entries) => {
            for entry in entries {
                let _ = writeln!(out, "  {} - {}", entry.timezone, entry.current_time);
            }
        }
        FilteredList::NoResults => {
            let _ = writeln!(out, "  {NO_RESULTS}");
        }
    }
}
