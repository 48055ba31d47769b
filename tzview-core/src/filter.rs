//! Client-side search over the polled time zone list.

use crate::model::TimeZoneEntry;

/// Return the entries whose identifier contains `query`, ignoring case.
///
/// Order is preserved. An empty query matches every entry.
#[must_use]
pub fn filter_time_zones<'a>(entries: &'a [TimeZoneEntry], query: &str) -> Vec<&'a TimeZoneEntry> {
    let needle = query.to_lowercase();
    entries
        .iter()
        .filter(|entry| entry.timezone.to_lowercase().contains(&needle))
        .collect()
}

/// Filter result as the view consumes it.
///
/// An empty match set is its own variant so a renderer shows a single
/// "no results" row instead of an empty list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilteredList<'a> {
    Entries(Vec<&'a TimeZoneEntry>),
    NoResults,
}

impl<'a> FilteredList<'a> {
    #[must_use]
    pub fn new(entries: &'a [TimeZoneEntry], query: &str) -> Self {
        let matched = filter_time_zones(entries, query);
        if matched.is_empty() {
            Self::NoResults
        } else {
            Self::Entries(matched)
        }
    }
}
