use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::entry::Entry;

/// Entries dated strictly after `cutoff`, newest first.
///
/// Without a cutoff every entry is selected; undated entries sort last.
/// The sort is stable, so equal timestamps keep their snapshot order.
pub fn select(snapshot: &[Entry], cutoff: Option<DateTime<Utc>>) -> Vec<Entry> {
    let mut selected: Vec<Entry> = snapshot
        .iter()
        .filter(|entry| match cutoff {
            Some(cutoff) => entry.when.is_some_and(|when| when > cutoff),
            None => true,
        })
        .cloned()
        .collect();

    selected.sort_by(|a, b| b.when.cmp(&a.when));
    selected
}

/// Rolling cutoff `window` before `now`. A window too large to represent
/// means no cutoff.
pub fn recent_cutoff(now: DateTime<Utc>, window: Duration) -> Option<DateTime<Utc>> {
    chrono::Duration::from_std(window)
        .ok()
        .and_then(|window| now.checked_sub_signed(window))
}
