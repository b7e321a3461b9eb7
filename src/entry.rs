use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One normalized item taken from an Atom or RSS feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Title of the feed the item came from
    pub feed_name: String,
    /// Home link of the feed the item came from
    pub feed_url: String,
    pub title: String,
    pub url: String,
    /// Publication time, `None` when the feed's date was missing or unparseable
    pub when: Option<DateTime<Utc>>,
}

/// The aggregated entry set as handed out by the cache actor.
pub type Snapshot = Arc<Vec<Entry>>;
