//! webrss - A minimal web feed aggregator
//!
//! Polls a list of Atom and RSS feeds on a schedule, keeps the merged entries
//! in a cache actor backed by a JSON snapshot file, and serves the newest
//! entries as a single HTML page.

pub mod cache;
pub mod config;
pub mod entry;
pub mod fetcher;
pub mod parser;
pub mod query;
pub mod routes;
pub mod store;
