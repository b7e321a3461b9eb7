use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::cache::CacheHandle;
use crate::entry::Entry;
use crate::query::{recent_cutoff, select};

pub struct AppState {
    pub cache: CacheHandle,
    /// How far back `/` reaches
    pub recent_window: Duration,
}

// Template structs
#[derive(Template)]
#[template(path = "listing.html")]
pub struct ListingTemplate {
    pub entries: Vec<EntryView>,
}

/// An entry with its date pre-formatted for the listing.
pub struct EntryView {
    pub title: String,
    pub url: String,
    pub feed_name: String,
    pub feed_url: String,
    /// `YYYY-MM-DD`, empty when undated
    pub date_iso: String,
    /// e.g. `Mon 02/01/2006`, empty when undated
    pub date_label: String,
}

impl From<Entry> for EntryView {
    fn from(entry: Entry) -> Self {
        let (date_iso, date_label) = match entry.when {
            Some(when) => (
                when.format("%Y-%m-%d").to_string(),
                when.format("%a %d/%m/%Y").to_string(),
            ),
            None => (String::new(), String::new()),
        };

        Self {
            title: entry.title,
            url: entry.url,
            feed_name: entry.feed_name,
            feed_url: entry.feed_url,
            date_iso,
            date_label,
        }
    }
}

// Wrapper for HTML responses
struct HtmlTemplate<T>(T);

impl<T: Template> IntoResponse for HtmlTemplate<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render template: {}", err),
            )
                .into_response(),
        }
    }
}

// Custom error type
pub struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, "Request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error: {}", self.0),
        )
            .into_response()
    }
}

impl<E: Into<anyhow::Error>> From<E> for AppError {
    fn from(err: E) -> Self {
        AppError(err.into())
    }
}

pub fn router(state: Arc<AppState>, static_dir: &Path) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/index.html", get(index))
        .route("/all", get(all))
        .route("/health", get(health))
        .nest_service("/style", ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn render_since(
    state: &AppState,
    cutoff: Option<DateTime<Utc>>,
) -> Result<HtmlTemplate<ListingTemplate>, AppError> {
    let snapshot = state.cache.snapshot().await?;
    let entries = select(&snapshot, cutoff)
        .into_iter()
        .map(EntryView::from)
        .collect();

    Ok(HtmlTemplate(ListingTemplate { entries }))
}

// Route handlers
pub async fn index(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let cutoff = recent_cutoff(Utc::now(), state.recent_window);
    render_since(&state, cutoff).await
}

pub async fn all(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    render_since(&state, None).await
}

pub async fn health(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let status = state.cache.status().await?;
    Ok(match status.persist_error {
        Some(error) => format!("DEGRADED: {}", error),
        None => "OK".to_string(),
    })
}
