//! HTTP front-end for the covstat engine.
//!
//! Exposes an axum [`Router`] over any [`Engine`]:
//!
//! | Method | Path         | Body / notes                                   |
//! |--------|--------------|------------------------------------------------|
//! | `POST` | `/answer`    | `{"text": "...", "request_id"?: "..."}`        |
//! | `POST` | `/query`     | `{"insight", "scope", "horizon", "request_id"?}` |
//! | `GET`  | `/countries` | known country names                            |
//! | `GET`  | `/fetch-log` | dates the history was refreshed on             |

pub mod answer;
pub mod chart;
pub mod error;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{
  Json, Router,
  extract::State,
  routing::{get, post},
};
use chrono::NaiveDate;
use covstat_core::store::HistoryStore;
use covstat_engine::{Backend, Engine, FetchTarget, FreshnessConfig};
use covstat_sources::{EcdcSource, WorldometerSource, ecdc, worldometer};
use covstat_store_sqlite::SqliteStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use chart::SvgChartRenderer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `COVSTAT_*` environment variables. Every field has a default.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:               String,
  #[serde(default = "default_port")]
  pub port:               u16,
  #[serde(default = "default_store_path")]
  pub store_path:         PathBuf,
  #[serde(default = "default_chart_dir")]
  pub chart_dir:          PathBuf,
  #[serde(default = "default_historical_url")]
  pub historical_url:     String,
  #[serde(default = "default_live_url")]
  pub live_url:           String,
  #[serde(default = "default_fetch_timeout_secs")]
  pub fetch_timeout_secs: u64,
  #[serde(default = "default_retry_base_secs")]
  pub retry_base_secs:    u64,
  #[serde(default = "default_retry_max_secs")]
  pub retry_max_secs:     u64,
  #[serde(default)]
  pub fetch_target:       FetchTarget,
}

fn default_host() -> String { "127.0.0.1".to_owned() }
fn default_port() -> u16 { 8080 }
fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/covstat/history.db") }
fn default_chart_dir() -> PathBuf { PathBuf::from("charts") }
fn default_historical_url() -> String { ecdc::DEFAULT_URL.to_owned() }
fn default_live_url() -> String { worldometer::DEFAULT_URL.to_owned() }
fn default_fetch_timeout_secs() -> u64 { 30 }
fn default_retry_base_secs() -> u64 { 60 }
fn default_retry_max_secs() -> u64 { 3600 }

impl ServerConfig {
  pub fn fetch_timeout(&self) -> Duration { Duration::from_secs(self.fetch_timeout_secs) }

  pub fn freshness(&self) -> FreshnessConfig {
    FreshnessConfig {
      fetch_timeout: self.fetch_timeout(),
      retry_base:    Duration::from_secs(self.retry_base_secs),
      retry_max:     Duration::from_secs(self.retry_max_secs),
      target:        self.fetch_target,
    }
  }
}

// ─── Backend ──────────────────────────────────────────────────────────────────

/// The production collaborators: SQLite cache, ECDC history, Worldometer
/// live table, SVG charts on disk.
pub struct LiveBackend;

impl Backend for LiveBackend {
  type Store = SqliteStore;
  type Historical = EcdcSource;
  type Live = WorldometerSource;
  type Renderer = SvgChartRenderer;
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<B: Backend> {
  pub engine: Arc<Engine<B>>,
}

impl<B: Backend> Clone for AppState<B> {
  fn clone(&self) -> Self { Self { engine: self.engine.clone() } }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router, with request tracing.
pub fn router<B: Backend>(state: AppState<B>) -> Router {
  Router::new()
    .route("/answer", post(answer::text::<B>))
    .route("/query", post(answer::structured::<B>))
    .route("/countries", get(countries::<B>))
    .route("/fetch-log", get(fetch_log::<B>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

/// `GET /countries`
async fn countries<B: Backend>(State(state): State<AppState<B>>) -> Json<Vec<String>> {
  let reference = state.engine.freshness().reference();
  Json(reference.countries().map(str::to_owned).collect())
}

/// `GET /fetch-log`
async fn fetch_log<B: Backend>(
  State(state): State<AppState<B>>,
) -> Result<Json<Vec<NaiveDate>>, ApiError> {
  let dates = state
    .engine
    .freshness()
    .store()
    .fetch_log()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(dates))
}

#[cfg(test)]
mod tests;
