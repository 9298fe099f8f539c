//! Fake collaborators shared by the engine's test modules.

use std::{
  sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
  },
  time::Duration,
};

use chrono::NaiveDate;
use covstat_core::{
  RenderError, SourceError,
  query::Insight,
  record::{AGGREGATE_ROW, DailyRecord, SnapshotRecord, SnapshotTable},
  source::{Chart, ChartRenderer, HistoricalSource, LiveSource},
};
use covstat_store_sqlite::SqliteStore;

use crate::engine::Backend;

pub fn day(d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2020, 3, d).unwrap() }

pub async fn history_store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn daily(country: &str, d: u32, new_cases: u64, total_cases: u64) -> DailyRecord {
  DailyRecord {
    country: country.into(),
    date: day(d),
    new_cases,
    new_deaths: 0,
    total_cases,
    total_deaths: 0,
  }
}

/// Two countries over two days: China `5, 2` and Italy `3, 0` new cases.
pub fn sample_history() -> Vec<DailyRecord> {
  vec![
    daily("China", 24, 5, 5),
    daily("China", 25, 2, 7),
    daily("Italy", 24, 3, 3),
    daily("Italy", 25, 0, 3),
  ]
}

pub fn sample_snapshot() -> SnapshotTable {
  let row = |country: &str, total_cases: u64| SnapshotRecord {
    country: country.into(),
    total_cases,
    new_cases: 1,
    active_cases: 4,
    ..Default::default()
  };
  SnapshotTable {
    records:   vec![row("China", 600), row("Italy", 400), row(AGGREGATE_ROW, 1000)],
    available: [Insight::TotalCases, Insight::NewCases, Insight::ActiveCases]
      .into_iter()
      .collect(),
  }
}

// ─── Historical ──────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct FakeHistory {
  pub calls: Arc<AtomicUsize>,
  records:   Option<Vec<DailyRecord>>,
  delay:     Duration,
}

impl FakeHistory {
  pub fn new(records: Vec<DailyRecord>) -> Self {
    Self { calls: Arc::default(), records: Some(records), delay: Duration::ZERO }
  }

  pub fn failing() -> Self {
    Self { calls: Arc::default(), records: None, delay: Duration::ZERO }
  }

  pub fn with_delay(mut self, delay: Duration) -> Self {
    self.delay = delay;
    self
  }
}

impl HistoricalSource for FakeHistory {
  fn name(&self) -> &'static str { "fake" }

  async fn fetch_history(&self) -> Result<Vec<DailyRecord>, SourceError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    if !self.delay.is_zero() {
      tokio::time::sleep(self.delay).await;
    }
    self
      .records
      .clone()
      .ok_or_else(|| SourceError::Network("connection refused".into()))
  }
}

// ─── Live ────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct FakeLive {
  pub calls: Arc<AtomicUsize>,
  table:     Option<SnapshotTable>,
}

impl FakeLive {
  pub fn new(table: SnapshotTable) -> Self { Self { calls: Arc::default(), table: Some(table) } }

  pub fn failing() -> Self { Self { calls: Arc::default(), table: None } }
}

impl LiveSource for FakeLive {
  fn name(&self) -> &'static str { "fake-live" }

  async fn fetch_snapshot(&self) -> Result<SnapshotTable, SourceError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    self.table.clone().ok_or(SourceError::Status(503))
  }
}

// ─── Renderer ────────────────────────────────────────────────────────────────

/// Keeps every chart it is asked to draw.
#[derive(Clone, Default)]
pub struct RecordingRenderer {
  pub charts: Arc<Mutex<Vec<Chart>>>,
}

impl ChartRenderer for RecordingRenderer {
  async fn render_time_series<'a>(
    &'a self,
    chart: &'a Chart,
    request_id: &'a str,
  ) -> Result<String, RenderError> {
    if chart.points.is_empty() {
      return Err(RenderError::EmptySeries);
    }
    self.charts.lock().unwrap().push(chart.clone());
    Ok(format!("memory://{request_id}/{}", chart.insight.phrase().replace(' ', "_")))
  }
}

// ─── Backend ─────────────────────────────────────────────────────────────────

pub struct FakeBackend;

impl Backend for FakeBackend {
  type Store = SqliteStore;
  type Historical = FakeHistory;
  type Live = FakeLive;
  type Renderer = RecordingRenderer;
}
