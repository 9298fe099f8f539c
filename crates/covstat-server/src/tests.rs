//! Router tests through `tower::ServiceExt::oneshot`.

use std::{path::PathBuf, sync::Arc};

use axum::{
  body::Body,
  http::{Request, StatusCode, header},
};
use chrono::NaiveDate;
use covstat_core::{
  SourceError,
  query::Insight,
  record::{AGGREGATE_ROW, DailyRecord, SnapshotRecord, SnapshotTable},
  source::{HistoricalSource, LiveSource},
};
use covstat_engine::{Backend, Engine, FreshnessConfig};
use covstat_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{AppState, chart::SvgChartRenderer, router};

// ─── Fakes ───────────────────────────────────────────────────────────────────

struct StaticHistory;

impl HistoricalSource for StaticHistory {
  fn name(&self) -> &'static str { "static" }

  async fn fetch_history(&self) -> Result<Vec<DailyRecord>, SourceError> {
    let day = |d| NaiveDate::from_ymd_opt(2020, 3, d).unwrap();
    Ok(vec![
      DailyRecord {
        country:      "Italy".into(),
        date:         day(24),
        new_cases:    3,
        new_deaths:   1,
        total_cases:  3,
        total_deaths: 1,
      },
      DailyRecord {
        country:      "Italy".into(),
        date:         day(25),
        new_cases:    4,
        new_deaths:   0,
        total_cases:  7,
        total_deaths: 1,
      },
    ])
  }
}

struct StaticLive;

impl LiveSource for StaticLive {
  fn name(&self) -> &'static str { "static-live" }

  async fn fetch_snapshot(&self) -> Result<SnapshotTable, SourceError> {
    Ok(SnapshotTable {
      records:   vec![
        SnapshotRecord { country: "Italy".into(), total_cases: 400, ..Default::default() },
        SnapshotRecord { country: AGGREGATE_ROW.into(), total_cases: 1000, ..Default::default() },
      ],
      available: Insight::ALL.into_iter().collect(),
    })
  }
}

struct TestBackend;

impl Backend for TestBackend {
  type Store = SqliteStore;
  type Historical = StaticHistory;
  type Live = StaticLive;
  type Renderer = SvgChartRenderer;
}

async fn make_state(chart_dir: PathBuf) -> AppState<TestBackend> {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let engine = Engine::new(
    store,
    StaticHistory,
    StaticLive,
    SvgChartRenderer::new(chart_dir),
    FreshnessConfig::default(),
  );
  AppState { engine: Arc::new(engine) }
}

fn chart_dir() -> PathBuf {
  std::env::temp_dir().join(format!("covstat-server-{}", uuid::Uuid::new_v4()))
}

async fn call(state: AppState<TestBackend>, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  let body = match body {
    Some(v) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(v.to_string())
    }
    None => Body::empty(),
  };
  let resp = router(state).oneshot(builder.body(body).unwrap()).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  (status, serde_json::from_slice(&bytes).unwrap())
}

// ─── /answer ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn answer_scalar() {
  let state = make_state(chart_dir()).await;
  let (status, body) = call(
    state,
    "POST",
    "/answer",
    Some(json!({ "text": "total cases worldwide today", "request_id": "abc" })),
  )
  .await;

  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["success"], true);
  assert_eq!(body["outcome"], "scalar");
  assert_eq!(body["value"], 1000);
  assert_eq!(body["insight"], "total_cases");
  assert_eq!(body["request_id"], "abc");
  assert_eq!(body["message"], "There were 1,000 total cases so far today worldwide");
}

#[tokio::test]
async fn answer_generates_request_id() {
  let state = make_state(chart_dir()).await;
  let (_, body) = call(state, "POST", "/answer", Some(json!({ "text": "new cases italy today" }))).await;
  let id = body["request_id"].as_str().unwrap();
  assert!(uuid::Uuid::parse_str(id).is_ok(), "{id}");
}

#[tokio::test]
async fn answer_rejection_reports_failure() {
  let state = make_state(chart_dir()).await;
  let (status, body) =
    call(state, "POST", "/answer", Some(json!({ "text": "new deaths atlantis today" }))).await;

  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["success"], false);
  assert_eq!(body["outcome"], "rejected");
  assert_eq!(body["reason"]["kind"], "validation");
  assert_eq!(body["reason"]["detail"]["kind"], "unknown_scope");
}

#[tokio::test]
async fn answer_graph_writes_chart() {
  let dir = chart_dir();
  let state = make_state(dir.clone()).await;
  let (_, body) = call(
    state,
    "POST",
    "/answer",
    Some(json!({ "text": "total cases italy graph", "request_id": "g1" })),
  )
  .await;

  assert_eq!(body["outcome"], "series");
  assert_eq!(body["points"], 2);
  let path = body["artifact_ref"].as_str().unwrap();
  assert!(path.ends_with("graph_g1_total_cases.svg"), "{path}");
  assert!(std::path::Path::new(path).exists());

  let _ = std::fs::remove_dir_all(&dir);
}

// ─── /query ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn structured_query() {
  let state = make_state(chart_dir()).await;
  let (_, body) = call(
    state,
    "POST",
    "/query",
    Some(json!({ "insight": "TotalCases", "scope": "italy", "horizon": "today" })),
  )
  .await;
  assert_eq!(body["outcome"], "scalar");
  assert_eq!(body["value"], 400);
  assert_eq!(body["scope"]["name"], "Italy");
}

#[tokio::test]
async fn structured_query_with_unknown_horizon() {
  let state = make_state(chart_dir()).await;
  let (_, body) = call(
    state,
    "POST",
    "/query",
    Some(json!({ "insight": "new_cases", "scope": "italy", "horizon": "tomorrow" })),
  )
  .await;
  assert_eq!(body["success"], false);
  assert_eq!(body["reason"]["detail"]["kind"], "unknown_horizon");
}

// ─── Reference data ──────────────────────────────────────────────────────────

#[tokio::test]
async fn countries_and_fetch_log_follow_refresh() {
  let state = make_state(chart_dir()).await;

  let (_, countries) = call(state.clone(), "GET", "/countries", None).await;
  assert_eq!(countries, json!([]));

  call(state.clone(), "POST", "/answer", Some(json!({ "text": "new cases italy graph" }))).await;

  let (_, countries) = call(state.clone(), "GET", "/countries", None).await;
  assert_eq!(countries, json!(["Italy"]));

  let (status, log) = call(state, "GET", "/fetch-log", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(log.as_array().unwrap().len(), 1);
}
