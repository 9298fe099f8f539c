//! Handlers for `/answer` and `/query`.
//!
//! Both always respond `200` with the outcome; callers branch on `success`
//! and `outcome`.

use axum::{Json, extract::State};
use covstat_core::{
  outcome::{QueryOutcome, RejectReason},
  query::Query,
};
use covstat_engine::Backend;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppState;

/// The JSON shape of every answer.
#[derive(Debug, Serialize)]
pub struct AnswerResponse {
  pub success:    bool,
  pub request_id: String,
  /// Human-readable reply, as a chat front-end would send it.
  pub message:    String,
  #[serde(flatten)]
  pub outcome:    QueryOutcome,
}

impl AnswerResponse {
  fn new(request_id: String, outcome: QueryOutcome) -> Self {
    Self {
      success: outcome.is_success(),
      message: outcome.describe(),
      request_id,
      outcome,
    }
  }
}

fn request_id(supplied: Option<String>) -> String {
  supplied
    .filter(|id| !id.trim().is_empty())
    .unwrap_or_else(|| Uuid::new_v4().to_string())
}

// ─── Free text ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TextBody {
  pub text:       String,
  pub request_id: Option<String>,
}

/// `POST /answer` with body `{"text": "total cases italy today"}`
pub async fn text<B: Backend>(
  State(state): State<AppState<B>>,
  Json(body): Json<TextBody>,
) -> Json<AnswerResponse> {
  let id = request_id(body.request_id);
  let outcome = state.engine.answer(&body.text, &id).await;
  Json(AnswerResponse::new(id, outcome))
}

// ─── Structured ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct QueryBody {
  pub insight:    String,
  pub scope:      String,
  pub horizon:    String,
  pub request_id: Option<String>,
}

/// `POST /query` with body
/// `{"insight": "new_deaths", "scope": "Italy", "horizon": "graph"}`
pub async fn structured<B: Backend>(
  State(state): State<AppState<B>>,
  Json(body): Json<QueryBody>,
) -> Json<AnswerResponse> {
  let id = request_id(body.request_id);
  let outcome = match Query::from_fields(&body.insight, &body.scope, &body.horizon) {
    Ok(query) => state.engine.answer_query(&query, &id).await,
    Err(e) => QueryOutcome::rejected(RejectReason::Validation(e)),
  };
  Json(AnswerResponse::new(id, outcome))
}
