//! [`Engine::answer`]: text in, [`QueryOutcome`] out.
//!
//! The pipeline for one request is
//! `parse → support check → ensure_fresh → validate → resolve → render`.
//! Every failure along the way becomes a discriminated outcome; nothing here
//! panics or aborts the host.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use covstat_core::{
  outcome::{QueryOutcome, RejectReason},
  query::{Query, Scope, ValidationError},
  record::SeriesPoint,
  source::{Chart, ChartRenderer, HistoricalSource, LiveSource},
  store::HistoryStore,
};
use covstat_query::{parse, validate};
use tracing::{debug, info, warn};

use crate::{
  error::ResolveError,
  freshness::{FreshnessConfig, FreshnessTracker},
  resolver::{Resolution, Resolver, ScalarResult},
};

/// The collaborator types an engine is built from.
pub trait Backend: Send + Sync + 'static {
  type Store: HistoryStore + 'static;
  type Historical: HistoricalSource + 'static;
  type Live: LiveSource + 'static;
  type Renderer: ChartRenderer + 'static;
}

/// Shared across all concurrent callers behind an `Arc`.
pub struct Engine<B: Backend> {
  freshness: Arc<FreshnessTracker<B::Store, B::Historical>>,
  resolver:  Resolver<B>,
  renderer:  B::Renderer,
}

impl<B: Backend> Engine<B> {
  pub fn new(
    store: B::Store,
    historical: B::Historical,
    live: B::Live,
    renderer: B::Renderer,
    config: FreshnessConfig,
  ) -> Self {
    let freshness = Arc::new(FreshnessTracker::new(store, historical, config));
    let resolver = Resolver::new(freshness.clone(), live);
    Self { freshness, resolver, renderer }
  }

  pub fn freshness(&self) -> &FreshnessTracker<B::Store, B::Historical> { &self.freshness }

  /// Answer `raw_text` as of the current UTC date.
  pub async fn answer(&self, raw_text: &str, request_id: &str) -> QueryOutcome {
    self.answer_on(raw_text, request_id, Utc::now().date_naive()).await
  }

  pub async fn answer_on(&self, raw_text: &str, request_id: &str, today: NaiveDate) -> QueryOutcome {
    match parse(raw_text) {
      Ok(query) => self.answer_query_on(&query, request_id, today).await,
      Err(e) => {
        debug!(request_id, text = raw_text, error = %e, "rejected unparseable query");
        QueryOutcome::rejected(RejectReason::Parse(e))
      }
    }
  }

  /// Answer an already structured query, e.g. one built with
  /// [`Query::from_fields`].
  pub async fn answer_query(&self, query: &Query, request_id: &str) -> QueryOutcome {
    self.answer_query_on(query, request_id, Utc::now().date_naive()).await
  }

  pub async fn answer_query_on(
    &self,
    query: &Query,
    request_id: &str,
    today: NaiveDate,
  ) -> QueryOutcome {
    if let Err(e) = Resolver::<B>::check_supported(query) {
      return self.resolve_failed(query, request_id, e);
    }

    let fresh = self.freshness.ensure_fresh(today).await;

    // Snapshot once; a refresh mid-request must not change the answer.
    let reference = self.freshness.reference();
    if let Err(e) = validate(query, &reference) {
      return match (e, fresh) {
        // Nothing was ever loaded, so "unknown country" would be a guess.
        (ValidationError::UnknownScope(_), Err(unavailable)) if reference.is_empty() => {
          warn!(request_id, error = %unavailable, "no reference data to validate against");
          QueryOutcome::unavailable(unavailable)
        }
        (e, _) => {
          debug!(request_id, scope = %query.scope, error = %e, "rejected invalid query");
          QueryOutcome::rejected(RejectReason::Validation(e))
        }
      };
    }

    match self.resolver.resolve_after(query, fresh).await {
      Ok(Resolution::Scalar(ScalarResult::Found(value))) => {
        info!(request_id, insight = %query.insight, scope = %query.scope, value, "answered");
        QueryOutcome::Scalar { value, insight: query.insight, scope: query.scope.clone() }
      }
      Ok(Resolution::Scalar(ScalarResult::NotFound)) => QueryOutcome::NotFound {
        insight: query.insight,
        scope:   query.scope.clone(),
      },
      Ok(Resolution::Series(points)) => self.render(query, request_id, points).await,
      Err(e) => self.resolve_failed(query, request_id, e),
    }
  }

  async fn render(&self, query: &Query, request_id: &str, points: Vec<SeriesPoint>) -> QueryOutcome {
    let chart = Chart {
      title: format!("{} {}", query.insight.phrase(), scope_title(&query.scope)),
      insight: query.insight,
      scope: query.scope.clone(),
      points,
    };
    match self.renderer.render_time_series(&chart, request_id).await {
      Ok(artifact_ref) => {
        info!(request_id, insight = %query.insight, scope = %query.scope, %artifact_ref, "rendered series");
        QueryOutcome::Series {
          artifact_ref,
          insight: query.insight,
          scope: query.scope.clone(),
          points: chart.points.len(),
        }
      }
      Err(e) => {
        warn!(request_id, error = %e, "chart rendering failed");
        QueryOutcome::unavailable(e)
      }
    }
  }

  fn resolve_failed(&self, query: &Query, request_id: &str, e: ResolveError) -> QueryOutcome {
    match e {
      ResolveError::UnsupportedCombination { insight, horizon } => {
        debug!(request_id, %insight, %horizon, "rejected unsupported combination");
        QueryOutcome::rejected(RejectReason::UnsupportedCombination { insight, horizon })
      }
      ResolveError::Unavailable(e) => {
        warn!(request_id, scope = %query.scope, error = %e, "data unavailable");
        QueryOutcome::unavailable(e)
      }
    }
  }
}

fn scope_title(scope: &Scope) -> String {
  match scope {
    Scope::Worldwide => "worldwide".to_owned(),
    Scope::Country(name) => format!("in {name}"),
  }
}
