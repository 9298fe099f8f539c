//! Resolution of a validated query against the two feeds.
//!
//! Point-in-time queries read the live snapshot; a stale history cache only
//! costs a log line. Time-series queries read the history cache and fall back
//! to whatever is stored when a refresh fails.

use std::{sync::Arc, time::Duration};

use chrono::NaiveDate;
use covstat_core::{
  query::{Horizon, Query, Scope},
  record::SeriesPoint,
  source::LiveSource,
  store::HistoryStore,
};
use covstat_query::aggregate;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::{
  engine::Backend,
  error::{DataUnavailable, ResolveError},
  freshness::FreshnessTracker,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarResult {
  Found(u64),
  /// The scope validated but has no row in the live table.
  NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
  Scalar(ScalarResult),
  /// Ascending by date.
  Series(Vec<SeriesPoint>),
}

pub struct Resolver<B: Backend> {
  freshness:    Arc<FreshnessTracker<B::Store, B::Historical>>,
  live:         B::Live,
  live_timeout: Duration,
}

impl<B: Backend> Resolver<B> {
  pub fn new(freshness: Arc<FreshnessTracker<B::Store, B::Historical>>, live: B::Live) -> Self {
    let live_timeout = freshness.config().fetch_timeout;
    Self { freshness, live, live_timeout }
  }

  /// Reject `(insight, horizon)` pairs no feed can answer. Pure.
  pub fn check_supported(query: &Query) -> Result<(), ResolveError> {
    if query.insight.supports(query.horizon) {
      Ok(())
    } else {
      Err(ResolveError::UnsupportedCombination {
        insight: query.insight,
        horizon: query.horizon,
      })
    }
  }

  /// Bring the cache up to date for `today`, then resolve.
  pub async fn resolve(&self, query: &Query, today: NaiveDate) -> Result<Resolution, ResolveError> {
    Self::check_supported(query)?;
    let fresh = self.freshness.ensure_fresh(today).await;
    self.resolve_after(query, fresh).await
  }

  /// Resolve given the outcome of a freshness check the caller already ran.
  pub async fn resolve_after(
    &self,
    query: &Query,
    fresh: Result<(), DataUnavailable>,
  ) -> Result<Resolution, ResolveError> {
    Self::check_supported(query)?;
    match query.horizon {
      Horizon::PointInTime => {
        if let Err(e) = fresh {
          warn!(error = %e, "history cache is stale; answering from live table");
        }
        self.point_in_time(query).await
      }
      Horizon::TimeSeries => self.time_series(query, fresh).await,
    }
  }

  async fn point_in_time(&self, query: &Query) -> Result<Resolution, ResolveError> {
    let source_name = self.live.name();
    let snapshot = match timeout(self.live_timeout, self.live.fetch_snapshot()).await {
      Ok(Ok(snapshot)) => snapshot,
      Ok(Err(error)) => return Err(DataUnavailable::Fetch { source_name, error }.into()),
      Err(_) => {
        return Err(
          DataUnavailable::Timeout { source_name, timeout: self.live_timeout }.into(),
        );
      }
    };

    if !snapshot.has(query.insight) {
      return Err(DataUnavailable::MissingColumn(query.insight).into());
    }

    let row = match &query.scope {
      Scope::Worldwide => snapshot.aggregate(),
      Scope::Country(name) => snapshot.country(name),
    };
    let result = match row {
      Some(r) => ScalarResult::Found(r.value(query.insight)),
      None => {
        debug!(scope = %query.scope, "scope missing from live table");
        ScalarResult::NotFound
      }
    };
    Ok(Resolution::Scalar(result))
  }

  async fn time_series(
    &self,
    query: &Query,
    fresh: Result<(), DataUnavailable>,
  ) -> Result<Resolution, ResolveError> {
    let filter = match &query.scope {
      Scope::Worldwide => None,
      Scope::Country(name) => Some(name.clone()),
    };
    let records = self
      .freshness
      .store()
      .daily_records(filter)
      .await
      .map_err(DataUnavailable::store)?;

    if let Err(e) = fresh {
      if records.is_empty() {
        return Err(e.into());
      }
      warn!(error = %e, records = records.len(), "serving stale history");
    }

    let points = aggregate::series(&records, &query.scope, query.insight).ok_or(
      ResolveError::UnsupportedCombination {
        insight: query.insight,
        horizon: query.horizon,
      },
    )?;
    Ok(Resolution::Series(points))
  }
}
