//! The freshness tracker: at most one historical refresh per target date.
//!
//! The hot path is an in-memory date comparison. On a miss, callers queue on
//! an async mutex; the first one consults the fetch log and, if needed, runs
//! the fetch. Everyone behind it re-checks after acquiring the lock and finds
//! the cache already fresh.
//!
//! A failed refresh is never logged. It arms an exponential backoff window;
//! queries inside that window get [`DataUnavailable::BackingOff`] without
//! touching the upstream. There is no background retry loop.

use std::{
  sync::{Arc, PoisonError, RwLock},
  time::Duration,
};

use chrono::{Days, NaiveDate};
use covstat_core::{
  reference::ReferenceSet,
  source::HistoricalSource,
  store::HistoryStore,
};
use serde::Deserialize;
use tokio::{
  sync::Mutex,
  time::{Instant, timeout},
};
use tracing::{debug, info, warn};

use crate::error::DataUnavailable;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Which date a refresh vouches for.
///
/// Upstreams that publish the previous day's figures overnight are tracked
/// against `Yesterday`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchTarget {
  #[default]
  Today,
  Yesterday,
}

impl FetchTarget {
  pub fn date_for(self, today: NaiveDate) -> NaiveDate {
    match self {
      Self::Today => today,
      Self::Yesterday => today.checked_sub_days(Days::new(1)).unwrap_or(today),
    }
  }
}

#[derive(Debug, Clone)]
pub struct FreshnessConfig {
  /// Upper bound on one upstream fetch.
  pub fetch_timeout: Duration,
  /// Backoff after the first failure; doubles per consecutive failure.
  pub retry_base:    Duration,
  pub retry_max:     Duration,
  pub target:        FetchTarget,
}

impl Default for FreshnessConfig {
  fn default() -> Self {
    Self {
      fetch_timeout: Duration::from_secs(30),
      retry_base:    Duration::from_secs(60),
      retry_max:     Duration::from_secs(60 * 60),
      target:        FetchTarget::Today,
    }
  }
}

impl FreshnessConfig {
  /// Backoff after `failures` consecutive failures (`failures >= 1`).
  pub fn retry_delay(&self, failures: u32) -> Duration {
    let exp = failures.saturating_sub(1).min(16);
    self.retry_base.saturating_mul(1 << exp).min(self.retry_max)
  }
}

// ─── Tracker ─────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct RefreshState {
  failures:    u32,
  retry_after: Option<Instant>,
}

/// Owns the history cache and the reference set derived from it.
pub struct FreshnessTracker<S, H> {
  store:         S,
  source:        H,
  config:        FreshnessConfig,
  fresh_through: RwLock<Option<NaiveDate>>,
  reference:     RwLock<Arc<ReferenceSet>>,
  refresh:       Mutex<RefreshState>,
}

impl<S, H> FreshnessTracker<S, H>
where
  S: HistoryStore,
  H: HistoricalSource,
{
  pub fn new(store: S, source: H, config: FreshnessConfig) -> Self {
    Self {
      store,
      source,
      config,
      fresh_through: RwLock::new(None),
      reference: RwLock::new(Arc::new(ReferenceSet::default())),
      refresh: Mutex::new(RefreshState::default()),
    }
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn config(&self) -> &FreshnessConfig { &self.config }

  /// The current reference set. Callers keep the returned snapshot for the
  /// whole request; a concurrent refresh swaps in a new one without
  /// disturbing them.
  pub fn reference(&self) -> Arc<ReferenceSet> {
    self
      .reference
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .clone()
  }

  /// Rebuild the reference set from whatever the store already holds.
  pub async fn load(&self) -> Result<(), DataUnavailable> {
    let countries = self.store.countries().await.map_err(DataUnavailable::store)?;
    let reference = ReferenceSet::new(&countries);
    info!(countries = reference.country_count(), "loaded reference set from store");
    self.swap_reference(reference);
    Ok(())
  }

  /// Make sure the cache holds data for the target date derived from
  /// `today`, fetching it at most once.
  pub async fn ensure_fresh(&self, today: NaiveDate) -> Result<(), DataUnavailable> {
    let target = self.config.target.date_for(today);
    if self.is_fresh(target) {
      debug!(%target, "history cache is fresh");
      return Ok(());
    }

    let mut state = self.refresh.lock().await;
    if self.is_fresh(target) {
      debug!(%target, "history refreshed while waiting");
      return Ok(());
    }

    if self.store.has_fetched(target).await.map_err(DataUnavailable::store)? {
      // Logged by an earlier run; the data is already on disk.
      self.load().await?;
      self.mark_fresh(target);
      return Ok(());
    }

    if let Some(at) = state.retry_after {
      let now = Instant::now();
      if now < at {
        return Err(DataUnavailable::BackingOff {
          failures: state.failures,
          retry_in: at - now,
        });
      }
    }

    match self.refresh_from_source(target).await {
      Ok(()) => {
        *state = RefreshState::default();
        Ok(())
      }
      Err(e) => {
        state.failures = state.failures.saturating_add(1);
        let delay = self.config.retry_delay(state.failures);
        state.retry_after = Some(Instant::now() + delay);
        warn!(
          source = self.source.name(),
          failures = state.failures,
          retry_in_secs = delay.as_secs(),
          error = %e,
          "history refresh failed"
        );
        Err(e)
      }
    }
  }

  async fn refresh_from_source(&self, target: NaiveDate) -> Result<(), DataUnavailable> {
    let source_name = self.source.name();
    let fetch_timeout = self.config.fetch_timeout;
    info!(source = source_name, %target, "refreshing history");

    let records = match timeout(fetch_timeout, self.source.fetch_history()).await {
      Ok(Ok(records)) => records,
      Ok(Err(error)) => return Err(DataUnavailable::Fetch { source_name, error }),
      Err(_) => {
        return Err(DataUnavailable::Timeout { source_name, timeout: fetch_timeout });
      }
    };

    let reference = ReferenceSet::from_records(&records);
    let count = records.len();
    self
      .store
      .replace_history(records, target)
      .await
      .map_err(DataUnavailable::store)?;

    info!(
      source = source_name,
      %target,
      records = count,
      countries = reference.country_count(),
      "history refreshed"
    );
    self.swap_reference(reference);
    self.mark_fresh(target);
    Ok(())
  }

  fn is_fresh(&self, target: NaiveDate) -> bool {
    self
      .fresh_through
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .is_some_and(|d| d >= target)
  }

  fn mark_fresh(&self, target: NaiveDate) {
    let mut fresh = self.fresh_through.write().unwrap_or_else(PoisonError::into_inner);
    if fresh.is_none_or(|d| d < target) {
      *fresh = Some(target);
    }
  }

  fn swap_reference(&self, reference: ReferenceSet) {
    *self.reference.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(reference);
  }
}
