//! Error types for `covstat-engine`.

use std::time::Duration;

use covstat_core::{
  SourceError,
  query::{Horizon, Insight},
};
use thiserror::Error;

/// The cache could not be brought up to date, or the live feed could not be
/// read. Always recoverable: the next query tries again.
#[derive(Debug, Error)]
pub enum DataUnavailable {
  #[error("{source_name} fetch failed: {error}")]
  Fetch {
    source_name: &'static str,
    #[source]
    error:       SourceError,
  },

  #[error("{source_name} did not answer within {timeout:?}")]
  Timeout {
    source_name: &'static str,
    timeout:     Duration,
  },

  #[error("refresh failed {failures} time(s); next attempt in {retry_in:?}")]
  BackingOff { failures: u32, retry_in: Duration },

  #[error("live table has no {0} column")]
  MissingColumn(Insight),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl DataUnavailable {
  pub(crate) fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }
}

/// Why a validated query could not be resolved.
#[derive(Debug, Error)]
pub enum ResolveError {
  #[error("{insight} is not available as a {horizon}")]
  UnsupportedCombination { insight: Insight, horizon: Horizon },

  #[error(transparent)]
  Unavailable(#[from] DataUnavailable),
}
