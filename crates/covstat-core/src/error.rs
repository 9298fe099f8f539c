//! Error types for `covstat-core`.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown insight name: {0:?}")]
  UnknownInsight(String),

  #[error("unknown horizon name: {0:?}")]
  UnknownHorizon(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failure of an upstream feed, either while fetching or while normalising
/// the raw table into canonical records.
#[derive(Debug, Error)]
pub enum SourceError {
  #[error("network error: {0}")]
  Network(String),

  #[error("upstream returned HTTP {0}")]
  Status(u16),

  #[error("schema error: missing column {0:?}")]
  MissingColumn(String),

  #[error("schema error: {0}")]
  Schema(String),

  #[error("upstream did not answer within {0:?}")]
  Timeout(Duration),
}

/// Failure of the chart collaborator.
#[derive(Debug, Error)]
pub enum RenderError {
  #[error("cannot render an empty series")]
  EmptySeries,

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}
