//! Error type for `covstat-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date parse error: {0}")]
  DateParse(String),

  /// A stored counter does not fit the record type.
  #[error("corrupt counter {column:?} for {country} on {date}: {value}")]
  Counter {
    column:  &'static str,
    country: String,
    date:    String,
    value:   i64,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
