//! The `HistoryStore` trait: durable cache of the historical feed.
//!
//! The trait is implemented by storage backends (e.g. `covstat-store-sqlite`).
//! The engine depends on this abstraction, not on any concrete backend.

use std::future::Future;

use chrono::NaiveDate;

use crate::record::DailyRecord;

/// Persisted historical records plus the fetch log that says when they were
/// last refreshed.
///
/// The fetch log only grows. An entry is written in the same atomic step as
/// the records it vouches for, so a reader never sees a logged date without
/// its data.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait HistoryStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Fetch log ─────────────────────────────────────────────────────────

  /// Whether the dataset was refreshed on `date`.
  fn has_fetched(
    &self,
    date: NaiveDate,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Every logged refresh date, ascending.
  fn fetch_log(
    &self,
  ) -> impl Future<Output = Result<Vec<NaiveDate>, Self::Error>> + Send + '_;

  // ── Records ───────────────────────────────────────────────────────────

  /// Replace the whole dataset with `records` and log `fetched_on`, as one
  /// transaction. Either both happen or neither does.
  fn replace_history(
    &self,
    records: Vec<DailyRecord>,
    fetched_on: NaiveDate,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Stored records, optionally restricted to one country (matched
  /// case-insensitively). Order is unspecified.
  fn daily_records(
    &self,
    country: Option<String>,
  ) -> impl Future<Output = Result<Vec<DailyRecord>, Self::Error>> + Send + '_;

  /// Distinct country names present in the dataset.
  fn countries(
    &self,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;
}
