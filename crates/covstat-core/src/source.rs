//! Collaborator traits: upstream feeds and the chart renderer.
//!
//! Each upstream variant implements an adapter that yields canonical records,
//! so the resolver never depends on a feed's column layout.

use std::future::Future;

use crate::{
  error::{RenderError, SourceError},
  query::{Insight, Scope},
  record::{DailyRecord, SeriesPoint, SnapshotTable},
};

/// The cumulative, per-date feed behind time-series queries.
pub trait HistoricalSource: Send + Sync {
  /// Short name for logs, e.g. `"ecdc"`.
  fn name(&self) -> &'static str;

  /// Fetch the whole upstream dataset and normalise it. Per-country running
  /// totals are already computed in the returned records.
  fn fetch_history(
    &self,
  ) -> impl Future<Output = Result<Vec<DailyRecord>, SourceError>> + Send + '_;
}

/// The "as of now" feed behind point-in-time queries.
pub trait LiveSource: Send + Sync {
  fn name(&self) -> &'static str;

  fn fetch_snapshot(
    &self,
  ) -> impl Future<Output = Result<SnapshotTable, SourceError>> + Send + '_;
}

/// Everything a renderer needs to draw one series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chart {
  pub title:   String,
  pub insight: Insight,
  pub scope:   Scope,
  /// Ascending by date.
  pub points:  Vec<SeriesPoint>,
}

/// Draws a series and returns an artifact reference (a path or identifier).
///
/// `request_id` is unique per request and must be folded into the artifact
/// name so concurrent renders never collide. Dropping the returned future
/// cancels the render.
pub trait ChartRenderer: Send + Sync {
  fn render_time_series<'a>(
    &'a self,
    chart: &'a Chart,
    request_id: &'a str,
  ) -> impl Future<Output = Result<String, RenderError>> + Send + 'a;
}
