//! Canonical records produced by the source adapters.
//!
//! Upstream feeds disagree on column names and layout. Adapters translate
//! each of them into these two shapes; nothing past the adapter layer sees a
//! raw column name.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{country, query::Insight};

// ─── Historical feed ─────────────────────────────────────────────────────────

/// One country on one day from the cumulative historical feed.
///
/// For a fixed country, `total_cases` is the running sum of `new_cases` over
/// every date up to and including `date`; likewise for deaths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRecord {
  pub country:      String,
  pub date:         NaiveDate,
  pub new_cases:    u64,
  pub new_deaths:   u64,
  pub total_cases:  u64,
  pub total_deaths: u64,
}

impl DailyRecord {
  /// The counter selected by `insight`, or `None` for the counters this feed
  /// never carries.
  pub fn value(&self, insight: Insight) -> Option<u64> {
    match insight {
      Insight::TotalCases => Some(self.total_cases),
      Insight::NewCases => Some(self.new_cases),
      Insight::TotalDeaths => Some(self.total_deaths),
      Insight::NewDeaths => Some(self.new_deaths),
      Insight::TotalRecovered | Insight::ActiveCases => None,
    }
  }
}

// ─── Live feed ───────────────────────────────────────────────────────────────

/// Country label of the synthetic worldwide row in a snapshot.
pub const AGGREGATE_ROW: &str = "Total:";

/// "As of now" figures for one country, or for the whole world when
/// `country == AGGREGATE_ROW`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRecord {
  pub country:         String,
  pub total_cases:     u64,
  pub new_cases:       u64,
  pub total_deaths:    u64,
  pub new_deaths:      u64,
  pub total_recovered: u64,
  pub active_cases:    u64,
}

impl SnapshotRecord {
  pub fn value(&self, insight: Insight) -> u64 {
    match insight {
      Insight::TotalCases => self.total_cases,
      Insight::NewCases => self.new_cases,
      Insight::TotalDeaths => self.total_deaths,
      Insight::NewDeaths => self.new_deaths,
      Insight::TotalRecovered => self.total_recovered,
      Insight::ActiveCases => self.active_cases,
    }
  }

  pub fn is_aggregate(&self) -> bool { self.country == AGGREGATE_ROW }
}

/// One scrape of the live table.
///
/// `available` lists the insights whose column was actually present; values
/// for absent columns are zero and must not be reported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotTable {
  pub records:   Vec<SnapshotRecord>,
  pub available: BTreeSet<Insight>,
}

impl SnapshotTable {
  /// The synthetic worldwide row, if the scrape produced one.
  pub fn aggregate(&self) -> Option<&SnapshotRecord> {
    self.records.iter().find(|r| r.is_aggregate())
  }

  /// The first row whose country matches `name` case-insensitively.
  pub fn country(&self, name: &str) -> Option<&SnapshotRecord> {
    self
      .records
      .iter()
      .filter(|r| !r.is_aggregate())
      .find(|r| country::same_country(&r.country, name))
  }

  pub fn has(&self, insight: Insight) -> bool { self.available.contains(&insight) }
}

// ─── Series ──────────────────────────────────────────────────────────────────

/// One point of a resolved time series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesPoint {
  pub date:  NaiveDate,
  pub value: u64,
}
