//! Running totals and per-date aggregation over historical records.
//!
//! Two summations live here and must not be confused:
//!
//! - [`running_totals`] turns one country's daily deltas into cumulative
//!   totals (the adapter step).
//! - [`worldwide_totals`] sums every column across countries for each date.
//!   The worldwide `total_cases` on a date is the sum of each country's own
//!   cumulative total on that date, not a re-accumulation of the summed
//!   deltas. The two differ whenever countries start reporting on different
//!   dates.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use covstat_core::{
  country,
  query::{Insight, Scope},
  record::{DailyRecord, SeriesPoint},
};
use tracing::debug;

// ─── Adapter step ────────────────────────────────────────────────────────────

/// One normalised upstream row before accumulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyDelta {
  pub country:    String,
  pub date:       NaiveDate,
  pub new_cases:  u64,
  pub new_deaths: u64,
}

/// Group `deltas` by country, order each group by date, and attach running
/// totals.
///
/// Rows repeating a `(country, date)` pair are merged by summing their deltas,
/// so each country has at most one record per date. Output is ordered by
/// country key, then date.
pub fn running_totals(deltas: Vec<DailyDelta>) -> Vec<DailyRecord> {
  let mut by_country: BTreeMap<String, (String, BTreeMap<NaiveDate, (u64, u64)>)> =
    BTreeMap::new();
  let mut merged = 0usize;

  for d in deltas {
    let (_, days) = by_country
      .entry(country::fold(&d.country))
      .or_insert_with(|| (d.country.clone(), BTreeMap::new()));
    let slot = days.entry(d.date).or_insert((0, 0));
    if *slot != (0, 0) {
      merged += 1;
    }
    slot.0 += d.new_cases;
    slot.1 += d.new_deaths;
  }

  if merged > 0 {
    debug!(merged, "merged repeated (country, date) rows");
  }

  let mut out = Vec::new();
  for (_, (name, days)) in by_country {
    let mut total_cases = 0u64;
    let mut total_deaths = 0u64;
    for (date, (new_cases, new_deaths)) in days {
      total_cases += new_cases;
      total_deaths += new_deaths;
      out.push(DailyRecord {
        country: name.clone(),
        date,
        new_cases,
        new_deaths,
        total_cases,
        total_deaths,
      });
    }
  }
  out
}

// ─── Worldwide ───────────────────────────────────────────────────────────────

/// Column-wise sums across countries for one date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DailyTotals {
  pub date:         NaiveDate,
  pub new_cases:    u64,
  pub new_deaths:   u64,
  pub total_cases:  u64,
  pub total_deaths: u64,
}

impl DailyTotals {
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

/// Sum all four counters across countries for each date, ascending by date.
pub fn worldwide_totals(records: &[DailyRecord]) -> Vec<DailyTotals> {
  let mut by_date: BTreeMap<NaiveDate, DailyTotals> = BTreeMap::new();
  for r in records {
    let t = by_date.entry(r.date).or_insert_with(|| DailyTotals {
      date: r.date,
      ..Default::default()
    });
    t.new_cases += r.new_cases;
    t.new_deaths += r.new_deaths;
    t.total_cases += r.total_cases;
    t.total_deaths += r.total_deaths;
  }
  by_date.into_values().collect()
}

// ─── Series ──────────────────────────────────────────────────────────────────

/// Build the `(date, value)` series for `scope` and `insight`, ascending by
/// date.
///
/// Returns `None` when the historical feed does not carry `insight`. A
/// country with no records yields an empty series.
pub fn series(
  records: &[DailyRecord],
  scope: &Scope,
  insight: Insight,
) -> Option<Vec<SeriesPoint>> {
  if !insight.in_historical_feed() {
    return None;
  }

  let points = match scope {
    Scope::Worldwide => worldwide_totals(records)
      .into_iter()
      .filter_map(|t| t.value(insight).map(|value| SeriesPoint { date: t.date, value }))
      .collect(),
    Scope::Country(name) => {
      let mut by_date: HashMap<NaiveDate, u64> = HashMap::new();
      for r in records.iter().filter(|r| country::same_country(&r.country, name)) {
        if let Some(v) = r.value(insight) {
          by_date.insert(r.date, v);
        }
      }
      let mut points: Vec<SeriesPoint> = by_date
        .into_iter()
        .map(|(date, value)| SeriesPoint { date, value })
        .collect();
      points.sort_by_key(|p| p.date);
      points
    }
  };

  Some(points)
}
