//! The reference data a query is validated against.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::{
  country,
  query::{Horizon, Insight},
  record::DailyRecord,
};

/// Countries and insight names known from the most recently loaded data.
///
/// Immutable once built; a refresh builds a new set and swaps it in whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceSet {
  /// Folded comparison key → display name.
  countries: BTreeMap<String, String>,
  insights:  BTreeSet<Insight>,
  horizons:  BTreeSet<Horizon>,
}

impl Default for ReferenceSet {
  fn default() -> Self { Self::new(std::iter::empty::<&str>()) }
}

impl ReferenceSet {
  /// A set with every insight and horizon enabled.
  pub fn new<I, S>(countries: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let countries = countries
      .into_iter()
      .map(|c| {
        let key = country::fold(c.as_ref());
        let display = country::title_case(&key);
        (key, display)
      })
      .filter(|(key, _)| !key.is_empty())
      .collect();
    Self {
      countries,
      insights: Insight::ALL.into_iter().collect(),
      horizons: Horizon::ALL.into_iter().collect(),
    }
  }

  /// Build from the countries present in `records`.
  pub fn from_records(records: &[DailyRecord]) -> Self {
    Self::new(records.iter().map(|r| r.country.as_str()))
  }

  /// Restrict the supported insights.
  pub fn with_insights(mut self, insights: impl IntoIterator<Item = Insight>) -> Self {
    self.insights = insights.into_iter().collect();
    self
  }

  /// Restrict the served horizons.
  pub fn with_horizons(mut self, horizons: impl IntoIterator<Item = Horizon>) -> Self {
    self.horizons = horizons.into_iter().collect();
    self
  }

  pub fn has_country(&self, name: &str) -> bool {
    self.countries.contains_key(&country::fold(name))
  }

  pub fn has_insight(&self, insight: Insight) -> bool { self.insights.contains(&insight) }

  pub fn has_horizon(&self, horizon: Horizon) -> bool { self.horizons.contains(&horizon) }

  /// Display names, sorted by comparison key.
  pub fn countries(&self) -> impl Iterator<Item = &str> {
    self.countries.values().map(String::as_str)
  }

  pub fn country_count(&self) -> usize { self.countries.len() }

  pub fn is_empty(&self) -> bool { self.countries.is_empty() }
}
