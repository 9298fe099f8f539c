//! Adapter for the ECDC case-distribution feed.
//!
//! The feed is a JSON object with a `records` array of flat rows, one per
//! country per day: daily `cases` and `deaths` deltas, a `dateRep` date in
//! `dd/mm/yyyy` form, and the country in `countriesAndTerritories` with
//! underscores for spaces. Older dumps spell the columns the way the bot's
//! renamed CSV did (`NewCases`, `Country`, `Date`), so both are accepted.

use std::time::Duration;

use chrono::NaiveDate;
use covstat_core::{SourceError, record::DailyRecord, source::HistoricalSource};
use covstat_query::aggregate::{DailyDelta, running_totals};
use reqwest::Client;
use serde_json::Value;
use tracing::{info, warn};

use crate::{http, table::RawTable};

pub const DEFAULT_URL: &str = "https://opendata.ecdc.europa.eu/covid19/casedistribution/json";

const COUNTRY: &[&str] = &["countriesAndTerritories", "Country"];
const CASES: &[&str] = &["cases", "NewCases"];
const DEATHS: &[&str] = &["deaths", "NewDeaths"];
const DATE: &[&str] = &["dateRep", "Date"];

// ─── Source ──────────────────────────────────────────────────────────────────

/// Fetches and normalises the ECDC feed.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct EcdcSource {
  client:  Client,
  url:     String,
  timeout: Duration,
}

impl EcdcSource {
  pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, SourceError> {
    Ok(Self {
      client: http::client(timeout)?,
      url: url.into(),
      timeout,
    })
  }
}

impl HistoricalSource for EcdcSource {
  fn name(&self) -> &'static str { "ecdc" }

  async fn fetch_history(&self) -> Result<Vec<DailyRecord>, SourceError> {
    let resp = http::get(&self.client, &self.url, self.timeout).await?;
    let body: Value = resp
      .json()
      .await
      .map_err(|e| SourceError::Schema(format!("feed is not JSON: {e}")))?;

    let table = table_from_json(&body)?;
    let records = normalize(&table)?;
    info!(rows = table.rows.len(), records = records.len(), "normalised ECDC feed");
    Ok(records)
  }
}

// ─── Raw table ───────────────────────────────────────────────────────────────

/// Flatten `{"records": [{...}, ...]}` (or a bare array of objects) into a
/// [`RawTable`]. Columns are the union of keys in first-seen order; numbers
/// are rendered as text and nulls as empty cells.
pub fn table_from_json(body: &Value) -> Result<RawTable, SourceError> {
  let rows = body
    .get("records")
    .unwrap_or(body)
    .as_array()
    .ok_or_else(|| SourceError::Schema("expected a `records` array".into()))?;

  let mut columns: Vec<String> = Vec::new();
  for row in rows {
    let obj = row
      .as_object()
      .ok_or_else(|| SourceError::Schema("record is not an object".into()))?;
    for key in obj.keys() {
      if !columns.iter().any(|c| c == key) {
        columns.push(key.clone());
      }
    }
  }

  let table_rows = rows
    .iter()
    .filter_map(Value::as_object)
    .map(|obj| {
      columns
        .iter()
        .map(|c| match obj.get(c) {
          Some(Value::String(s)) => s.clone(),
          Some(Value::Null) | None => String::new(),
          Some(other) => other.to_string(),
        })
        .collect()
    })
    .collect();

  Ok(RawTable::new(columns, table_rows))
}

// ─── Normalisation ───────────────────────────────────────────────────────────

enum DateColumns {
  Single(usize),
  Split { day: usize, month: usize, year: usize },
}

/// Convert ECDC rows into [`DailyRecord`]s with per-country running totals.
///
/// Rows without a country or a readable date are dropped. Negative deltas
/// (upstream corrections) are clamped to zero so totals never decrease.
pub fn normalize(table: &RawTable) -> Result<Vec<DailyRecord>, SourceError> {
  let country_col = table.require_column(COUNTRY)?;
  let cases_col = table.require_column(CASES)?;
  let deaths_col = table.require_column(DEATHS)?;
  let date_cols = match table.find_column(DATE) {
    Some(i) => DateColumns::Single(i),
    None => DateColumns::Split {
      day:   table.require_column(&["day"])?,
      month: table.require_column(&["month"])?,
      year:  table.require_column(&["year"])?,
    },
  };

  let mut deltas = Vec::with_capacity(table.rows.len());
  let mut dropped = 0usize;
  let mut clamped = 0usize;

  for row in &table.rows {
    let country = RawTable::cell(row, country_col).replace('_', " ");
    let date = match &date_cols {
      DateColumns::Single(i) => parse_date(RawTable::cell(row, *i)),
      DateColumns::Split { day, month, year } => split_date(
        RawTable::cell(row, *day),
        RawTable::cell(row, *month),
        RawTable::cell(row, *year),
      ),
    };
    let country = country.trim();
    let Some(date) = date.filter(|_| !country.is_empty()) else {
      dropped += 1;
      continue;
    };

    let (new_cases, c) = count(RawTable::cell(row, cases_col));
    let (new_deaths, d) = count(RawTable::cell(row, deaths_col));
    clamped += usize::from(c) + usize::from(d);

    deltas.push(DailyDelta { country: country.to_owned(), date, new_cases, new_deaths });
  }

  if dropped > 0 {
    warn!(dropped, "dropped ECDC rows without a country or date");
  }
  if clamped > 0 {
    warn!(clamped, "clamped negative ECDC deltas to zero");
  }
  if deltas.is_empty() && !table.rows.is_empty() {
    return Err(SourceError::Schema("no usable rows in ECDC feed".into()));
  }

  Ok(running_totals(deltas))
}

fn parse_date(s: &str) -> Option<NaiveDate> {
  NaiveDate::parse_from_str(s, "%d/%m/%Y")
    .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
    .ok()
}

fn split_date(day: &str, month: &str, year: &str) -> Option<NaiveDate> {
  NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

/// Parse a delta; returns the clamped value and whether clamping happened.
fn count(s: &str) -> (u64, bool) {
  let n = s
    .parse::<i64>()
    .or_else(|_| s.parse::<f64>().map(|f| f as i64))
    .unwrap_or(0);
  if n < 0 { (0, true) } else { (n as u64, false) }
}
