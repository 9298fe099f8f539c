//! Conversions between domain values and their SQLite column forms.
//!
//! Dates are stored as `YYYY-MM-DD` text so they sort lexically. Counters are
//! stored as `INTEGER` (SQLite's signed 64-bit).

use chrono::NaiveDate;
use covstat_core::record::DailyRecord;

use crate::{Error, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

/// Counters above `i64::MAX` saturate; no real feed comes close.
pub fn encode_count(n: u64) -> i64 { i64::try_from(n).unwrap_or(i64::MAX) }

// ─── Raw rows ────────────────────────────────────────────────────────────────

/// A `daily_records` row exactly as read from SQLite, before validation.
pub struct RawDailyRecord {
  pub country:      String,
  pub date:         String,
  pub new_cases:    i64,
  pub new_deaths:   i64,
  pub total_cases:  i64,
  pub total_deaths: i64,
}

impl RawDailyRecord {
  pub const COLUMNS: &'static str =
    "country, date, new_cases, new_deaths, total_cases, total_deaths";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      country:      row.get(0)?,
      date:         row.get(1)?,
      new_cases:    row.get(2)?,
      new_deaths:   row.get(3)?,
      total_cases:  row.get(4)?,
      total_deaths: row.get(5)?,
    })
  }

  pub fn decode(self) -> Result<DailyRecord> {
    let date = decode_date(&self.date)?;
    let count = |column: &'static str, value: i64| {
      u64::try_from(value).map_err(|_| Error::Counter {
        column,
        country: self.country.clone(),
        date: self.date.clone(),
        value,
      })
    };
    Ok(DailyRecord {
      new_cases: count("new_cases", self.new_cases)?,
      new_deaths: count("new_deaths", self.new_deaths)?,
      total_cases: count("total_cases", self.total_cases)?,
      total_deaths: count("total_deaths", self.total_deaths)?,
      country: self.country,
      date,
    })
  }
}
