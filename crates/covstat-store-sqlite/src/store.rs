//! [`SqliteStore`]: the SQLite implementation of [`HistoryStore`].

use std::path::Path;

use chrono::NaiveDate;
use rusqlite::OptionalExtension as _;

use covstat_core::{country, record::DailyRecord, store::HistoryStore};

use crate::{
  Result,
  encode::{RawDailyRecord, decode_date, encode_count, encode_date},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A covstat history cache backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests and throwaway runs.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── HistoryStore impl ───────────────────────────────────────────────────────

impl HistoryStore for SqliteStore {
  type Error = crate::Error;

  // ── Fetch log ─────────────────────────────────────────────────────────────

  async fn has_fetched(&self, date: NaiveDate) -> Result<bool> {
    let date_str = encode_date(date);
    let found = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM fetch_log WHERE date = ?1",
              rusqlite::params![date_str],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;
    Ok(found)
  }

  async fn fetch_log(&self) -> Result<Vec<NaiveDate>> {
    let raw: Vec<String> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT date FROM fetch_log ORDER BY date")?;
        let rows = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raw.iter().map(|s| decode_date(s)).collect()
  }

  // ── Records ───────────────────────────────────────────────────────────────

  async fn replace_history(&self, records: Vec<DailyRecord>, fetched_on: NaiveDate) -> Result<()> {
    let fetched_str = encode_date(fetched_on);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM daily_records", [])?;
        {
          // Later duplicates of a (country_key, date) pair win.
          let mut insert = tx.prepare(
            "INSERT OR REPLACE INTO daily_records (
               country, country_key, date,
               new_cases, new_deaths, total_cases, total_deaths
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          )?;
          for r in &records {
            insert.execute(rusqlite::params![
              r.country,
              country::fold(&r.country),
              encode_date(r.date),
              encode_count(r.new_cases),
              encode_count(r.new_deaths),
              encode_count(r.total_cases),
              encode_count(r.total_deaths),
            ])?;
          }
        }
        tx.execute(
          "INSERT OR IGNORE INTO fetch_log (date) VALUES (?1)",
          rusqlite::params![fetched_str],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn daily_records(&self, name: Option<String>) -> Result<Vec<DailyRecord>> {
    let key = name.as_deref().map(country::fold);

    let raw: Vec<RawDailyRecord> = self
      .conn
      .call(move |conn| {
        let rows = match key {
          Some(k) => {
            let mut stmt = conn.prepare(&format!(
              "SELECT {} FROM daily_records WHERE country_key = ?1 ORDER BY date",
              RawDailyRecord::COLUMNS
            ))?;
            let rows = stmt
              .query_map(rusqlite::params![k], RawDailyRecord::from_row)?
              .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
          }
          None => {
            let mut stmt = conn.prepare(&format!(
              "SELECT {} FROM daily_records ORDER BY country_key, date",
              RawDailyRecord::COLUMNS
            ))?;
            let rows = stmt
              .query_map([], RawDailyRecord::from_row)?
              .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
          }
        };
        Ok(rows)
      })
      .await?;

    raw.into_iter().map(RawDailyRecord::decode).collect()
  }

  async fn countries(&self) -> Result<Vec<String>> {
    let names = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT MIN(country) FROM daily_records GROUP BY country_key ORDER BY country_key",
        )?;
        let rows = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(names)
  }
}
