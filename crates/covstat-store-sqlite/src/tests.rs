//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::NaiveDate;
use covstat_core::{record::DailyRecord, store::HistoryStore};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn day(d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2020, 3, d).unwrap() }

fn record(country: &str, d: u32, new_cases: u64, total_cases: u64) -> DailyRecord {
  DailyRecord {
    country: country.into(),
    date: day(d),
    new_cases,
    new_deaths: 0,
    total_cases,
    total_deaths: 0,
  }
}

// ─── Fetch log ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn empty_store_has_no_fetches() {
  let s = store().await;
  assert!(!s.has_fetched(day(24)).await.unwrap());
  assert!(s.fetch_log().await.unwrap().is_empty());
  assert!(s.daily_records(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn replace_history_logs_the_fetch_date() {
  let s = store().await;
  s.replace_history(vec![record("China", 24, 5, 5)], day(24))
    .await
    .unwrap();

  assert!(s.has_fetched(day(24)).await.unwrap());
  assert!(!s.has_fetched(day(25)).await.unwrap());
  assert_eq!(s.fetch_log().await.unwrap(), vec![day(24)]);
}

#[tokio::test]
async fn fetch_log_is_append_only_and_deduplicated() {
  let s = store().await;
  s.replace_history(vec![], day(25)).await.unwrap();
  s.replace_history(vec![], day(24)).await.unwrap();
  s.replace_history(vec![], day(25)).await.unwrap();

  assert_eq!(s.fetch_log().await.unwrap(), vec![day(24), day(25)]);
}

// ─── Records ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn replace_history_replaces_previous_dataset() {
  let s = store().await;
  s.replace_history(vec![record("China", 24, 5, 5), record("Italy", 24, 3, 3)], day(24))
    .await
    .unwrap();
  s.replace_history(vec![record("Italy", 25, 4, 7)], day(25))
    .await
    .unwrap();

  let all = s.daily_records(None).await.unwrap();
  assert_eq!(all, vec![record("Italy", 25, 4, 7)]);
}

#[tokio::test]
async fn country_filter_is_case_insensitive() {
  let s = store().await;
  s.replace_history(
    vec![
      record("United Kingdom", 25, 2, 7),
      record("United Kingdom", 24, 5, 5),
      record("China", 24, 9, 9),
    ],
    day(25),
  )
  .await
  .unwrap();

  let uk = s.daily_records(Some("united  KINGDOM".into())).await.unwrap();
  assert_eq!(uk.len(), 2);
  assert_eq!(uk[0].date, day(24));
  assert_eq!(uk[1].total_cases, 7);

  assert!(s.daily_records(Some("Atlantis".into())).await.unwrap().is_empty());
}

#[tokio::test]
async fn countries_are_distinct() {
  let s = store().await;
  s.replace_history(
    vec![record("Peru", 24, 1, 1), record("Peru", 25, 1, 2), record("Chile", 24, 1, 1)],
    day(25),
  )
  .await
  .unwrap();

  assert_eq!(s.countries().await.unwrap(), vec!["Chile".to_owned(), "Peru".to_owned()]);
}

#[tokio::test]
async fn store_reopens_from_disk() {
  let dir = std::env::temp_dir().join(format!("covstat-store-{}", std::process::id()));
  std::fs::create_dir_all(&dir).unwrap();
  let path = dir.join("history.db");
  let _ = std::fs::remove_file(&path);

  {
    let s = SqliteStore::open(&path).await.unwrap();
    s.replace_history(vec![record("China", 24, 5, 5)], day(24))
      .await
      .unwrap();
  }

  let s = SqliteStore::open(&path).await.unwrap();
  assert!(s.has_fetched(day(24)).await.unwrap());
  assert_eq!(s.daily_records(None).await.unwrap().len(), 1);

  drop(s);
  let _ = std::fs::remove_dir_all(&dir);
}
