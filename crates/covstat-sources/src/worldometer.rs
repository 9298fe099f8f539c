//! Adapter for the Worldometer live table.
//!
//! The page carries one `<table id="main_table_countries_today">` with a header
//! row like `# | Country,Other | TotalCases | NewCases | TotalDeaths | ...` and
//! one body row per country, plus continent rows and a `Total:` footer.
//! Numbers are formatted for humans (`1,234`, `+56`, `N/A`, blank).

use std::time::Duration;

use covstat_core::{
  SourceError,
  query::Insight,
  record::{AGGREGATE_ROW, SnapshotRecord, SnapshotTable},
  source::LiveSource,
};
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, info};

use crate::{http, table::RawTable};

pub const DEFAULT_URL: &str = "https://www.worldometers.info/coronavirus/";
pub const TABLE_ID: &str = "main_table_countries_today";

const COUNTRY: &[&str] = &["Country,Other", "Country", "Country/Other"];

/// Upstream header for each insight's column.
fn column_aliases(insight: Insight) -> &'static [&'static str] {
  match insight {
    Insight::TotalCases => &["TotalCases"],
    Insight::NewCases => &["NewCases"],
    Insight::TotalDeaths => &["TotalDeaths"],
    Insight::NewDeaths => &["NewDeaths"],
    Insight::TotalRecovered => &["TotalRecovered"],
    Insight::ActiveCases => &["ActiveCases"],
  }
}

// ─── Source ──────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct WorldometerSource {
  client:  Client,
  url:     String,
  timeout: Duration,
}

impl WorldometerSource {
  pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, SourceError> {
    Ok(Self {
      client: http::client(timeout)?,
      url: url.into(),
      timeout,
    })
  }
}

impl LiveSource for WorldometerSource {
  fn name(&self) -> &'static str { "worldometer" }

  async fn fetch_snapshot(&self) -> Result<SnapshotTable, SourceError> {
    let resp = http::get(&self.client, &self.url, self.timeout).await?;
    let html = resp.text().await.map_err(|e| http::classify(e, self.timeout))?;

    let table = scrape_table(&html)?;
    let snapshot = normalize(&table)?;
    info!(
      rows = snapshot.records.len(),
      columns = snapshot.available.len(),
      "scraped Worldometer table"
    );
    Ok(snapshot)
  }
}

// ─── Scrape ──────────────────────────────────────────────────────────────────

fn selector(s: &str) -> Result<Selector, SourceError> {
  Selector::parse(s).map_err(|e| SourceError::Schema(format!("bad selector {s:?}: {e}")))
}

/// Read the countries table out of a Worldometer page.
///
/// Header text has all whitespace removed (`"Total\nCases"` becomes
/// `"TotalCases"`); body cells keep their text as-is.
pub fn scrape_table(html: &str) -> Result<RawTable, SourceError> {
  let doc = Html::parse_document(html);
  let table_sel = selector(&format!("table#{TABLE_ID}"))?;
  let th_sel = selector("thead th")?;
  let tr_sel = selector("tr")?;
  let td_sel = selector("td")?;

  let table = doc
    .select(&table_sel)
    .next()
    .ok_or_else(|| SourceError::Schema(format!("no table#{TABLE_ID} on page")))?;

  let columns: Vec<String> = table
    .select(&th_sel)
    .map(|th| th.text().flat_map(str::chars).filter(|c| !c.is_whitespace()).collect())
    .collect();

  let rows: Vec<Vec<String>> = table
    .select(&tr_sel)
    .map(|tr| tr.select(&td_sel).map(|td| td.text().collect::<String>()).collect())
    .filter(|cells: &Vec<String>| !cells.is_empty())
    .collect();

  Ok(RawTable::new(columns, rows))
}

// ─── Normalisation ───────────────────────────────────────────────────────────

/// Convert scraped rows into a [`SnapshotTable`].
///
/// Every insight column is optional; the ones found are listed in
/// `available`. The first `Total:` row is kept as the worldwide aggregate and
/// later ones dropped. A page with no `Total:` row but a `World` row gets that
/// row relabelled as the aggregate.
pub fn normalize(table: &RawTable) -> Result<SnapshotTable, SourceError> {
  let country_col = table.require_column(COUNTRY)?;

  let columns: Vec<(Insight, usize)> = Insight::ALL
    .into_iter()
    .filter_map(|i| table.find_column(column_aliases(i)).map(|c| (i, c)))
    .collect();
  if columns.is_empty() {
    return Err(SourceError::Schema("live table has no counter columns".into()));
  }

  let mut records = Vec::with_capacity(table.rows.len());
  let mut seen_aggregate = false;
  for row in &table.rows {
    let country = RawTable::cell(row, country_col);
    if country.is_empty() {
      continue;
    }
    if country == AGGREGATE_ROW {
      if seen_aggregate {
        debug!("dropping repeated aggregate row");
        continue;
      }
      seen_aggregate = true;
    }

    let mut record = SnapshotRecord {
      country: country.to_owned(),
      ..Default::default()
    };
    for &(insight, col) in &columns {
      *slot(&mut record, insight) = number(RawTable::cell(row, col));
    }
    records.push(record);
  }

  if !seen_aggregate
    && let Some(world) = records.iter_mut().find(|r| r.country.eq_ignore_ascii_case("world"))
  {
    world.country = AGGREGATE_ROW.to_owned();
  }

  Ok(SnapshotTable {
    records,
    available: columns.into_iter().map(|(i, _)| i).collect(),
  })
}

fn slot(record: &mut SnapshotRecord, insight: Insight) -> &mut u64 {
  match insight {
    Insight::TotalCases => &mut record.total_cases,
    Insight::NewCases => &mut record.new_cases,
    Insight::TotalDeaths => &mut record.total_deaths,
    Insight::NewDeaths => &mut record.new_deaths,
    Insight::TotalRecovered => &mut record.total_recovered,
    Insight::ActiveCases => &mut record.active_cases,
  }
}

/// `"1,234"`, `"+56"`, `" "` and `"N/A"` as counts; unreadable cells are zero.
fn number(cell: &str) -> u64 {
  let digits: String = cell.chars().filter(|c| !matches!(c, ',' | '+' | ' ')).collect();
  digits.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
  use super::*;

  const PAGE: &str = r#"
    <html><body>
    <table id="main_table_countries_yesterday"><thead><tr><th>Country,Other</th></tr></thead>
      <tbody><tr><td>Stale</td></tr></tbody></table>
    <table id="main_table_countries_today">
      <thead><tr>
        <th>#</th><th>Country,<br>Other</th><th>Total<br>Cases</th><th>New<br>Cases</th>
        <th>Total<br>Deaths</th><th>New<br>Deaths</th><th>Total<br>Recovered</th>
        <th>Active<br>Cases</th>
      </tr></thead>
      <tbody>
        <tr><td>1</td><td><a href="country/china/">China</a></td><td>81,171</td><td>+78</td>
            <td>3,277</td><td>+7</td><td>73,159</td><td>4,735</td></tr>
        <tr><td>2</td><td>S. Korea</td><td>9,137</td><td></td><td>126</td><td></td>
            <td>3,730</td><td>5,281</td></tr>
        <tr><td></td><td>Diamond Princess</td><td>712</td><td></td><td>10</td><td></td>
            <td>N/A</td><td>N/A</td></tr>
      </tbody>
      <tbody class="total_row_body">
        <tr class="total_row"><td></td><td>Total:</td><td>422,915</td><td>+40,712</td>
            <td>18,907</td><td>+2,398</td><td>109,143</td><td>294,865</td></tr>
        <tr class="total_row"><td></td><td>Total:</td><td>1</td><td>1</td>
            <td>1</td><td>1</td><td>1</td><td>1</td></tr>
      </tbody>
    </table>
    </body></html>"#;

  #[test]
  fn scrapes_today_table_only() {
    let table = scrape_table(PAGE).unwrap();
    assert_eq!(table.columns[1], "Country,Other");
    assert_eq!(table.columns[2], "TotalCases");
    assert_eq!(table.rows.len(), 5);
    assert_eq!(RawTable::cell(&table.rows[0], 1), "China");
  }

  #[test]
  fn normalises_counts_and_aggregate() {
    let snap = normalize(&scrape_table(PAGE).unwrap()).unwrap();
    assert_eq!(snap.available.len(), 6);

    let china = snap.country("china").unwrap();
    assert_eq!(china.total_cases, 81_171);
    assert_eq!(china.new_cases, 78);
    assert_eq!(china.active_cases, 4_735);

    let korea = snap.country("S. Korea").unwrap();
    assert_eq!(korea.new_deaths, 0);

    let princess = snap.country("Diamond Princess").unwrap();
    assert_eq!(princess.total_recovered, 0);

    let total = snap.aggregate().unwrap();
    assert_eq!(total.total_cases, 422_915);
    assert_eq!(snap.records.iter().filter(|r| r.is_aggregate()).count(), 1);
  }

  #[test]
  fn missing_columns_are_not_available() {
    let table = RawTable::new(
      vec!["Country,Other".into(), "TotalCases".into()],
      vec![vec!["World".into(), "100".into()], vec!["Peru".into(), "7".into()]],
    );
    let snap = normalize(&table).unwrap();
    assert!(snap.has(Insight::TotalCases));
    assert!(!snap.has(Insight::ActiveCases));
    assert_eq!(snap.aggregate().unwrap().total_cases, 100);
  }

  #[test]
  fn table_without_counters_is_schema_error() {
    let table = RawTable::new(vec!["Country".into()], vec![vec!["Peru".into()]]);
    assert!(matches!(normalize(&table), Err(SourceError::Schema(_))));
  }

  #[test]
  fn page_without_table_is_schema_error() {
    assert!(matches!(
      scrape_table("<html><body><p>rate limited</p></body></html>"),
      Err(SourceError::Schema(_))
    ));
  }
}
