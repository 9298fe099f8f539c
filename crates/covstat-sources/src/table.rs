//! A raw upstream table: header names plus string cells.
//!
//! Column lookup is tolerant of spacing, case and underscores, so
//! `"Country,Other"`, `"country, other"` and `"Country_,Other"` all resolve to
//! the same column.

use covstat_core::SourceError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
  pub columns: Vec<String>,
  pub rows:    Vec<Vec<String>>,
}

fn squash(name: &str) -> String {
  name
    .chars()
    .filter(|c| !c.is_whitespace() && *c != '_')
    .flat_map(char::to_lowercase)
    .collect()
}

impl RawTable {
  pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self { Self { columns, rows } }

  /// Index of the first column matching any of `aliases`.
  pub fn find_column(&self, aliases: &[&str]) -> Option<usize> {
    aliases.iter().find_map(|alias| {
      let wanted = squash(alias);
      self.columns.iter().position(|c| squash(c) == wanted)
    })
  }

  /// Like [`find_column`](Self::find_column), but a missing column is a
  /// schema error named after the first alias.
  pub fn require_column(&self, aliases: &[&str]) -> Result<usize, SourceError> {
    self
      .find_column(aliases)
      .ok_or_else(|| SourceError::MissingColumn(aliases[0].to_owned()))
  }

  /// Trimmed cell text; short rows read as empty.
  pub fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map(|s| s.trim()).unwrap_or("")
  }
}
