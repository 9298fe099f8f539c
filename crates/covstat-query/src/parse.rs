//! Free-text query parser.
//!
//! Grammar, after lowercasing and splitting on whitespace:
//!
//! ```text
//! <insight word> <insight word> <scope word>+ <today|graph>
//! ```

use covstat_core::query::{Horizon, Insight, ParseError, Query, Scope};

/// Two insight words, at least one scope word, one horizon word.
pub const MIN_TOKENS: usize = 4;

/// Parse `raw` into a [`Query`].
///
/// Only the grammar is checked here. Whether the country exists is the
/// validator's job.
pub fn parse(raw: &str) -> Result<Query, ParseError> {
  let lowered = raw.to_lowercase();
  let tokens: Vec<&str> = lowered.split_whitespace().collect();

  if tokens.len() < MIN_TOKENS {
    return Err(ParseError::TooFewTokens { found: tokens.len() });
  }

  let insight = Insight::from_words(tokens[0], tokens[1]).ok_or_else(|| {
    ParseError::UnrecognizedInsight {
      phrase: format!("{} {}", tokens[0], tokens[1]),
    }
  })?;

  let last = tokens[tokens.len() - 1];
  let horizon = Horizon::from_token(last)
    .ok_or_else(|| ParseError::UnrecognizedHorizon { token: last.to_owned() })?;

  let scope = Scope::parse(&tokens[2..tokens.len() - 1].join(" "));

  Ok(Query::new(insight, scope, horizon))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn three_tokens_is_a_parse_error() {
    assert_eq!(
      parse("new cases today"),
      Err(ParseError::TooFewTokens { found: 3 })
    );
  }

  #[test]
  fn four_tokens_with_one_word_scope() {
    let q = parse("new cases worldwide today").unwrap();
    assert_eq!(q, Query::new(Insight::NewCases, Scope::Worldwide, Horizon::PointInTime));
  }

  #[test]
  fn multi_word_scope_is_joined_and_title_cased() {
    let q = parse("total deaths united   states of america graph").unwrap();
    assert_eq!(q.insight, Insight::TotalDeaths);
    assert_eq!(q.scope, Scope::Country("United States Of America".into()));
    assert_eq!(q.horizon, Horizon::TimeSeries);
  }

  #[test]
  fn case_is_normalised() {
    let q = parse("  TOTAL Recovered CHINA Today ").unwrap();
    assert_eq!(q.insight, Insight::TotalRecovered);
    assert_eq!(q.scope, Scope::Country("China".into()));
    assert_eq!(q.horizon, Horizon::PointInTime);
  }

  #[test]
  fn cross_product_phrases_are_rejected() {
    for text in ["new recovered china today", "active deaths china today"] {
      assert!(
        matches!(parse(text), Err(ParseError::UnrecognizedInsight { .. })),
        "{text}"
      );
    }
  }

  #[test]
  fn unknown_horizon_is_a_parse_error() {
    assert_eq!(
      parse("new cases china yesterday"),
      Err(ParseError::UnrecognizedHorizon { token: "yesterday".into() })
    );
  }

  #[test]
  fn empty_input() {
    assert_eq!(parse("   "), Err(ParseError::TooFewTokens { found: 0 }));
  }
}
