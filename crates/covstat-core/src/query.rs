//! The structured query: what the caller asked for, independent of how it
//! was phrased.
//!
//! A [`Query`] is built once (by the text parser or from structured fields),
//! then read by the validator and the resolver. Normalisation of names happens
//! at construction; nothing downstream re-derives it.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::country;

// ─── Insight ─────────────────────────────────────────────────────────────────

/// The statistical quantity requested.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Insight {
  TotalCases,
  NewCases,
  TotalDeaths,
  NewDeaths,
  TotalRecovered,
  ActiveCases,
}

impl Insight {
  pub const ALL: [Insight; 6] = [
    Self::TotalCases,
    Self::NewCases,
    Self::TotalDeaths,
    Self::NewDeaths,
    Self::TotalRecovered,
    Self::ActiveCases,
  ];

  /// The canonical two-word phrase, e.g. `"total cases"`.
  pub fn phrase(self) -> &'static str {
    match self {
      Self::TotalCases => "total cases",
      Self::NewCases => "new cases",
      Self::TotalDeaths => "total deaths",
      Self::NewDeaths => "new deaths",
      Self::TotalRecovered => "total recovered",
      Self::ActiveCases => "active cases",
    }
  }

  /// Map two lowercase words to an insight. Only the six canonical phrases
  /// are accepted, not every combination of the word lists.
  pub fn from_words(first: &str, second: &str) -> Option<Self> {
    match (first, second) {
      ("total", "cases") => Some(Self::TotalCases),
      ("new", "cases") => Some(Self::NewCases),
      ("total", "deaths") => Some(Self::TotalDeaths),
      ("new", "deaths") => Some(Self::NewDeaths),
      ("total", "recovered") => Some(Self::TotalRecovered),
      ("active", "cases") => Some(Self::ActiveCases),
      _ => None,
    }
  }

  /// Whether the cumulative historical feed carries this counter.
  /// Recovered and active counts exist only in the live snapshot.
  pub fn in_historical_feed(self) -> bool {
    matches!(
      self,
      Self::TotalCases | Self::NewCases | Self::TotalDeaths | Self::NewDeaths
    )
  }

  /// Whether `(self, horizon)` can be answered from the feed that serves
  /// `horizon`.
  pub fn supports(self, horizon: Horizon) -> bool {
    match horizon {
      Horizon::PointInTime => true,
      Horizon::TimeSeries => self.in_historical_feed(),
    }
  }
}

impl fmt::Display for Insight {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.phrase())
  }
}

/// Accepts `"total cases"`, `"total_cases"` and `"TotalCases"` alike.
impl FromStr for Insight {
  type Err = crate::Error;

  fn from_str(s: &str) -> crate::Result<Self> {
    let squashed: String = s
      .chars()
      .filter(|c| !c.is_whitespace() && *c != '_')
      .flat_map(char::to_lowercase)
      .collect();
    Self::ALL
      .into_iter()
      .find(|i| i.phrase().replace(' ', "") == squashed)
      .ok_or_else(|| crate::Error::UnknownInsight(s.to_owned()))
  }
}

// ─── Horizon ─────────────────────────────────────────────────────────────────

/// Whether the answer is a single current value or a historical series.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Horizon {
  PointInTime,
  TimeSeries,
}

impl Horizon {
  pub const ALL: [Horizon; 2] = [Self::PointInTime, Self::TimeSeries];

  /// The trailing token that selects this horizon in free text.
  pub fn token(self) -> &'static str {
    match self {
      Self::PointInTime => "today",
      Self::TimeSeries => "graph",
    }
  }

  pub fn from_token(token: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|h| h.token() == token)
  }
}

impl fmt::Display for Horizon {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.token())
  }
}

/// Accepts the free-text tokens (`today`, `graph`) and the serde names
/// (`point_in_time`, `time_series`).
impl FromStr for Horizon {
  type Err = crate::Error;

  fn from_str(s: &str) -> crate::Result<Self> {
    let lowered = s.trim().to_lowercase();
    match lowered.as_str() {
      "today" | "point_in_time" => Ok(Self::PointInTime),
      "graph" | "time_series" => Ok(Self::TimeSeries),
      _ => Err(crate::Error::UnknownHorizon(s.to_owned())),
    }
  }
}

// ─── Scope ───────────────────────────────────────────────────────────────────

/// The literal scope word that selects the worldwide aggregate.
pub const WORLDWIDE: &str = "worldwide";

/// The geographic target of a query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum Scope {
  Worldwide,
  /// A country name, title-cased at construction.
  Country(String),
}

impl Scope {
  /// Normalise free text into a scope. `worldwide` in any case selects the
  /// aggregate; anything else is a candidate country name.
  pub fn parse(raw: &str) -> Self {
    let folded = country::fold(raw);
    if folded == WORLDWIDE {
      Self::Worldwide
    } else {
      Self::Country(country::title_case(&folded))
    }
  }
}

impl fmt::Display for Scope {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Worldwide => f.write_str(WORLDWIDE),
      Self::Country(name) => f.write_str(name),
    }
  }
}

// ─── Query ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
  pub insight: Insight,
  pub scope:   Scope,
  pub horizon: Horizon,
}

impl Query {
  pub fn new(insight: Insight, scope: Scope, horizon: Horizon) -> Self {
    Self { insight, scope, horizon }
  }

  /// Build a query from loosely-typed fields supplied by a non-text caller.
  ///
  /// Names that map to no insight or horizon are semantic failures, so they
  /// are reported as [`ValidationError`]s rather than parse errors.
  pub fn from_fields(
    insight: &str,
    scope: &str,
    horizon: &str,
  ) -> Result<Self, ValidationError> {
    let insight = insight
      .parse::<Insight>()
      .map_err(|_| ValidationError::UnknownInsight(insight.to_owned()))?;
    let horizon = horizon
      .parse::<Horizon>()
      .map_err(|_| ValidationError::UnknownHorizon(horizon.to_owned()))?;
    if country::fold(scope).is_empty() {
      return Err(ValidationError::UnknownScope(scope.to_owned()));
    }
    Ok(Self::new(insight, Scope::parse(scope), horizon))
  }
}

// ─── Errors ──────────────────────────────────────────────────────────────────

/// The text does not match `<insight> <scope…> <today|graph>`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseError {
  #[error("expected at least 4 words, found {found}")]
  TooFewTokens { found: usize },

  #[error("{phrase:?} is not a known insight")]
  UnrecognizedInsight { phrase: String },

  #[error("message must end with \"today\" or \"graph\", not {token:?}")]
  UnrecognizedHorizon { token: String },
}

/// Discriminant of a [`ValidationError`], in checking order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationErrorKind {
  UnknownInsight,
  UnknownHorizon,
  UnknownScope,
}

/// The query is well formed but not answerable against current reference
/// data.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ValidationError {
  #[error("unknown insight {0:?}")]
  UnknownInsight(String),

  #[error("unknown horizon {0:?}")]
  UnknownHorizon(String),

  #[error("unknown country {0:?}")]
  UnknownScope(String),
}

impl ValidationError {
  pub fn kind(&self) -> ValidationErrorKind {
    match self {
      Self::UnknownInsight(_) => ValidationErrorKind::UnknownInsight,
      Self::UnknownHorizon(_) => ValidationErrorKind::UnknownHorizon,
      Self::UnknownScope(_) => ValidationErrorKind::UnknownScope,
    }
  }
}
