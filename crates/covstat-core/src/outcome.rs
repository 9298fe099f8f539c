//! The discriminated result handed back to the conversational front-end.

use serde::Serialize;

use crate::query::{Horizon, Insight, ParseError, Scope, ValidationError};

/// Why a query was refused without touching any feed data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum RejectReason {
  Parse(ParseError),
  Validation(ValidationError),
  /// Both parts are valid on their own, but no feed carries this pairing.
  UnsupportedCombination { insight: Insight, horizon: Horizon },
}

impl std::fmt::Display for RejectReason {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Parse(e) => write!(f, "{e}"),
      Self::Validation(e) => write!(f, "{e}"),
      Self::UnsupportedCombination { insight, horizon } => {
        write!(f, "{insight} is not available as a {horizon}")
      }
    }
  }
}

/// The answer to one query, as seen by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum QueryOutcome {
  Scalar {
    value:   u64,
    insight: Insight,
    scope:   Scope,
  },
  Series {
    /// Identifier or path returned by the chart renderer.
    artifact_ref: String,
    insight:      Insight,
    scope:        Scope,
    points:       usize,
  },
  /// The scope passed validation but is absent from the table that was read.
  NotFound { insight: Insight, scope: Scope },
  Rejected { reason: RejectReason },
  Unavailable { reason: String },
}

impl QueryOutcome {
  pub fn rejected(reason: RejectReason) -> Self { Self::Rejected { reason } }

  pub fn unavailable(reason: impl ToString) -> Self {
    Self::Unavailable { reason: reason.to_string() }
  }

  /// `true` only when a figure or chart was produced.
  pub fn is_success(&self) -> bool {
    matches!(self, Self::Scalar { .. } | Self::Series { .. })
  }

  /// A short reply suitable for a chat message.
  pub fn describe(&self) -> String {
    match self {
      Self::Scalar { value, insight, scope } => format!(
        "There were {} {insight} so far today {}",
        group_thousands(*value),
        scope_phrase(scope)
      ),
      Self::Series { artifact_ref, insight, scope, .. } => {
        format!("Graph of {insight} {}: {artifact_ref}", scope_phrase(scope))
      }
      Self::NotFound { insight, scope } => format!(
        "No {insight} figure {} in today's table",
        scope_phrase(scope)
      ),
      Self::Rejected { reason } => format!("Message not understood: {reason}"),
      Self::Unavailable { reason } => {
        format!("Could not get the requested information: {reason}")
      }
    }
  }
}

fn scope_phrase(scope: &Scope) -> String {
  match scope {
    Scope::Worldwide => "worldwide".to_owned(),
    Scope::Country(name) => format!("in {name}"),
  }
}

fn group_thousands(n: u64) -> String {
  let digits = n.to_string();
  let mut out = String::with_capacity(digits.len() + digits.len() / 3);
  for (i, c) in digits.chars().enumerate() {
    if i > 0 && (digits.len() - i) % 3 == 0 {
      out.push(',');
    }
    out.push(c);
  }
  out
}
