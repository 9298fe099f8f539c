//! Semantic checks of a parsed query against the loaded reference data.

use covstat_core::{
  query::{Query, Scope, ValidationError},
  reference::ReferenceSet,
};

/// Check `query` against `reference`, in the order insight → horizon →
/// scope, and report the first violation.
///
/// Scope comes last: it is the only check that consults the country set.
pub fn validate(query: &Query, reference: &ReferenceSet) -> Result<(), ValidationError> {
  if !reference.has_insight(query.insight) {
    return Err(ValidationError::UnknownInsight(query.insight.phrase().to_owned()));
  }

  if !reference.has_horizon(query.horizon) {
    return Err(ValidationError::UnknownHorizon(query.horizon.token().to_owned()));
  }

  match &query.scope {
    Scope::Worldwide => Ok(()),
    Scope::Country(name) if reference.has_country(name) => Ok(()),
    Scope::Country(name) => Err(ValidationError::UnknownScope(name.clone())),
  }
}
