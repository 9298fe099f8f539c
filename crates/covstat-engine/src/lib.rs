//! The covstat Insight Query Engine.
//!
//! [`Engine`] turns a short text such as `"new cases italy graph"` into a
//! [`QueryOutcome`](covstat_core::outcome::QueryOutcome). It owns a
//! [`FreshnessTracker`] that keeps the historical cache at most one refresh
//! behind, and a [`Resolver`] that answers from either feed. Collaborators are
//! supplied through the [`Backend`] trait so the engine never names a concrete
//! store, feed or renderer.

mod engine;
mod freshness;
mod resolver;

pub mod error;

pub use engine::{Backend, Engine};
pub use error::{DataUnavailable, ResolveError};
pub use freshness::{FetchTarget, FreshnessConfig, FreshnessTracker};
pub use resolver::{Resolution, Resolver, ScalarResult};

#[cfg(test)]
mod testing;
