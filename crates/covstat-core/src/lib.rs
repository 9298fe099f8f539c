//! Domain types and collaborator traits for the covstat insight engine.
//!
//! Queries, canonical feed records, outcomes, and the traits every store,
//! feed and renderer implements. No HTTP or database code lives here.

// Public trait methods spell out their `Send` futures explicitly.
#![allow(async_fn_in_trait)]

pub mod country;
pub mod error;
pub mod outcome;
pub mod query;
pub mod record;
pub mod reference;
pub mod source;
pub mod store;

pub use error::{Error, RenderError, Result, SourceError};
