//! Query parsing, validation and series aggregation for covstat.
//!
//! Pure synchronous code; no HTTP, database or clock access. Everything here
//! can be abandoned mid-way without side effects.
//!
//! # Quick start
//!
//! ```no_run
//! use covstat_core::reference::ReferenceSet;
//! use covstat_query::{parse, validate};
//!
//! let query = parse("new cases china today").unwrap();
//! let reference = ReferenceSet::new(["China"]);
//! validate(&query, &reference).unwrap();
//! ```

pub mod aggregate;
mod parse;
mod validate;

pub use parse::{MIN_TOKENS, parse};
pub use validate::validate;
