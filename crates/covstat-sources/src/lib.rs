//! Upstream feed adapters for covstat.
//!
//! Each adapter fetches a raw table from its upstream and normalises it into
//! the canonical records of [`covstat_core::record`]:
//!
//! - [`ecdc::EcdcSource`]: the cumulative historical case distribution.
//! - [`worldometer::WorldometerSource`]: the live "today" table.
//!
//! Normalisation is exposed separately from fetching so it can be exercised
//! against captured payloads.

pub mod ecdc;
mod http;
pub mod table;
pub mod worldometer;

pub use ecdc::EcdcSource;
pub use table::RawTable;
pub use worldometer::WorldometerSource;
