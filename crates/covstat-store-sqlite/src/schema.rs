//! SQL schema for the covstat SQLite store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! layout so later migrations can be gated on it.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- The whole historical feed. Replaced wholesale on every refresh.
CREATE TABLE IF NOT EXISTS daily_records (
    country      TEXT    NOT NULL,   -- display form, as the feed spells it
    country_key  TEXT    NOT NULL,   -- folded form used for lookups
    date         TEXT    NOT NULL,   -- YYYY-MM-DD
    new_cases    INTEGER NOT NULL,
    new_deaths   INTEGER NOT NULL,
    total_cases  INTEGER NOT NULL,
    total_deaths INTEGER NOT NULL,
    PRIMARY KEY (country_key, date)
);

-- One row per date on which the feed was successfully refreshed.
-- Append-only: rows are never updated or deleted.
CREATE TABLE IF NOT EXISTS fetch_log (
    date TEXT PRIMARY KEY            -- YYYY-MM-DD
);

PRAGMA user_version = 1;
";
