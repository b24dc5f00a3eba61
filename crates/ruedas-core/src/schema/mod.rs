//! SQLite inventory schema and bound-parameter search.

pub mod db;
pub mod filter;
pub mod functions;
pub mod migrations;

pub use db::Database;
pub use filter::{Column, Predicate, TierPlan};
pub use functions::parse_number;
pub use rusqlite::InterruptHandle;
