//! Core domain model for ruedas.
//!
//! This crate defines the search-facing data model (queries, extracted
//! parameters, vehicle records, suggestion sets), the static bilingual
//! vocabulary tables used for deterministic matching, and the SQLite
//! inventory schema with bound-parameter filter predicates.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod error;
pub mod model;
pub mod schema;
pub mod vocab;

pub use error::{Error, Result};
