//! Core types, traits, and utilities for costsight
//!
//! This crate provides the raw billing record types, error handling, the
//! cost-data source trait, group key indexing, interval parsing and the
//! change/trendline statistics used by all other costsight crates.

pub mod aggregation_types;
pub mod change;
pub mod error;
pub mod intervals;
pub mod key_index;
pub mod provider;
pub mod types;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types
pub use error::{CostsightError, Result};
pub use types::{DailyDate, RawGroup, RawPeriodRecord};
