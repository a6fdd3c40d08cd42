//! Saved Cost Explorer responses as a costsight data source
//!
//! This crate implements the cost-data source trait over a directory of
//! `GetCostAndUsage` responses exported as JSON, handling file discovery,
//! parsing and query matching.

pub mod data_loader;

#[cfg(test)]
pub mod test_utils;

pub use data_loader::DataLoader;
