//! Error types for costsight
//!
//! This module defines the error types used throughout the costsight crates.
//! All errors are derived from `thiserror` for convenient error handling
//! and automatic `From` implementations.
//!
//! # Example
//!
//! ```
//! use costsight_core::error::{CostsightError, Result};
//!
//! fn example_function() -> Result<()> {
//!     // This will automatically convert io::Error to CostsightError
//!     let _file = std::fs::read_to_string("nonexistent.json")?;
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main error type for costsight operations
///
/// Aggregation itself is total over well-formed input; most variants
/// describe failures at the edges (configuration, interval parsing and the
/// cost-data source).
#[derive(Error, Debug)]
pub enum CostsightError {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// No billing export directory found
    #[error("No billing export directory found")]
    NoDataDirectory,

    /// Parse error with file context
    #[error("Parse error in {file}: {error}")]
    Parse {
        /// The file that caused the error
        file: PathBuf,
        /// The error message
        error: String,
    },

    /// A metric amount could not be read as a decimal number
    #[error("Malformed amount: {0:?}")]
    MalformedAmount(String),

    /// Invalid date format
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    /// Invalid ISO 8601 repeating interval
    #[error("Invalid interval: {0}")]
    InvalidInterval(String),

    /// Support account tier missing from the configured profiles
    #[error("Unknown support account type: {0}")]
    UnknownAccountType(String),

    /// Product name missing from the service catalog
    #[error("Unknown product: {0}")]
    UnknownProduct(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The cost-data source reported a failure
    #[error("Cost data source error: {0}")]
    Upstream(String),

    /// The cost-data source did not answer in time
    #[error("Cost data source timed out after {0:?}")]
    Timeout(Duration),
}

/// Convenience type alias for Results in costsight
///
/// # Example
///
/// ```
/// use costsight_core::Result;
///
/// fn process_data() -> Result<String> {
///     Ok("Processed successfully".to_string())
/// }
/// ```
pub type Result<T> = std::result::Result<T, CostsightError>;
