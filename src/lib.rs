//! costsight - Cost insights from cloud billing data
//!
//! This library provides functionality to:
//! - Read saved Cost Explorer responses from a local directory
//! - Aggregate daily billing periods into cost series, per-group breakdowns
//!   and two-period comparisons
//! - Blend a tiered support surcharge into daily costs
//! - Generate reports in table and JSON formats
//!
//! # Examples
//!
//! ```no_run
//! use costsight::{config::InsightsConfig, insights::CostInsights};
//! use costsight_provider_json::DataLoader;
//!
//! #[tokio::main]
//! async fn main() -> costsight::Result<()> {
//!     let loader = DataLoader::from_path("/var/lib/costsight/exports");
//!     let insights = CostInsights::new(loader, InsightsConfig::default())?;
//!
//!     let entity = insights.product_insights("EC2", "R2/P1M/2021-09-01").await?;
//!     println!("{:?}", entity.change);
//!     Ok(())
//! }
//! ```

pub mod aggregation;
pub mod cli;
pub mod config;
pub mod insights;
pub mod output;

// Re-export core modules
pub use costsight_core::{aggregation_types, change, error, intervals, key_index, provider, types};

pub use error::{CostsightError, Result};
pub use types::{DailyDate, RawGroup, RawPeriodRecord};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
