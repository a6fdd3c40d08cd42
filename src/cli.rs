//! CLI interface for costsight
//!
//! This module defines the command-line interface using clap. Every global
//! option can also be set through a `COSTSIGHT_*` environment variable.
//!
//! # Example
//!
//! ```bash
//! # Daily cost for two 30-day periods ending on 2021-09-01
//! costsight daily --intervals R2/P30D/2021-09-01
//!
//! # Same, including the Business support surcharge, as JSON
//! costsight --support-cost --account-type BUSINESS --json daily --intervals R2/P30D/2021-09-01
//!
//! # Month-over-month comparison of EC2 broken down by the Product tag
//! costsight product EC2 --intervals R2/P1M/2021-09-01
//! ```

use crate::aggregation::{AggregationSettings, DEFAULT_COST_METRIC};
use crate::config::{DEFAULT_PRODUCT_TAG, InsightsConfig, ServiceCatalog};
use clap::{Parser, Subcommand};
use costsight_core::error::{CostsightError, Result};
use costsight_core::intervals::RepeatingInterval;
use costsight_support::{DEFAULT_SURCHARGE_METRIC, SupportProfiles};
use std::path::PathBuf;
use std::time::Duration;

/// Aggregate cloud billing exports into cost insights
#[derive(Parser, Debug, Clone)]
#[command(name = "costsight")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Show informational output (default is quiet mode with only warnings and errors)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Output as JSON
    #[arg(long, global = true, env = "COSTSIGHT_JSON")]
    pub json: bool,

    /// Directory holding saved Cost Explorer responses
    #[arg(long, global = true, env = "COSTSIGHT_DATA_PATH")]
    pub data_path: Option<PathBuf>,

    /// Cost metric to aggregate
    #[arg(long, global = true, env = "COSTSIGHT_METRIC", default_value = DEFAULT_COST_METRIC)]
    pub metric: String,

    /// Blend the support surcharge into daily costs
    #[arg(long, global = true, env = "COSTSIGHT_SUPPORT_COST", requires = "account_type")]
    pub support_cost: bool,

    /// Support plan the surcharge is computed for (e.g. BUSINESS)
    #[arg(long, global = true, env = "COSTSIGHT_ACCOUNT_TYPE")]
    pub account_type: Option<String>,

    /// Metric the support surcharge is based on
    #[arg(long, global = true, env = "COSTSIGHT_SURCHARGE_METRIC", default_value = DEFAULT_SURCHARGE_METRIC)]
    pub surcharge_metric: String,

    /// JSON file replacing the built-in support profiles
    #[arg(long, global = true, env = "COSTSIGHT_PROFILES")]
    pub profiles: Option<PathBuf>,

    /// JSON file replacing the built-in product to service mapping
    #[arg(long, global = true, env = "COSTSIGHT_SERVICES")]
    pub services: Option<PathBuf>,

    /// Cost allocation tag product insights are grouped by
    #[arg(long, global = true, env = "COSTSIGHT_PRODUCT_TAG", default_value = DEFAULT_PRODUCT_TAG)]
    pub product_tag: String,

    /// Round amounts to whole units
    #[arg(long, global = true, env = "COSTSIGHT_ROUND")]
    pub round: bool,

    /// Give up on a data-source call after this many seconds
    #[arg(long, global = true, env = "COSTSIGHT_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Daily cost of a group, broken down by product and project
    Daily {
        /// ISO 8601 repeating interval, e.g. R2/P30D/2021-09-01
        #[arg(long, value_parser = parse_intervals)]
        intervals: String,

        /// Group identifier to report under
        #[arg(long, default_value = "default-group")]
        group: String,
    },
    /// Daily cost of a project, broken down by product
    Project {
        /// Project (billing account) identifier
        project: String,

        /// ISO 8601 repeating interval, e.g. R2/P30D/2021-09-01
        #[arg(long, value_parser = parse_intervals)]
        intervals: String,
    },
    /// Compare a product's cost between the two halves of the window
    Product {
        /// Short product name, e.g. EC2 or S3
        product: String,

        /// ISO 8601 repeating interval, e.g. R2/P1M/2021-09-01
        #[arg(long, value_parser = parse_intervals)]
        intervals: String,
    },
    /// Show the last day with complete billing data
    BillingDate,
    /// List the support profiles in use
    Profiles,
}

/// Validate an interval argument without consuming it
pub fn parse_intervals(s: &str) -> Result<String> {
    RepeatingInterval::parse(s)?;
    Ok(s.trim().to_string())
}

impl Cli {
    /// Support profiles from `--profiles`, or the built-in table
    pub fn support_profiles(&self) -> Result<SupportProfiles> {
        match &self.profiles {
            Some(path) => SupportProfiles::load(path),
            None => Ok(SupportProfiles::aws_defaults()),
        }
    }

    /// Service catalog from `--services`, or the built-in table
    pub fn service_catalog(&self) -> Result<ServiceCatalog> {
        match &self.services {
            Some(path) => ServiceCatalog::load(path),
            None => Ok(ServiceCatalog::aws_defaults()),
        }
    }

    /// Assemble the insights configuration from the parsed flags
    pub fn insights_config(&self) -> Result<InsightsConfig> {
        if self.metric.trim().is_empty() {
            return Err(CostsightError::InvalidArgument(
                "--metric must not be empty".to_string(),
            ));
        }
        if self.timeout == Some(0) {
            return Err(CostsightError::InvalidArgument(
                "--timeout must be at least one second".to_string(),
            ));
        }

        Ok(InsightsConfig {
            aggregation: AggregationSettings {
                cost_metric: self.metric.clone(),
                round_amounts: self.round,
            },
            support_account_type: self
                .account_type
                .clone()
                .filter(|_| self.support_cost),
            surcharge_metric: self.surcharge_metric.clone(),
            support_profiles: self.support_profiles()?,
            service_catalog: self.service_catalog()?,
            product_tag: self.product_tag.clone(),
            fetch_timeout: self.timeout.map(Duration::from_secs),
        })
    }
}
