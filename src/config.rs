//! Configuration for cost insights
//!
//! Two lookup tables are injected rather than hard-coded: the service
//! catalog mapping short product names to Cost Explorer service names, and
//! the support profiles (see [`costsight_support::SupportProfiles`]). Both
//! ship with built-in defaults and can be replaced from JSON files.

use crate::aggregation::AggregationSettings;
use costsight_core::error::{CostsightError, Result};
use costsight_support::{DEFAULT_SURCHARGE_METRIC, SupportProfiles, SurchargeCalculator};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Cost allocation tag products are broken down by
pub const DEFAULT_PRODUCT_TAG: &str = "Product";

/// Short product name to Cost Explorer `SERVICE` value
///
/// # Examples
/// ```
/// use costsight::config::ServiceCatalog;
///
/// let catalog = ServiceCatalog::aws_defaults();
/// assert_eq!(
///     catalog.resolve("EC2").unwrap(),
///     "Amazon Elastic Compute Cloud - Compute"
/// );
/// assert!(catalog.resolve("Mainframe").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceCatalog {
    services: BTreeMap<String, String>,
}

impl Default for ServiceCatalog {
    fn default() -> Self {
        Self::aws_defaults()
    }
}

impl ServiceCatalog {
    pub fn new(services: BTreeMap<String, String>) -> Self {
        Self { services }
    }

    pub fn aws_defaults() -> Self {
        let services = [
            ("EC2", "Amazon Elastic Compute Cloud - Compute"),
            ("EC2Other", "EC2 - Other"),
            ("S3", "Amazon Simple Storage Service"),
            ("DynamoDB", "Amazon DynamoDB"),
            ("ElasticSearch", "Amazon Elasticsearch Service"),
            ("CloudWatch", "Amazon CloudWatch"),
            ("CloudTrail", "AWS CloudTrail"),
            ("RDS", "Amazon Relational Database Service"),
            ("ELB", "Amazon Elastic Load Balancing"),
            ("EMR", "Amazon Elastic MapReduce"),
            ("MSK", "Amazon Managed Streaming for Apache Kafka"),
            ("Lambda", "AWS Lambda"),
            ("SNS", "Amazon Simple Notification Service"),
            ("SQS", "Amazon Simple Queue Service"),
        ]
        .into_iter()
        .map(|(short, full)| (short.to_string(), full.to_string()))
        .collect();
        Self { services }
    }

    /// Parse a JSON object of `{"EC2": "Amazon Elastic Compute Cloud - Compute"}`
    pub fn from_json(json: &str) -> Result<Self> {
        let catalog: Self = serde_json::from_str(json)?;
        if catalog.services.is_empty() {
            return Err(CostsightError::Config("service catalog is empty".to_string()));
        }
        Ok(catalog)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let catalog = Self::from_json(&json).map_err(|e| CostsightError::Parse {
            file: path.to_path_buf(),
            error: e.to_string(),
        })?;
        debug!(
            "Loaded {} services from {}",
            catalog.services.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Full service name of a product
    pub fn resolve(&self, product: &str) -> Result<&str> {
        self.services
            .get(product)
            .map(String::as_str)
            .ok_or_else(|| CostsightError::UnknownProduct(product.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.services
            .iter()
            .map(|(short, full)| (short.as_str(), full.as_str()))
    }
}

/// Settings of the insights service
#[derive(Debug, Clone)]
pub struct InsightsConfig {
    /// How amounts are read
    pub aggregation: AggregationSettings,
    /// Support plan to blend into daily costs, if any
    pub support_account_type: Option<String>,
    /// Metric the support surcharge is based on
    pub surcharge_metric: String,
    pub support_profiles: SupportProfiles,
    pub service_catalog: ServiceCatalog,
    /// Tag the product insights are grouped by
    pub product_tag: String,
    /// Limit on every data-source call
    pub fetch_timeout: Option<Duration>,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            aggregation: AggregationSettings::default(),
            support_account_type: None,
            surcharge_metric: DEFAULT_SURCHARGE_METRIC.to_string(),
            support_profiles: SupportProfiles::aws_defaults(),
            service_catalog: ServiceCatalog::aws_defaults(),
            product_tag: DEFAULT_PRODUCT_TAG.to_string(),
            fetch_timeout: None,
        }
    }
}

impl InsightsConfig {
    /// Surcharge calculator for the configured support plan
    ///
    /// # Errors
    ///
    /// Returns `UnknownAccountType` if the plan is not among the profiles
    pub fn surcharge_calculator(&self) -> Result<Option<SurchargeCalculator>> {
        let Some(account_type) = &self.support_account_type else {
            return Ok(None);
        };
        let profile = self.support_profiles.get(account_type)?.clone();
        Ok(Some(
            SurchargeCalculator::new(profile).with_metric(self.surcharge_metric.clone()),
        ))
    }

    /// Metrics every query needs: the cost metric, plus the surcharge base
    pub fn query_metrics(&self) -> Vec<String> {
        let mut metrics = vec![self.aggregation.cost_metric.clone()];
        if self.support_account_type.is_some()
            && self.surcharge_metric != self.aggregation.cost_metric
        {
            metrics.push(self.surcharge_metric.clone());
        }
        metrics
    }
}
