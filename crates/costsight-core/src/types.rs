//! Core domain types for costsight
//!
//! This module contains the raw billing records handed over by a cost-data
//! source and the small strongly-typed wrappers used around them. The raw
//! types deserialize straight from the Cost Explorer `ResultsByTime` JSON
//! shape, so a saved `GetCostAndUsage` response can be fed in unchanged.

use crate::error::{CostsightError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::fmt;

/// Cost Explorer dimension for the AWS service name
pub const DIMENSION_SERVICE: &str = "SERVICE";

/// Cost Explorer dimension for the member (linked) account
pub const DIMENSION_LINKED_ACCOUNT: &str = "LINKED_ACCOUNT";

/// Calendar date of a billing period
///
/// # Examples
/// ```
/// use costsight_core::types::DailyDate;
///
/// let daily = DailyDate::parse("2021-09-01").unwrap();
/// assert_eq!(daily.format("%Y-%m-%d"), "2021-09-01");
/// assert_eq!(daily.format("%B %d, %Y"), "September 01, 2021");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DailyDate(NaiveDate);

impl DailyDate {
    /// Create a new DailyDate
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Parse a `YYYY-MM-DD` string
    pub fn parse(s: &str) -> Result<Self> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Self)
            .map_err(|_| CostsightError::InvalidDate(format!("'{s}', expected YYYY-MM-DD")))
    }

    /// Get the inner NaiveDate
    pub fn inner(&self) -> &NaiveDate {
        &self.0
    }

    /// Seconds since the Unix epoch at midnight UTC
    pub fn unix_seconds(&self) -> i64 {
        self.0
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or_default()
    }

    /// Format with a chrono format string
    pub fn format(&self, fmt: &str) -> String {
        self.0.format(fmt).to_string()
    }
}

impl fmt::Display for DailyDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl From<NaiveDate> for DailyDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

/// One labeled metric amount as reported by the data source
///
/// Amounts stay string-encoded until an aggregator reads them; the unit is
/// carried along but never interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetricValue {
    /// Decimal amount, e.g. `"12.3456"`
    pub amount: String,
    /// Currency unit, e.g. `"USD"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl MetricValue {
    pub fn new(amount: impl Into<String>) -> Self {
        Self {
            amount: amount.into(),
            unit: Some("USD".to_string()),
        }
    }
}

/// Metric name to amount
pub type MetricMap = BTreeMap<String, MetricValue>;

/// Start (inclusive) and end (exclusive) of a billing period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TimePeriod {
    pub start: DailyDate,
    pub end: DailyDate,
}

/// A sub-total within a period
///
/// Only the first key is used for grouping; further keys are kept for
/// compound groupings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawGroup {
    #[serde(default)]
    pub keys: SmallVec<[String; 2]>,
    #[serde(default)]
    pub metrics: MetricMap,
}

impl RawGroup {
    /// Create a group with a single key and a single metric
    pub fn new(key: impl Into<String>, metric: &str, amount: impl Into<String>) -> Self {
        let mut metrics = MetricMap::new();
        metrics.insert(metric.to_string(), MetricValue::new(amount));
        Self {
            keys: smallvec::smallvec![key.into()],
            metrics,
        }
    }

    /// The first-level group key
    pub fn key(&self) -> Option<&str> {
        self.keys.first().map(String::as_str)
    }

    /// Raw amount of a metric, if reported
    pub fn metric_amount(&self, metric: &str) -> Option<&str> {
        self.metrics.get(metric).map(|m| m.amount.as_str())
    }
}

/// One billing period as returned by the cost-data source
///
/// # Examples
/// ```
/// use costsight_core::types::RawPeriodRecord;
///
/// let json = r#"{
///     "TimePeriod": {"Start": "2021-01-01", "End": "2021-01-02"},
///     "Total": {"UnblendedCost": {"Amount": "12.5", "Unit": "USD"}},
///     "Groups": [],
///     "Estimated": false
/// }"#;
/// let record: RawPeriodRecord = serde_json::from_str(json).unwrap();
/// assert_eq!(record.start().to_string(), "2021-01-01");
/// assert_eq!(record.metric_amount("UnblendedCost"), Some("12.5"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawPeriodRecord {
    pub time_period: TimePeriod,
    #[serde(default)]
    pub total: MetricMap,
    #[serde(default)]
    pub groups: Vec<RawGroup>,
    #[serde(default)]
    pub estimated: bool,
}

impl RawPeriodRecord {
    /// Create a one-day period with no metrics and no groups
    pub fn new(start: DailyDate) -> Self {
        let end = start
            .inner()
            .succ_opt()
            .map(DailyDate::new)
            .unwrap_or(start);
        Self {
            time_period: TimePeriod { start, end },
            total: MetricMap::new(),
            groups: Vec::new(),
            estimated: false,
        }
    }

    /// Add a metric to the period total
    pub fn with_total(mut self, metric: &str, amount: impl Into<String>) -> Self {
        self.total
            .insert(metric.to_string(), MetricValue::new(amount));
        self
    }

    /// Append a group
    pub fn with_group(mut self, group: RawGroup) -> Self {
        self.groups.push(group);
        self
    }

    /// Period start date
    pub fn start(&self) -> DailyDate {
        self.time_period.start
    }

    /// Raw amount of a total metric, if reported
    pub fn metric_amount(&self, metric: &str) -> Option<&str> {
        self.total.get(metric).map(|m| m.amount.as_str())
    }
}

/// Parse a string-encoded decimal amount
///
/// Non-finite values (`NaN`, `inf`) are rejected alongside unparsable text.
pub fn parse_amount(raw: &str) -> Result<f64> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(CostsightError::MalformedAmount(raw.to_string())),
    }
}

/// Kind of a grouping definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupKind {
    Dimension,
    Tag,
    CostCategory,
}

/// How the data source should split each period into groups
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GroupDefinition {
    #[serde(rename = "Type")]
    pub kind: GroupKind,
    pub key: String,
}

impl GroupDefinition {
    /// Group by a Cost Explorer dimension such as `SERVICE`
    pub fn dimension(key: impl Into<String>) -> Self {
        Self {
            kind: GroupKind::Dimension,
            key: key.into(),
        }
    }

    /// Group by a cost allocation tag
    pub fn tag(key: impl Into<String>) -> Self {
        Self {
            kind: GroupKind::Tag,
            key: key.into(),
        }
    }
}

impl fmt::Display for GroupDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            GroupKind::Dimension => write!(f, "dimension:{}", self.key),
            GroupKind::Tag => write!(f, "tag:{}", self.key),
            GroupKind::CostCategory => write!(f, "cost-category:{}", self.key),
        }
    }
}

/// Values of one dimension to keep
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DimensionValues {
    pub key: String,
    pub values: Vec<String>,
}

/// Restriction applied by the data source before grouping
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CostFilter {
    pub dimensions: DimensionValues,
}

impl CostFilter {
    /// Keep only the given values of a dimension
    pub fn dimension(key: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            dimensions: DimensionValues {
                key: key.into(),
                values,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("12.5").unwrap(), 12.5);
        assert_eq!(parse_amount(" -0.25 ").unwrap(), -0.25);
        assert_eq!(parse_amount("0.0000001").unwrap(), 0.0000001);
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        assert!(matches!(
            parse_amount("abc"),
            Err(CostsightError::MalformedAmount(_))
        ));
        assert!(parse_amount("").is_err());
        assert!(parse_amount("NaN").is_err());
        assert!(parse_amount("inf").is_err());
    }

    #[test]
    fn test_daily_date_parse() {
        let date = DailyDate::parse("2021-02-28").unwrap();
        assert_eq!(date.to_string(), "2021-02-28");
        assert!(DailyDate::parse("2021-02-30").is_err());
        assert!(DailyDate::parse("02/28/2021").is_err());
    }

    #[test]
    fn test_unix_seconds() {
        let date = DailyDate::parse("1970-01-02").unwrap();
        assert_eq!(date.unix_seconds(), 86_400);
    }

    #[test]
    fn test_record_deserializes_groups() {
        let json = r#"{
            "TimePeriod": {"Start": "2021-01-01", "End": "2021-01-02"},
            "Total": {},
            "Groups": [
                {"Keys": ["Amazon Simple Storage Service"],
                 "Metrics": {"UnblendedCost": {"Amount": "3.1", "Unit": "USD"}}},
                {"Keys": ["AWS Lambda", "123456789012"],
                 "Metrics": {"UnblendedCost": {"Amount": "0.2", "Unit": "USD"}}}
            ],
            "Estimated": true
        }"#;
        let record: RawPeriodRecord = serde_json::from_str(json).unwrap();
        assert!(record.estimated);
        assert_eq!(record.groups.len(), 2);
        assert_eq!(record.groups[0].key(), Some("Amazon Simple Storage Service"));
        assert_eq!(record.groups[1].keys.len(), 2);
        assert_eq!(record.groups[1].metric_amount("UnblendedCost"), Some("0.2"));
        assert_eq!(record.groups[1].metric_amount("BlendedCost"), None);
    }

    #[test]
    fn test_group_definition_wire_shape() {
        let json = serde_json::to_string(&GroupDefinition::dimension(DIMENSION_SERVICE)).unwrap();
        assert_eq!(json, r#"{"Type":"DIMENSION","Key":"SERVICE"}"#);

        let tag: GroupDefinition =
            serde_json::from_str(r#"{"Type":"TAG","Key":"Product"}"#).unwrap();
        assert_eq!(tag, GroupDefinition::tag("Product"));
        assert_eq!(tag.to_string(), "tag:Product");
    }

    #[test]
    fn test_new_record_spans_one_day() {
        let record = RawPeriodRecord::new(DailyDate::parse("2021-12-31").unwrap());
        assert_eq!(record.time_period.end.to_string(), "2022-01-01");
    }
}
