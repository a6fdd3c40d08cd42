//! Aggregation data types for costsight
//!
//! Pure data structures produced by the aggregators. Field names serialize
//! in camelCase, the shape a Cost Insights front end consumes.

use crate::types::DailyDate;
use serde::{Deserialize, Serialize};

/// One point of a cost series
///
/// Aggregators only emit points with a strictly positive amount.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DateAggregation {
    pub date: DailyDate,
    pub amount: f64,
}

/// Cost series for one group key (a service, an account, a tag value)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyedCostSeries {
    /// The raw group key as reported by the data source
    pub id: String,
    pub aggregation: Vec<DateAggregation>,
}

/// Difference between a later and an earlier total
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeStatistic {
    /// Relative change; absent when the earlier total is zero
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratio: Option<f64>,
    /// Absolute change
    pub amount: f64,
}

/// Least-squares line through a cost series
///
/// `x` is seconds since the Unix epoch, so the slope is cost per second.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Trendline {
    pub slope: f64,
    pub intercept: f64,
}

/// Before/after totals of one group key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityAggregation {
    pub id: String,
    /// `[before, after]`
    pub aggregation: [f64; 2],
    pub change: ChangeStatistic,
}

/// Result of the two-period split over a grouped dataset
///
/// `entities` keeps key-index order and only holds keys with cost in at
/// least one bucket. `aggregation` is their elementwise sum.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntitySplit {
    pub aggregation: [f64; 2],
    pub change: ChangeStatistic,
    pub entities: Vec<EntityAggregation>,
}

impl EntitySplit {
    /// Look up a group key
    pub fn get(&self, id: &str) -> Option<&EntityAggregation> {
        self.entities.iter().find(|e| e.id == id)
    }

    /// Attach an identifier, producing the product insights entity
    pub fn into_entity(self, id: impl Into<String>) -> Entity {
        Entity {
            id: id.into(),
            aggregation: self.aggregation,
            change: self.change,
            entities: self.entities,
        }
    }
}

/// Product insights: totals for a product plus the per-entity breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub aggregation: [f64; 2],
    pub change: ChangeStatistic,
    pub entities: Vec<EntityAggregation>,
}

/// Optional breakdowns attached to a daily cost
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupedCosts {
    /// Daily cost per cloud product (service)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub product: Vec<KeyedCostSeries>,
    /// Daily cost per billing account / project
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub project: Vec<KeyedCostSeries>,
}

/// Daily cost of a group or project over an interval window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cost {
    pub id: String,
    /// Always `"number"`; amounts carry no currency
    pub format: String,
    pub aggregation: Vec<DateAggregation>,
    pub change: ChangeStatistic,
    pub trendline: Trendline,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grouped_costs: Option<GroupedCosts>,
}

/// Totals over a cost series
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub total_cost: f64,
    pub days: usize,
}

impl Totals {
    pub fn from_series(series: &[DateAggregation]) -> Self {
        let mut totals = Self::default();
        for point in series {
            totals.total_cost += point.amount;
            totals.days += 1;
        }
        totals
    }
}
