//! Common test utilities and helpers for costsight tests
//!
//! Builders for raw billing periods and for export directories laid out the
//! way the JSON data source expects them.

#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use costsight::types::{DailyDate, GroupDefinition, RawGroup, RawPeriodRecord};
use serde_json::json;
use tempfile::TempDir;

pub const COST_METRIC: &str = "UnblendedCost";
pub const SURCHARGE_METRIC: &str = "NetAmortizedCost";

/// `n` days after 2020-12-31, so `day(1)` is 2021-01-01
pub fn day(n: i64) -> DailyDate {
    DailyDate::new(NaiveDate::from_ymd_opt(2020, 12, 31).unwrap() + Duration::days(n))
}

/// Builder for a single billing period
pub struct PeriodBuilder {
    record: RawPeriodRecord,
}

impl PeriodBuilder {
    pub fn new(date: DailyDate) -> Self {
        Self {
            record: RawPeriodRecord::new(date),
        }
    }

    pub fn on_day(n: i64) -> Self {
        Self::new(day(n))
    }

    /// Set both the cost and the surcharge base metric
    pub fn with_cost(mut self, amount: f64) -> Self {
        self.record = self
            .record
            .with_total(COST_METRIC, amount.to_string())
            .with_total(SURCHARGE_METRIC, amount.to_string());
        self
    }

    pub fn with_total(mut self, metric: &str, amount: &str) -> Self {
        self.record = self.record.with_total(metric, amount);
        self
    }

    pub fn with_group(mut self, key: &str, amount: f64) -> Self {
        self.record = self
            .record
            .with_group(RawGroup::new(key, COST_METRIC, amount.to_string()));
        self
    }

    pub fn build(self) -> RawPeriodRecord {
        self.record
    }
}

/// Consecutive ungrouped periods starting on `day(1)`
pub fn daily_periods(amounts: &[f64]) -> Vec<RawPeriodRecord> {
    amounts
        .iter()
        .enumerate()
        .map(|(i, amount)| PeriodBuilder::on_day(i as i64 + 1).with_cost(*amount).build())
        .collect()
}

/// Consecutive grouped periods starting on `day(1)`
pub fn grouped_periods(days: &[&[(&str, f64)]]) -> Vec<RawPeriodRecord> {
    days.iter()
        .enumerate()
        .map(|(i, groups)| {
            groups
                .iter()
                .fold(PeriodBuilder::on_day(i as i64 + 1), |builder, (key, amount)| {
                    builder.with_group(key, *amount)
                })
                .build()
        })
        .collect()
}

/// Temporary export directory
pub struct ExportDir {
    pub dir: TempDir,
}

impl ExportDir {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    /// Write one snapshot file
    pub fn write_snapshot(
        &self,
        name: &str,
        group_by: Option<GroupDefinition>,
        filter: Option<serde_json::Value>,
        periods: &[RawPeriodRecord],
    ) {
        let mut snapshot = json!({ "ResultsByTime": periods });
        if let Some(group_by) = group_by {
            snapshot["GroupDefinitions"] = json!([group_by]);
        }
        if let Some(filter) = filter {
            snapshot["Filter"] = filter;
        }
        std::fs::write(
            self.dir.path().join(name),
            serde_json::to_string_pretty(&snapshot).unwrap(),
        )
        .unwrap();
    }

    pub fn path(&self) -> &std::path::Path {
        self.dir.path()
    }
}
