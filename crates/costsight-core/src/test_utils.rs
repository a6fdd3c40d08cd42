//! Shared test utilities for unit tests
//!
//! Integration tests cannot reach this module because it is compiled only
//! under `#[cfg(test)]`; they keep their own builders in
//! `tests/common/mod.rs`.

use crate::types::{DailyDate, RawGroup, RawPeriodRecord};
use chrono::{Duration, NaiveDate};

/// Metric used by all fixtures
pub const TEST_METRIC: &str = "UnblendedCost";

/// `n` days after 2020-12-31, so `day(1)` is 2021-01-01
pub fn day(n: i64) -> DailyDate {
    let base = NaiveDate::from_ymd_opt(2020, 12, 31).unwrap();
    DailyDate::new(base + Duration::days(n))
}

/// Grouped period with one group per `(key, amount)` pair
pub fn grouped_period(date: DailyDate, groups: &[(&str, &str)]) -> RawPeriodRecord {
    groups
        .iter()
        .fold(RawPeriodRecord::new(date), |record, (key, amount)| {
            record.with_group(RawGroup::new(*key, TEST_METRIC, *amount))
        })
}
