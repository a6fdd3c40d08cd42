//! Cost-data source trait
//!
//! This module defines the `CostDataSource` trait that provider crates
//! implement, and the `CostQuery` handed to it. Aggregators never talk to a
//! source directly; the caller fetches raw records first and then picks the
//! aggregation for the requested view.

use crate::error::Result;
use crate::types::{CostFilter, DailyDate, GroupDefinition, RawPeriodRecord};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// What to fetch from a cost-data source
///
/// `start` is inclusive and `end` exclusive, matching the billing API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostQuery {
    pub start: DailyDate,
    pub end: DailyDate,
    /// Metric names to report; empty means everything the source has
    pub metrics: Vec<String>,
    pub group_by: Option<GroupDefinition>,
    pub filter: Option<CostFilter>,
}

impl CostQuery {
    /// Daily, ungrouped, unfiltered query
    pub fn new(start: DailyDate, end: DailyDate) -> Self {
        Self {
            start,
            end,
            metrics: Vec::new(),
            group_by: None,
            filter: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Vec<String>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_group_by(mut self, group_by: GroupDefinition) -> Self {
        self.group_by = Some(group_by);
        self
    }

    pub fn with_filter(mut self, filter: CostFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Whether a period starting on `date` falls inside the window
    pub fn covers(&self, date: DailyDate) -> bool {
        self.start <= date && date < self.end
    }
}

/// Trait for billing data providers.
///
/// Implementations return periods in chronological order. Failures are
/// reported as-is; retries and backoff are the implementation's business.
#[async_trait]
pub trait CostDataSource: Send + Sync {
    /// Fetch the raw daily records matching `query`
    async fn fetch(&self, query: &CostQuery) -> Result<Vec<RawPeriodRecord>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::day;
    use crate::types::DIMENSION_SERVICE;

    #[test]
    fn test_query_window_is_half_open() {
        let query = CostQuery::new(day(1), day(3));
        assert!(query.covers(day(1)));
        assert!(query.covers(day(2)));
        assert!(!query.covers(day(3)));
        assert!(!query.covers(day(0)));
    }

    #[test]
    fn test_query_builder() {
        let query = CostQuery::new(day(1), day(31))
            .with_metrics(vec!["UnblendedCost".to_string()])
            .with_group_by(GroupDefinition::dimension(DIMENSION_SERVICE));
        assert_eq!(query.metrics.len(), 1);
        assert_eq!(query.group_by.unwrap().key, "SERVICE");
        assert!(query.filter.is_none());
    }

    struct StaticSource(Vec<RawPeriodRecord>);

    #[async_trait]
    impl CostDataSource for StaticSource {
        async fn fetch(&self, query: &CostQuery) -> Result<Vec<RawPeriodRecord>> {
            Ok(self
                .0
                .iter()
                .filter(|p| query.covers(p.start()))
                .cloned()
                .collect())
        }
    }

    #[test]
    fn test_source_is_object_safe() {
        let source: Box<dyn CostDataSource> = Box::new(StaticSource(vec![
            RawPeriodRecord::new(day(1)),
            RawPeriodRecord::new(day(5)),
        ]));
        let periods =
            tokio_test::block_on(source.fetch(&CostQuery::new(day(1), day(2)))).unwrap();
        assert_eq!(periods.len(), 1);
    }
}
