//! Aggregation module for turning raw billing periods into cost series
//!
//! Three views are built from already-fetched [`RawPeriodRecord`]s:
//!
//! - a single date series for the whole window, optionally carrying the
//!   support surcharge spread evenly across its days
//! - one date series per group key (a service, an account)
//! - a two-period comparison per group key, splitting the window in half
//!
//! None of them keep state between calls and none perform I/O, so one
//! [`Aggregator`] can serve concurrent requests.
//!
//! # Examples
//!
//! ```
//! use costsight::aggregation::{AggregationSettings, Aggregator};
//! use costsight::types::{DailyDate, RawGroup, RawPeriodRecord};
//!
//! let periods = vec![
//!     RawPeriodRecord::new(DailyDate::parse("2021-01-01").unwrap())
//!         .with_group(RawGroup::new("EC2", "UnblendedCost", "10")),
//!     RawPeriodRecord::new(DailyDate::parse("2021-01-02").unwrap())
//!         .with_group(RawGroup::new("EC2", "UnblendedCost", "-5")),
//! ];
//!
//! let aggregator = Aggregator::new(AggregationSettings::default());
//! let series = aggregator.aggregate_grouped_series(&periods).unwrap();
//! assert_eq!(series.len(), 1);
//! assert_eq!(series[0].aggregation.len(), 1);
//! assert_eq!(series[0].aggregation[0].amount, 10.0);
//! ```

use costsight_core::aggregation_types::{
    DateAggregation, EntityAggregation, EntitySplit, KeyedCostSeries,
};
use costsight_core::change::change_of_pair;
use costsight_core::error::Result;
use costsight_core::key_index::KeyIndex;
use costsight_core::types::{DailyDate, RawPeriodRecord, parse_amount};
use costsight_support::SurchargeCalculator;
use tracing::{debug, warn};

/// Metric read for every cost amount unless configured otherwise
pub const DEFAULT_COST_METRIC: &str = "UnblendedCost";

/// How amounts are read from raw periods
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationSettings {
    /// Metric name looked up in period totals and group metrics
    pub cost_metric: String,
    /// Round every amount read to whole units
    pub round_amounts: bool,
}

impl Default for AggregationSettings {
    fn default() -> Self {
        Self {
            cost_metric: DEFAULT_COST_METRIC.to_string(),
            round_amounts: false,
        }
    }
}

/// Running before/after totals of one group key
#[derive(Debug, Clone, Copy, Default)]
struct SplitAccumulator {
    buckets: [f64; 2],
}

impl SplitAccumulator {
    fn add(&mut self, bucket: usize, amount: f64) {
        self.buckets[bucket] += amount;
    }

    fn is_empty(&self) -> bool {
        self.buckets == [0.0, 0.0]
    }
}

/// Builds cost series from raw billing periods
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    settings: AggregationSettings,
    surcharge: Option<SurchargeCalculator>,
}

impl Aggregator {
    /// Create an aggregator without a support surcharge
    pub fn new(settings: AggregationSettings) -> Self {
        Self {
            settings,
            surcharge: None,
        }
    }

    /// Blend a support surcharge into the date series
    pub fn with_surcharge(mut self, calculator: SurchargeCalculator) -> Self {
        self.surcharge = Some(calculator);
        self
    }

    pub fn settings(&self) -> &AggregationSettings {
        &self.settings
    }

    pub fn surcharge_enabled(&self) -> bool {
        self.surcharge.is_some()
    }

    /// Daily cost of the whole window
    ///
    /// When a surcharge is configured it is computed once over all periods
    /// and each period receives `surcharge / periods.len()`. Only strictly
    /// positive points are emitted, in input order.
    pub fn aggregate_date_series(
        &self,
        periods: &[RawPeriodRecord],
    ) -> Result<Vec<DateAggregation>> {
        if periods.is_empty() {
            return Ok(Vec::new());
        }

        let surcharge_share = match &self.surcharge {
            Some(calculator) => calculator.compute(periods) / periods.len() as f64,
            None => 0.0,
        };

        let series: Vec<DateAggregation> = periods
            .iter()
            .filter_map(|period| {
                let amount = self.read_amount(
                    period.metric_amount(&self.settings.cost_metric),
                    period.start(),
                    None,
                );
                self.positive_point(period.start(), amount + surcharge_share)
            })
            .collect();

        debug!(
            "Aggregated {} of {} periods (surcharge share ${:.2} per day)",
            series.len(),
            periods.len(),
            surcharge_share
        );
        Ok(series)
    }

    /// Daily cost per group key
    ///
    /// Series follow the order in which keys were first seen; keys without a
    /// single positive amount are left out.
    pub fn aggregate_grouped_series(
        &self,
        periods: &[RawPeriodRecord],
    ) -> Result<Vec<KeyedCostSeries>> {
        let index = KeyIndex::build(periods);
        let mut series: Vec<Vec<DateAggregation>> = vec![Vec::new(); index.len()];

        for period in periods {
            for group in &period.groups {
                let Some(slot) = group.key().and_then(|key| index.slot(key)) else {
                    continue;
                };
                let amount = self.read_amount(
                    group.metric_amount(&self.settings.cost_metric),
                    period.start(),
                    group.key(),
                );
                if let Some(point) = self.positive_point(period.start(), amount) {
                    series[slot].push(point);
                }
            }
        }

        let result: Vec<KeyedCostSeries> = index
            .keys()
            .zip(series)
            .filter(|(_, aggregation)| !aggregation.is_empty())
            .map(|(key, aggregation)| KeyedCostSeries {
                id: key.to_string(),
                aggregation,
            })
            .collect();

        debug!(
            "Grouped {} periods into {} series ({} keys seen)",
            periods.len(),
            result.len(),
            index.len()
        );
        Ok(result)
    }

    /// Before/after totals per group key
    ///
    /// Periods before `len / 2` fall into the first bucket and the rest into
    /// the second, so an odd count leaves the extra period in "after".
    /// Keys whose buckets are both zero are dropped.
    pub fn aggregate_entity_split(&self, periods: &[RawPeriodRecord]) -> Result<EntitySplit> {
        let index = KeyIndex::build(periods);
        let midpoint = periods.len() / 2;
        let mut accumulators = vec![SplitAccumulator::default(); index.len()];

        for (i, period) in periods.iter().enumerate() {
            let bucket = usize::from(i >= midpoint);
            for group in &period.groups {
                let Some(slot) = group.key().and_then(|key| index.slot(key)) else {
                    continue;
                };
                let amount = self.read_amount(
                    group.metric_amount(&self.settings.cost_metric),
                    period.start(),
                    group.key(),
                );
                accumulators[slot].add(bucket, amount);
            }
        }

        let mut split = EntitySplit::default();
        for (key, accumulator) in index.keys().zip(accumulators) {
            if accumulator.is_empty() {
                continue;
            }
            let aggregation = accumulator.buckets;
            split.aggregation[0] += aggregation[0];
            split.aggregation[1] += aggregation[1];
            split.entities.push(EntityAggregation {
                id: key.to_string(),
                aggregation,
                change: change_of_pair(aggregation),
            });
        }
        split.change = change_of_pair(split.aggregation);

        debug!(
            "Split {} periods at {} into {} entities",
            periods.len(),
            midpoint,
            split.entities.len()
        );
        Ok(split)
    }

    /// Parse a raw amount, counting missing or malformed values as zero
    ///
    /// Rounding applies here, before any surcharge share is added.
    fn read_amount(&self, raw: Option<&str>, date: DailyDate, key: Option<&str>) -> f64 {
        let Some(raw) = raw else {
            debug!(
                "No {} on {} for {}",
                self.settings.cost_metric,
                date,
                key.unwrap_or("total")
            );
            return 0.0;
        };
        let amount = parse_amount(raw).unwrap_or_else(|e| {
            warn!(
                "Treating {} on {} for {} as zero: {}",
                self.settings.cost_metric,
                date,
                key.unwrap_or("total"),
                e
            );
            0.0
        });

        if self.settings.round_amounts {
            amount.round()
        } else {
            amount
        }
    }

    fn positive_point(&self, date: DailyDate, amount: f64) -> Option<DateAggregation> {
        (amount > 0.0).then_some(DateAggregation { date, amount })
    }
}
