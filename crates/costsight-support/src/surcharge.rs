//! Support surcharge calculation
//!
//! The surcharge is charged once per query window. It is derived from the
//! window's summed net amortized cost using the profile's brackets, each
//! bracket taxing only the part of the total that falls inside it.
//!
//! # Examples
//!
//! ```
//! use costsight_support::{SupportProfiles, surcharge::surcharge_for_total};
//!
//! let profiles = SupportProfiles::aws_defaults();
//! let business = profiles.get("BUSINESS").unwrap();
//!
//! // 10% of the first 10k plus 7% of the next 40k
//! assert!((surcharge_for_total(business, 50_000.0) - 3_800.0).abs() < 1e-9);
//! // The minimum applies below 1k of spend
//! assert_eq!(surcharge_for_total(business, 500.0), 100.0);
//! ```

use crate::profiles::SupportAccountProfile;
use costsight_core::types::{RawPeriodRecord, parse_amount};
use tracing::{debug, warn};

/// Metric summed to obtain the surcharge base
pub const DEFAULT_SURCHARGE_METRIC: &str = "NetAmortizedCost";

/// Computes the support surcharge for a window of periods
#[derive(Debug, Clone)]
pub struct SurchargeCalculator {
    profile: SupportAccountProfile,
    metric: String,
}

impl SurchargeCalculator {
    /// Create a calculator summing [`DEFAULT_SURCHARGE_METRIC`]
    pub fn new(profile: SupportAccountProfile) -> Self {
        Self {
            profile,
            metric: DEFAULT_SURCHARGE_METRIC.to_string(),
        }
    }

    /// Sum a different metric instead
    pub fn with_metric(mut self, metric: impl Into<String>) -> Self {
        self.metric = metric.into();
        self
    }

    pub fn profile(&self) -> &SupportAccountProfile {
        &self.profile
    }

    pub fn metric(&self) -> &str {
        &self.metric
    }

    /// Surcharge for the whole window
    pub fn compute(&self, periods: &[RawPeriodRecord]) -> f64 {
        compute_surcharge(&self.profile, periods, &self.metric)
    }
}

/// Sum `metric` over all periods and apply the profile's brackets
///
/// Missing or malformed amounts count as zero.
pub fn compute_surcharge(
    profile: &SupportAccountProfile,
    periods: &[RawPeriodRecord],
    metric: &str,
) -> f64 {
    let total: f64 = periods
        .iter()
        .map(|period| match period.metric_amount(metric) {
            Some(raw) => parse_amount(raw).unwrap_or_else(|e| {
                warn!("Ignoring {} on {}: {}", metric, period.start(), e);
                0.0
            }),
            None => {
                debug!("No {} reported on {}", metric, period.start());
                0.0
            }
        })
        .sum();

    let surcharge = surcharge_for_total(profile, total);
    debug!(
        "Support surcharge ${:.2} on ${:.2} total ({})",
        surcharge, total, profile.account_type
    );
    surcharge
}

/// Apply the profile's minimum and brackets to a total
pub fn surcharge_for_total(profile: &SupportAccountProfile, total: f64) -> f64 {
    let Some(first) = profile.tiers.first() else {
        warn!(
            "Support profile {} has no brackets, charging nothing",
            profile.account_type
        );
        return 0.0;
    };

    if total * first.rate < profile.minimum {
        return profile.minimum;
    }

    let mut surcharge = 0.0;
    for tier in &profile.tiers {
        if total < tier.lower_bound {
            return surcharge;
        }
        if tier.is_unbounded() || total < tier.upper_bound {
            return surcharge + (total - tier.lower_bound) * tier.rate;
        }
        surcharge += (tier.upper_bound - tier.lower_bound) * tier.rate;
    }

    // Ran past the last bracket without an open-ended one
    warn!(
        "Total ${:.2} exceeds every bracket of support profile {}",
        total, profile.account_type
    );
    surcharge
}
