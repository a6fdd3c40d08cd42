//! Change and trendline statistics over cost series

use crate::aggregation_types::{ChangeStatistic, DateAggregation, Trendline};

/// Change from `before` to `after`
///
/// # Examples
/// ```
/// use costsight_core::change::change_of_pair;
///
/// let change = change_of_pair([100.0, 150.0]);
/// assert_eq!(change.amount, 50.0);
/// assert_eq!(change.ratio, Some(0.5));
///
/// assert_eq!(change_of_pair([0.0, 20.0]).ratio, None);
/// ```
pub fn change_of_pair([before, after]: [f64; 2]) -> ChangeStatistic {
    let amount = after - before;
    let ratio = if before == 0.0 {
        None
    } else {
        Some(amount / before)
    };
    ChangeStatistic { ratio, amount }
}

/// Split a series at `len / 2` and compare the summed halves
///
/// An odd-length series puts its middle point in the later half, the same
/// split the entity aggregator applies to periods.
pub fn change_of(series: &[DateAggregation]) -> ChangeStatistic {
    let midpoint = series.len() / 2;
    let (before, after) = series.split_at(midpoint);
    change_of_pair([sum(before), sum(after)])
}

/// Least-squares fit of `amount` against the date in Unix seconds
///
/// Series with fewer than two distinct dates get a flat line at the mean.
pub fn trendline_of(series: &[DateAggregation]) -> Trendline {
    if series.is_empty() {
        return Trendline::default();
    }

    let n = series.len() as f64;
    let mean_x = series
        .iter()
        .map(|p| p.date.unix_seconds() as f64)
        .sum::<f64>()
        / n;
    let mean_y = sum(series) / n;

    let mut covariance = 0.0;
    let mut variance = 0.0;
    for point in series {
        let dx = point.date.unix_seconds() as f64 - mean_x;
        covariance += dx * (point.amount - mean_y);
        variance += dx * dx;
    }

    if variance == 0.0 {
        return Trendline {
            slope: 0.0,
            intercept: mean_y,
        };
    }

    let slope = covariance / variance;
    Trendline {
        slope,
        intercept: mean_y - slope * mean_x,
    }
}

fn sum(series: &[DateAggregation]) -> f64 {
    series.iter().map(|p| p.amount).sum()
}
