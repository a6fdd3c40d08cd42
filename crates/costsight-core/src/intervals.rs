//! ISO 8601 repeating intervals
//!
//! Cost queries describe their window as `R<n>/<duration>/<end date>`, for
//! example `R2/P30D/2021-09-01`: two consecutive 30-day intervals ending on
//! 2021-09-01. Only date-based durations are meaningful for daily billing
//! data, so time components (`PT…`) are rejected.

use crate::error::{CostsightError, Result};
use crate::types::DailyDate;
use chrono::{Days, Months};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Date-based ISO 8601 duration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IsoDuration {
    pub years: u32,
    pub months: u32,
    pub weeks: u32,
    pub days: u32,
}

impl IsoDuration {
    /// Whole months covered by the year and month components
    ///
    /// `None` when the count does not fit in a `u32`.
    pub fn total_months(&self) -> Option<u32> {
        self.years.checked_mul(12)?.checked_add(self.months)
    }

    /// Whole days covered by the week and day components
    ///
    /// `None` when the count does not fit in a `u32`.
    pub fn total_days(&self) -> Option<u32> {
        self.weeks.checked_mul(7)?.checked_add(self.days)
    }

    pub fn is_zero(&self) -> bool {
        self.years == 0 && self.months == 0 && self.weeks == 0 && self.days == 0
    }
}

impl FromStr for IsoDuration {
    type Err = CostsightError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || CostsightError::InvalidInterval(format!("unsupported duration '{s}'"));

        let body = s.strip_prefix('P').ok_or_else(invalid)?;
        if body.is_empty() || body.contains('T') {
            return Err(invalid());
        }

        let mut duration = IsoDuration::default();
        let mut digits = String::new();
        for c in body.chars() {
            if c.is_ascii_digit() {
                digits.push(c);
                continue;
            }
            let value: u32 = digits.parse().map_err(|_| invalid())?;
            digits.clear();
            match c {
                'Y' => duration.years = value,
                'M' => duration.months = value,
                'W' => duration.weeks = value,
                'D' => duration.days = value,
                _ => return Err(invalid()),
            }
        }
        if !digits.is_empty() {
            return Err(invalid());
        }
        if duration.total_months().is_none() || duration.total_days().is_none() {
            return Err(invalid());
        }
        Ok(duration)
    }
}

impl fmt::Display for IsoDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P")?;
        if self.years > 0 {
            write!(f, "{}Y", self.years)?;
        }
        if self.months > 0 {
            write!(f, "{}M", self.months)?;
        }
        if self.weeks > 0 {
            write!(f, "{}W", self.weeks)?;
        }
        if self.days > 0 || self.is_zero() {
            write!(f, "{}D", self.days)?;
        }
        Ok(())
    }
}

/// A parsed `R<n>/<duration>/<end date>` expression
///
/// # Examples
/// ```
/// use costsight_core::intervals::RepeatingInterval;
///
/// let interval = RepeatingInterval::parse("R2/P30D/2021-09-01").unwrap();
/// assert_eq!(interval.repetitions, 2);
/// assert_eq!(interval.end_date.to_string(), "2021-09-01");
/// assert_eq!(interval.inclusive_start_date().unwrap().to_string(), "2021-07-03");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepeatingInterval {
    pub repetitions: u32,
    pub duration: IsoDuration,
    pub end_date: DailyDate,
}

impl RepeatingInterval {
    pub fn parse(spec: &str) -> Result<Self> {
        let parts: Vec<&str> = spec.trim().split('/').collect();
        let [repeat, duration, end] = parts.as_slice() else {
            return Err(CostsightError::InvalidInterval(format!(
                "'{spec}', expected R<n>/<duration>/<YYYY-MM-DD>"
            )));
        };

        let repetitions = repeat
            .strip_prefix('R')
            .and_then(|n| n.parse::<u32>().ok())
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                CostsightError::InvalidInterval(format!("invalid repetition count '{repeat}'"))
            })?;

        let duration: IsoDuration = duration.parse()?;
        if duration.is_zero() {
            return Err(CostsightError::InvalidInterval(format!(
                "zero-length duration in '{spec}'"
            )));
        }

        let end_date = DailyDate::parse(end)
            .map_err(|_| CostsightError::InvalidInterval(format!("invalid end date '{end}'")))?;

        Ok(Self {
            repetitions,
            duration,
            end_date,
        })
    }

    /// First day covered by all repetitions
    ///
    /// Months are subtracted before days, clamping to the end of shorter
    /// months the way chrono does.
    pub fn inclusive_start_date(&self) -> Result<DailyDate> {
        let out_of_range =
            || CostsightError::InvalidInterval(format!("window before {self} is out of range"));

        let months = self
            .duration
            .total_months()
            .and_then(|m| m.checked_mul(self.repetitions))
            .ok_or_else(out_of_range)?;
        let days = self
            .duration
            .total_days()
            .map(|d| u64::from(d) * u64::from(self.repetitions))
            .ok_or_else(out_of_range)?;

        let start = self
            .end_date
            .inner()
            .checked_sub_months(Months::new(months))
            .and_then(|d| d.checked_sub_days(Days::new(days)))
            .map(DailyDate::new)
            .ok_or_else(out_of_range)?;
        debug!(
            "{} starts on {} ({} months, {} days back)",
            self, start, months, days
        );
        Ok(start)
    }
}

impl FromStr for RepeatingInterval {
    type Err = CostsightError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for RepeatingInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "R{}/{}/{}",
            self.repetitions, self.duration, self.end_date
        )
    }
}
