//! Support plan profiles
//!
//! A profile describes how a support plan is billed: a flat minimum and an
//! ordered list of marginal-rate brackets. The built-in table mirrors the
//! public AWS Developer, Business and Enterprise plans; a JSON file with the
//! same shape replaces it entirely.
//!
//! ```json
//! [
//!   {
//!     "accountType": "BUSINESS",
//!     "minimum": 100.0,
//!     "tiers": [
//!       {"rate": 0.10, "lowerBound": 0, "upperBound": 10000},
//!       {"rate": 0.03, "lowerBound": 10000, "upperBound": 0}
//!     ]
//!   }
//! ]
//! ```

use costsight_core::error::{CostsightError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// One marginal-rate bracket
///
/// `lower_bound` is inclusive and `upper_bound` exclusive; an upper bound of
/// `0` marks the open-ended last bracket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportTier {
    pub rate: f64,
    pub lower_bound: f64,
    #[serde(default)]
    pub upper_bound: f64,
}

impl SupportTier {
    pub fn new(rate: f64, lower_bound: f64, upper_bound: f64) -> Self {
        Self {
            rate,
            lower_bound,
            upper_bound,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.upper_bound == 0.0
    }
}

/// Billing rules of one support plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportAccountProfile {
    /// Plan name, e.g. `BUSINESS`
    pub account_type: String,
    /// Flat minimum charged when the bracket math comes out lower
    pub minimum: f64,
    /// Brackets in ascending order
    pub tiers: Vec<SupportTier>,
}

impl SupportAccountProfile {
    pub fn new(account_type: impl Into<String>, minimum: f64, tiers: Vec<SupportTier>) -> Self {
        Self {
            account_type: account_type.into(),
            minimum,
            tiers,
        }
    }
}

/// The set of profiles a deployment knows about
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SupportProfiles {
    profiles: Vec<SupportAccountProfile>,
}

impl Default for SupportProfiles {
    fn default() -> Self {
        Self::aws_defaults()
    }
}

impl SupportProfiles {
    pub fn new(profiles: Vec<SupportAccountProfile>) -> Self {
        Self { profiles }
    }

    /// AWS Developer, Business and Enterprise support pricing
    pub fn aws_defaults() -> Self {
        Self::new(vec![
            SupportAccountProfile::new("DEVELOPER", 29.0, vec![SupportTier::new(0.03, 0.0, 0.0)]),
            SupportAccountProfile::new(
                "BUSINESS",
                100.0,
                vec![
                    SupportTier::new(0.10, 0.0, 10_000.0),
                    SupportTier::new(0.07, 10_000.0, 80_000.0),
                    SupportTier::new(0.05, 80_000.0, 250_000.0),
                    SupportTier::new(0.03, 250_000.0, 0.0),
                ],
            ),
            SupportAccountProfile::new(
                "ENTERPRISE",
                15_000.0,
                vec![
                    SupportTier::new(0.10, 0.0, 150_000.0),
                    SupportTier::new(0.07, 150_000.0, 500_000.0),
                    SupportTier::new(0.05, 500_000.0, 1_000_000.0),
                    SupportTier::new(0.03, 1_000_000.0, 0.0),
                ],
            ),
        ])
    }

    /// Parse a JSON array of profiles
    pub fn from_json(json: &str) -> Result<Self> {
        let profiles: Self = serde_json::from_str(json)?;
        if profiles.profiles.is_empty() {
            return Err(CostsightError::Config(
                "support profile list is empty".to_string(),
            ));
        }
        Ok(profiles)
    }

    /// Load profiles from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let profiles = Self::from_json(&json).map_err(|e| CostsightError::Parse {
            file: path.to_path_buf(),
            error: e.to_string(),
        })?;
        debug!(
            "Loaded {} support profiles from {}",
            profiles.profiles.len(),
            path.display()
        );
        Ok(profiles)
    }

    /// Look up a plan by name, ignoring case
    pub fn get(&self, account_type: &str) -> Result<&SupportAccountProfile> {
        self.profiles
            .iter()
            .find(|p| p.account_type.eq_ignore_ascii_case(account_type))
            .ok_or_else(|| CostsightError::UnknownAccountType(account_type.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &SupportAccountProfile> {
        self.profiles.iter()
    }
}
