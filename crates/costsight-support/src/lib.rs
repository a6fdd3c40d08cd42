//! Support account profiles and support surcharge for costsight
//!
//! This crate holds the support plan tables as injectable data and the
//! progressive-bracket calculator that turns a window's total cost into a
//! single support surcharge.

pub mod profiles;
pub mod surcharge;

pub use profiles::{SupportAccountProfile, SupportProfiles, SupportTier};
pub use surcharge::{DEFAULT_SURCHARGE_METRIC, SurchargeCalculator};
