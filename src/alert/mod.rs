//! Alert policy and alert reports.

mod policy;
mod report;

pub use policy::{AlertDecision, AlertLevel, AlertPolicy, CRITICAL_BAND_START, HIGH_BAND_START};
pub use report::{recommendation_for, AlertReport};
