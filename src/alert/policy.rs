//! Threshold alert policy.
//!
//! Every detection cycle is judged on its own: there is no memory of previous
//! cycles and no debouncing.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::emotion::Emotion;

/// Lower bound of the `high` band.
pub const HIGH_BAND_START: f64 = 0.75;
/// Lower bound of the `critical` band.
pub const CRITICAL_BAND_START: f64 = 0.85;

/// Severity band attached to a fused decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    None,
    Medium,
    High,
    Critical,
}

impl AlertLevel {
    /// Band for a confidence that already met the alert condition.
    pub fn for_confidence(confidence: f64) -> Self {
        if confidence >= CRITICAL_BAND_START {
            AlertLevel::Critical
        } else if confidence >= HIGH_BAND_START {
            AlertLevel::High
        } else {
            AlertLevel::Medium
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::None => "none",
            AlertLevel::Medium => "medium",
            AlertLevel::High => "high",
            AlertLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertDecision {
    pub triggered: bool,
    pub level: AlertLevel,
}

impl AlertDecision {
    pub const NONE: AlertDecision = AlertDecision {
        triggered: false,
        level: AlertLevel::None,
    };
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlertPolicy {
    pub negative_emotions: Vec<Emotion>,
    pub threshold: f64,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            negative_emotions: vec![Emotion::Stressed, Emotion::Anxious, Emotion::Sad],
            threshold: 0.70,
        }
    }
}

impl AlertPolicy {
    /// Fires only for a negative emotion at or above the threshold.
    pub fn should_alert(&self, label: Emotion, confidence: f64) -> AlertDecision {
        if !self.negative_emotions.contains(&label) || confidence < self.threshold {
            return AlertDecision::NONE;
        }
        AlertDecision {
            triggered: true,
            level: AlertLevel::for_confidence(confidence),
        }
    }

    pub fn is_negative(&self, label: Emotion) -> bool {
        self.negative_emotions.contains(&label)
    }
}
