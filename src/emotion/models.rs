//! Emotion vocabulary and per-modality observations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::normalize::normalize_label;
use crate::alert::AlertLevel;

/// Errors raised while turning classifier output into observations.
#[derive(Debug, Error, PartialEq)]
pub enum EmotionError {
    #[error("Invalid observation: unrecognized emotion label '{0}'")]
    UnknownLabel(String),

    #[error("Invalid observation: confidence {0} is outside [0, 1]")]
    ConfidenceOutOfRange(f64),

    #[error("Expected a {expected} observation, got {actual}")]
    ModalityMismatch { expected: Modality, actual: Modality },
}

/// The canonical emotion vocabulary. Every fused decision uses one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Happy,
    Sad,
    Stressed,
    Anxious,
    Neutral,
    Calm,
    Alert,
}

impl Emotion {
    pub const ALL: [Emotion; 7] = [
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Stressed,
        Emotion::Anxious,
        Emotion::Neutral,
        Emotion::Calm,
        Emotion::Alert,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Stressed => "stressed",
            Emotion::Anxious => "anxious",
            Emotion::Neutral => "neutral",
            Emotion::Calm => "calm",
            Emotion::Alert => "alert",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Emotion {
    type Err = EmotionError;

    /// Parses through the normalization table, so raw classifier labels are accepted too.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        normalize_label(s)
    }
}

/// One of the two independent detection channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Video,
    Audio,
}

impl Modality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Video => "video",
            Modality::Audio => "audio",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Confidence used when a modality could not be classified at all.
pub const FALLBACK_CONFIDENCE: f64 = 0.5;

/// A validated classifier output for a single modality.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmotionObservation {
    source: Modality,
    raw_label: String,
    label: Emotion,
    confidence: f64,
}

impl EmotionObservation {
    /// Validates a raw classifier output. The label goes through the normalization table
    /// and the confidence must lie within [0, 1].
    pub fn new(
        source: Modality,
        raw_label: impl Into<String>,
        confidence: f64,
    ) -> Result<Self, EmotionError> {
        let raw_label = raw_label.into();
        if !(0.0..=1.0).contains(&confidence) {
            return Err(EmotionError::ConfidenceOutOfRange(confidence));
        }
        let label = normalize_label(&raw_label)?;
        Ok(Self {
            source,
            raw_label,
            label,
            confidence,
        })
    }

    /// Neutral observation standing in for a classifier that could not answer.
    pub fn fallback(source: Modality) -> Self {
        Self {
            source,
            raw_label: Emotion::Neutral.as_str().to_string(),
            label: Emotion::Neutral,
            confidence: FALLBACK_CONFIDENCE,
        }
    }

    pub fn source(&self) -> Modality {
        self.source
    }

    pub fn raw_label(&self) -> &str {
        &self.raw_label
    }

    pub fn label(&self) -> Emotion {
        self.label
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }
}

/// The single decision derived from one video and one audio observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FusedEmotion {
    pub label: Emotion,
    pub confidence: f64,
    pub alert_triggered: bool,
    pub alert_level: AlertLevel,
}
