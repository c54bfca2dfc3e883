//! Persisted record shapes and naming.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::emotion::{Analysis, Emotion};

/// Folder for session logs, relative to the store root.
pub const SESSIONS_DIR: &str = "sessions";
/// Folder for alert reports, relative to the store root.
pub const ALERTS_DIR: &str = "alerts";

/// Timestamp component of record names: `YYYYMMDD_HHMMSS_ffffff`, UTC.
pub fn record_stamp(at: DateTime<Utc>) -> String {
    at.format("%Y%m%d_%H%M%S_%6f").to_string()
}

pub fn session_path(user_id: &str, at: DateTime<Utc>) -> String {
    format!("{}/session_{}_{}.json", SESSIONS_DIR, user_id, record_stamp(at))
}

/// Client-supplied session data. Known fields are typed; anything else the
/// client sends is kept as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion: Option<Emotion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub alert_triggered: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_emotion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_emotion: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SessionData {
    /// Session data for one server-side detection cycle. The per-modality
    /// fields keep the labels exactly as the classifiers reported them.
    pub fn from_analysis(analysis: &Analysis) -> Self {
        Self {
            emotion: Some(analysis.fused.label),
            confidence: Some(analysis.fused.confidence),
            alert_triggered: analysis.fused.alert_triggered,
            video_emotion: Some(analysis.video.raw_label().to_string()),
            audio_emotion: Some(analysis.audio.raw_label().to_string()),
            extra: Map::new(),
        }
    }

    pub fn confidence_in_range(&self) -> bool {
        self.confidence
            .map(|c| (0.0..=1.0).contains(&c))
            .unwrap_or(true)
    }
}

/// One saved session. Written once and never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionLogEntry {
    pub user_id: String,
    pub saved_at: DateTime<Utc>,
    #[serde(flatten)]
    pub data: SessionData,
}

impl SessionLogEntry {
    pub fn new(user_id: impl Into<String>, saved_at: DateTime<Utc>, mut data: SessionData) -> Self {
        // These keys belong to the entry itself.
        data.extra.remove("user_id");
        data.extra.remove("saved_at");
        Self {
            user_id: user_id.into(),
            saved_at,
            data,
        }
    }
}
