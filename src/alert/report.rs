//! Alert reports written next to session logs.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::policy::AlertLevel;
use crate::emotion::Emotion;
use crate::storage::{record_stamp, SessionLogEntry};

const RULE_WIDTH: usize = 60;
const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertReport {
    pub alert_id: String,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    pub emotion: String,
    pub confidence: f64,
    pub video_emotion: String,
    pub audio_emotion: String,
    pub level: AlertLevel,
    pub recommendation: String,
}

impl AlertReport {
    /// Builds the report for a saved session that was flagged by the client.
    /// Missing fields are reported as `unknown` and a missing confidence as 0.
    pub fn from_session(entry: &SessionLogEntry, now: DateTime<Utc>) -> Self {
        let confidence = entry.data.confidence.unwrap_or(0.0);
        Self {
            alert_id: format!("alert_{}_{}", entry.user_id, record_stamp(now)),
            user_id: entry.user_id.clone(),
            timestamp: now,
            emotion: entry
                .data
                .emotion
                .map(|e| e.as_str().to_string())
                .unwrap_or_else(|| UNKNOWN.to_string()),
            confidence,
            video_emotion: entry
                .data
                .video_emotion
                .clone()
                .unwrap_or_else(|| UNKNOWN.to_string()),
            audio_emotion: entry
                .data
                .audio_emotion
                .clone()
                .unwrap_or_else(|| UNKNOWN.to_string()),
            level: AlertLevel::for_confidence(confidence),
            recommendation: recommendation_for(entry.data.emotion).to_string(),
        }
    }

    /// Plain-text rendering for the crew surgeon's inbox.
    pub fn render_text(&self) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        format!(
            "{rule}\n\
             MAITRI ALERT REPORT\n\
             {rule}\n\n\
             Alert ID: {alert_id}\n\
             User: {user_id}\n\
             Timestamp: {timestamp}\n\
             Level: {level}\n\n\
             Detected Emotion: {emotion}\n\
             Confidence: {confidence:.2}%\n\
             Video Emotion: {video}\n\
             Audio Emotion: {audio}\n\n\
             Recommendation:\n\
             {recommendation}\n\n\
             {rule}\n",
            rule = rule,
            alert_id = self.alert_id,
            user_id = self.user_id,
            timestamp = self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            level = self.level.as_str().to_uppercase(),
            emotion = self.emotion,
            confidence = self.confidence * 100.0,
            video = self.video_emotion,
            audio = self.audio_emotion,
            recommendation = self.recommendation,
        )
    }
}

pub fn recommendation_for(emotion: Option<Emotion>) -> &'static str {
    match emotion {
        Some(Emotion::Stressed) => {
            "Recommend immediate relaxation protocol. Consider breathing exercises and scheduled rest period."
        }
        Some(Emotion::Anxious) => {
            "Suggest anxiety management techniques. Review mission status and provide reassurance."
        }
        Some(Emotion::Sad) => {
            "Recommend psychological support session. Consider connection with support team or loved ones."
        }
        _ => "Recommend monitoring and support session.",
    }
}
