//! Raw classifier vocabulary to canonical vocabulary.
//!
//! Facial-expression models speak the FER labels (angry, disgust, fear, ...),
//! speech-emotion models tend to use adjectives (fearful, surprised). Both are
//! folded into [`Emotion`] here, before any fusion happens.

use super::models::{Emotion, EmotionError};

/// Maps a raw label to the canonical vocabulary. Case-insensitive, surrounding
/// whitespace ignored. Unrecognized labels are rejected.
pub fn normalize_label(raw: &str) -> Result<Emotion, EmotionError> {
    let emotion = match raw.trim().to_lowercase().as_str() {
        "happy" | "happiness" | "joy" => Emotion::Happy,
        "sad" | "sadness" => Emotion::Sad,
        "angry" | "anger" | "disgust" | "stressed" => Emotion::Stressed,
        "fear" | "fearful" | "anxious" => Emotion::Anxious,
        "surprise" | "surprised" | "alert" => Emotion::Alert,
        "neutral" => Emotion::Neutral,
        "calm" => Emotion::Calm,
        _ => return Err(EmotionError::UnknownLabel(raw.to_string())),
    };
    Ok(emotion)
}
