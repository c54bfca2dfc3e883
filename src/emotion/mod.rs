//! Emotion vocabulary, classifiers and the video/audio fusion step.

mod analyzer;
mod classifier;
mod fusion;
mod models;
mod normalize;

pub use analyzer::{Analysis, EmotionAnalyzer};
pub use classifier::{
    ClassifierError, ClipLengthAudioClassifier, EmotionClassifier, HttpEmotionClassifier,
    RawPrediction, StaticClassifier, LONG_CLIP_BYTES, SHORT_CLIP_BYTES,
};
pub use fusion::{FusionOutcome, FusionPolicy};
pub use models::{
    Emotion, EmotionError, EmotionObservation, FusedEmotion, Modality, FALLBACK_CONFIDENCE,
};
pub use normalize::normalize_label;
