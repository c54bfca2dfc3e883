//! One detection cycle: classify both modalities, fuse, apply the alert policy.

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::classifier::EmotionClassifier;
use super::fusion::FusionPolicy;
use super::models::{EmotionError, EmotionObservation, FusedEmotion, Modality};
use crate::alert::AlertPolicy;
use crate::server::metrics;

/// Everything produced by one detection cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub video: EmotionObservation,
    pub audio: EmotionObservation,
    pub fused: FusedEmotion,
    pub agreement: bool,
}

pub struct EmotionAnalyzer {
    video: Arc<dyn EmotionClassifier>,
    audio: Arc<dyn EmotionClassifier>,
    fusion: FusionPolicy,
    alerts: AlertPolicy,
}

impl EmotionAnalyzer {
    pub fn new(
        video: Arc<dyn EmotionClassifier>,
        audio: Arc<dyn EmotionClassifier>,
        fusion: FusionPolicy,
        alerts: AlertPolicy,
    ) -> Self {
        Self {
            video,
            audio,
            fusion,
            alerts,
        }
    }

    pub fn alert_policy(&self) -> &AlertPolicy {
        &self.alerts
    }

    /// Runs both classifiers concurrently and fuses their answers.
    ///
    /// A classifier that fails or answers outside the vocabulary is replaced by a
    /// neutral observation, so this only errors if the fusion inputs are wired wrong.
    pub async fn analyze(&self, frame: &[u8], voice: &[u8]) -> Result<Analysis, EmotionError> {
        let (video, audio) = tokio::join!(
            observe(self.video.as_ref(), Modality::Video, frame),
            observe(self.audio.as_ref(), Modality::Audio, voice),
        );
        self.decide(video, audio)
    }

    /// Fusion and alert check for two already-validated observations.
    pub fn decide(
        &self,
        video: EmotionObservation,
        audio: EmotionObservation,
    ) -> Result<Analysis, EmotionError> {
        let outcome = self.fusion.fuse(&video, &audio)?;
        let decision = self.alerts.should_alert(outcome.label, outcome.confidence);

        metrics::record_analysis(outcome.label.as_str());
        if decision.triggered {
            metrics::record_alert(decision.level.as_str());
            info!(
                emotion = %outcome.label,
                confidence = outcome.confidence,
                level = %decision.level,
                "Alert condition met"
            );
        }

        debug!(
            video = %video.label(),
            audio = %audio.label(),
            fused = %outcome.label,
            confidence = outcome.confidence,
            agreement = outcome.agreement,
            "Fused detection cycle"
        );

        Ok(Analysis {
            fused: FusedEmotion {
                label: outcome.label,
                confidence: outcome.confidence,
                alert_triggered: decision.triggered,
                alert_level: decision.level,
            },
            agreement: outcome.agreement,
            video,
            audio,
        })
    }
}

async fn observe(
    classifier: &dyn EmotionClassifier,
    modality: Modality,
    payload: &[u8],
) -> EmotionObservation {
    let start = Instant::now();
    let result = classifier.classify(payload).await;
    metrics::record_classifier_call(modality.as_str(), start.elapsed());

    let prediction = match result {
        Ok(prediction) => prediction,
        Err(e) => {
            warn!(
                modality = %modality,
                classifier = classifier.name(),
                "Classifier unavailable, using neutral fallback: {}",
                e
            );
            metrics::record_classifier_failure(modality.as_str(), "unavailable");
            return EmotionObservation::fallback(modality);
        }
    };

    match EmotionObservation::new(modality, prediction.label, prediction.confidence) {
        Ok(observation) => observation,
        Err(e) => {
            warn!(
                modality = %modality,
                classifier = classifier.name(),
                "Classifier answer rejected, using neutral fallback: {}",
                e
            );
            metrics::record_classifier_failure(modality.as_str(), "invalid");
            EmotionObservation::fallback(modality)
        }
    }
}
