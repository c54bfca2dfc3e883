//! Video/audio decision fusion.

use super::models::{Emotion, EmotionError, EmotionObservation, Modality};

/// Weights and penalty used to combine the two modalities.
#[derive(Debug, Clone, PartialEq)]
pub struct FusionPolicy {
    pub video_weight: f64,
    pub audio_weight: f64,
    /// Multiplier applied to the winning confidence when the modalities disagree.
    pub disagreement_penalty: f64,
}

impl Default for FusionPolicy {
    fn default() -> Self {
        Self {
            video_weight: 0.5,
            audio_weight: 0.5,
            disagreement_penalty: 0.9,
        }
    }
}

/// Label and confidence chosen by the fusion step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionOutcome {
    pub label: Emotion,
    pub confidence: f64,
    /// Whether both modalities reported the same canonical label.
    pub agreement: bool,
}

impl FusionPolicy {
    /// Combines one video and one audio observation.
    ///
    /// * Same label: weighted average of the two confidences.
    /// * Different labels: the more confident modality wins and its confidence is
    ///   multiplied by `disagreement_penalty`. Equal confidences go to video.
    pub fn fuse(
        &self,
        video: &EmotionObservation,
        audio: &EmotionObservation,
    ) -> Result<FusionOutcome, EmotionError> {
        expect_source(video, Modality::Video)?;
        expect_source(audio, Modality::Audio)?;

        if video.label() == audio.label() {
            let (video_weight, audio_weight) = self.effective_weights();
            let confidence = (video.confidence() * video_weight
                + audio.confidence() * audio_weight)
                / (video_weight + audio_weight);
            return Ok(FusionOutcome {
                label: video.label(),
                confidence: confidence.clamp(0.0, 1.0),
                agreement: true,
            });
        }

        let winner = if video.confidence() >= audio.confidence() {
            video
        } else {
            audio
        };
        Ok(FusionOutcome {
            label: winner.label(),
            confidence: (winner.confidence() * self.disagreement_penalty).clamp(0.0, 1.0),
            agreement: false,
        })
    }

    /// Configured weights, or equal weights when they cannot form an average
    /// (negative, non-finite, or both zero).
    fn effective_weights(&self) -> (f64, f64) {
        let usable = |w: f64| w.is_finite() && w >= 0.0;
        if usable(self.video_weight)
            && usable(self.audio_weight)
            && self.video_weight + self.audio_weight > 0.0
        {
            (self.video_weight, self.audio_weight)
        } else {
            (1.0, 1.0)
        }
    }

    /// Raw-label form of [`FusionPolicy::fuse`]: both inputs are validated and
    /// normalized before they are combined.
    pub fn fuse_raw(
        &self,
        video_label: &str,
        video_confidence: f64,
        audio_label: &str,
        audio_confidence: f64,
    ) -> Result<(Emotion, f64), EmotionError> {
        let video = EmotionObservation::new(Modality::Video, video_label, video_confidence)?;
        let audio = EmotionObservation::new(Modality::Audio, audio_label, audio_confidence)?;
        let outcome = self.fuse(&video, &audio)?;
        Ok((outcome.label, outcome.confidence))
    }
}

fn expect_source(observation: &EmotionObservation, expected: Modality) -> Result<(), EmotionError> {
    if observation.source() != expected {
        return Err(EmotionError::ModalityMismatch {
            expected,
            actual: observation.source(),
        });
    }
    Ok(())
}
