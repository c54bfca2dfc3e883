//! Per-modality emotion classifiers.
//!
//! The recognition models themselves live outside this service. A classifier
//! either calls one of them over HTTP or, when none is configured, falls back to
//! a built-in estimate so the detection loop keeps producing decisions.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use super::models::Modality;

/// Errors that can occur when talking to a classifier.
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Classifier error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request timeout")]
    Timeout,
}

/// Raw classifier output, before normalization and validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPrediction {
    pub label: String,
    pub confidence: f64,
}

impl RawPrediction {
    pub fn new(label: impl Into<String>, confidence: f64) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

#[async_trait]
pub trait EmotionClassifier: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Classifies one captured payload (an encoded frame or an audio clip).
    async fn classify(&self, payload: &[u8]) -> Result<RawPrediction, ClassifierError>;
}

/// Remote model answering `POST <url>` with the payload as the request body.
///
/// Two response shapes are understood: a direct `{"label", "confidence"}` pair,
/// or a per-label score map `{"emotions": {"happy": 0.1, ...}}` from which the
/// dominant label is taken.
pub struct HttpEmotionClassifier {
    client: Client,
    url: String,
    modality: Modality,
    name: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ClassifierResponse {
    Direct { label: String, confidence: f64 },
    Scores { emotions: HashMap<String, f64> },
}

impl HttpEmotionClassifier {
    pub fn new(url: impl Into<String>, modality: Modality, timeout: Duration) -> Result<Self, ClassifierError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClassifierError::Connection(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
            modality,
            name: format!("http-{}", modality),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl EmotionClassifier for HttpEmotionClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    async fn classify(&self, payload: &[u8]) -> Result<RawPrediction, ClassifierError> {
        let content_type = infer::get(payload)
            .map(|kind| kind.mime_type())
            .unwrap_or("application/octet-stream");

        debug!(
            modality = %self.modality,
            url = %self.url,
            bytes = payload.len(),
            "Sending payload to emotion classifier"
        );

        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(payload.to_vec())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClassifierError::Timeout
                } else {
                    ClassifierError::Connection(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClassifierError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: ClassifierResponse = response
            .json()
            .await
            .map_err(|e| ClassifierError::InvalidResponse(e.to_string()))?;

        match body {
            ClassifierResponse::Direct { label, confidence } => {
                Ok(RawPrediction::new(label, confidence))
            }
            ClassifierResponse::Scores { emotions } => dominant_emotion(&emotions)
                .ok_or_else(|| ClassifierError::InvalidResponse("empty score map".to_string())),
        }
    }
}

/// Picks the highest-scoring label. Ties resolve to the alphabetically first label
/// so the choice does not depend on map iteration order.
fn dominant_emotion(scores: &HashMap<String, f64>) -> Option<RawPrediction> {
    scores
        .iter()
        .max_by(|(a_label, a), (b_label, b)| a.total_cmp(b).then_with(|| b_label.cmp(a_label)))
        .map(|(label, score)| RawPrediction::new(label.clone(), *score))
}

/// Stand-in when no facial-expression model is configured.
pub struct StaticClassifier {
    prediction: RawPrediction,
}

impl StaticClassifier {
    pub fn new(prediction: RawPrediction) -> Self {
        Self { prediction }
    }

    /// Moderately confident neutral answer for video frames.
    pub fn neutral_video() -> Self {
        Self::new(RawPrediction::new("neutral", 0.6))
    }
}

#[async_trait]
impl EmotionClassifier for StaticClassifier {
    fn name(&self) -> &str {
        "static"
    }

    async fn classify(&self, _payload: &[u8]) -> Result<RawPrediction, ClassifierError> {
        Ok(self.prediction.clone())
    }
}

/// Clip length above which speech is assumed to be agitated.
pub const LONG_CLIP_BYTES: usize = 100_000;
/// Clip length below which speech is assumed to be calm.
pub const SHORT_CLIP_BYTES: usize = 50_000;

/// Stand-in when no speech-emotion model is configured: estimates from clip size
/// alone (long recordings suggest more talking, which is read as stress).
pub struct ClipLengthAudioClassifier;

#[async_trait]
impl EmotionClassifier for ClipLengthAudioClassifier {
    fn name(&self) -> &str {
        "clip-length"
    }

    async fn classify(&self, payload: &[u8]) -> Result<RawPrediction, ClassifierError> {
        let prediction = if payload.len() > LONG_CLIP_BYTES {
            RawPrediction::new("stressed", 0.65)
        } else if payload.len() < SHORT_CLIP_BYTES {
            RawPrediction::new("calm", 0.70)
        } else {
            RawPrediction::new("neutral", 0.60)
        };
        Ok(prediction)
    }
}
