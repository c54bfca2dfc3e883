//! Detection-cycle HTTP routes.
//!
//! - POST /analyze - fuse a webcam frame and a voice clip into one decision
//! - POST /predict - legacy shape of /analyze

use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::error::{resolve_user_id, ApiError};
use super::state::ServerState;
use crate::alert::{AlertLevel, AlertReport};
use crate::emotion::{Analysis, Emotion};
use crate::storage::{SessionData, SessionLogEntry};

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub emotion: Emotion,
    pub confidence: f64,
    pub video_emotion: Emotion,
    pub audio_emotion: Emotion,
    pub alert_triggered: bool,
    pub alert_level: AlertLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub emotion: Emotion,
    pub message: String,
}

/// The two captures of one detection cycle.
#[derive(Debug)]
struct Capture {
    frame: Vec<u8>,
    voice: Vec<u8>,
    user_id: String,
}

// =============================================================================
// Upload parsing
// =============================================================================

async fn read_capture(multipart: Result<Multipart, MultipartRejection>) -> Result<Capture, ApiError> {
    let mut multipart = multipart?;

    let mut frame: Option<Vec<u8>> = None;
    let mut voice: Option<Vec<u8>> = None;
    let mut user_id: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "frame" => frame = Some(field.bytes().await?.to_vec()),
            "voice" => voice = Some(field.bytes().await?.to_vec()),
            "user_id" => user_id = Some(field.text().await?),
            other => debug!("Ignoring unexpected multipart field '{}'", other),
        }
    }

    let frame = match frame {
        Some(f) if !f.is_empty() => f,
        _ => return Err(ApiError::InvalidInput("Missing 'frame' upload".to_string())),
    };
    if !infer::is_image(&frame) {
        return Err(ApiError::InvalidInput(
            "'frame' must be an encoded image".to_string(),
        ));
    }

    let voice = match voice {
        Some(v) if !v.is_empty() => v,
        _ => return Err(ApiError::InvalidInput("Missing 'voice' upload".to_string())),
    };
    // Unrecognized payloads (raw PCM and the like) are passed through.
    if let Some(kind) = infer::get(&voice) {
        match kind.matcher_type() {
            infer::MatcherType::Audio | infer::MatcherType::Video => {}
            _ => {
                return Err(ApiError::InvalidInput(format!(
                    "'voice' must be an audio recording, got {}",
                    kind.mime_type()
                )))
            }
        }
    }

    Ok(Capture {
        frame,
        voice,
        user_id: resolve_user_id(user_id.as_deref())?,
    })
}

// =============================================================================
// Handlers
// =============================================================================

async fn run_cycle(state: &ServerState, capture: &Capture) -> Result<(Analysis, String), ApiError> {
    let analysis = state
        .analyzer
        .analyze(&capture.frame, &capture.voice)
        .await?;
    let message = state
        .chatbot
        .respond_to_emotion(analysis.fused.label)
        .to_string();

    info!(
        user_id = %capture.user_id,
        emotion = %analysis.fused.label,
        confidence = analysis.fused.confidence,
        alert = analysis.fused.alert_triggered,
        "Analysis complete"
    );

    if state.config.auto_persist {
        auto_persist(state, &capture.user_id, &analysis).await;
    }
    Ok((analysis, message))
}

/// Saves the cycle as a session log (and an alert report when it fired).
/// Failures are logged; the detection result is still returned.
async fn auto_persist(state: &ServerState, user_id: &str, analysis: &Analysis) {
    let entry = SessionLogEntry::new(user_id, Utc::now(), SessionData::from_analysis(analysis));
    if let Err(e) = state.persistence.persist_session(&entry).await {
        warn!(user_id = %user_id, "Failed to persist analysis: {}", e);
        return;
    }
    if analysis.fused.alert_triggered {
        let report = AlertReport::from_session(&entry, Utc::now());
        if let Err(e) = state.persistence.persist_alert(&report).await {
            warn!(user_id = %user_id, "Failed to persist alert report: {}", e);
        }
    }
}

/// POST /analyze
async fn analyze(
    State(state): State<ServerState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let capture = read_capture(multipart).await?;
    let (analysis, message) = run_cycle(&state, &capture).await?;

    Ok(Json(AnalyzeResponse {
        emotion: analysis.fused.label,
        confidence: analysis.fused.confidence,
        video_emotion: analysis.video.label(),
        audio_emotion: analysis.audio.label(),
        alert_triggered: analysis.fused.alert_triggered,
        alert_level: analysis.fused.alert_level,
        message,
        timestamp: Utc::now(),
    }))
}

/// POST /predict
async fn predict(
    State(state): State<ServerState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let capture = read_capture(multipart).await?;
    let (analysis, message) = run_cycle(&state, &capture).await?;

    Ok(Json(PredictResponse {
        emotion: analysis.fused.label,
        message,
    }))
}

// =============================================================================
// Router
// =============================================================================

pub fn analysis_routes(max_upload_bytes: usize) -> Router<ServerState> {
    Router::new()
        .route("/analyze", post(analyze))
        .route("/predict", post(predict))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}
