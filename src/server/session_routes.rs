//! Session persistence routes.
//!
//! - POST /save - store client session data (and an alert report when flagged)
//! - GET /history/{user_id} - most recent sessions of a user

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::error::{resolve_user_id, validate_user_id, ApiError};
use super::metrics::record_error;
use super::state::{GuardedPersistence, ServerState};
use crate::alert::AlertReport;
use crate::storage::{SessionData, SessionLogEntry};

pub const DEFAULT_HISTORY_LIMIT: usize = 10;
pub const MAX_HISTORY_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
pub struct SaveRequest {
    pub session_data: SessionData,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub status: &'static str,
    pub file_id: String,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub user_id: String,
    pub sessions: Vec<SessionLogEntry>,
    pub count: usize,
}

/// POST /save
async fn save(
    State(persistence): State<GuardedPersistence>,
    Json(request): Json<SaveRequest>,
) -> Result<Json<SaveResponse>, ApiError> {
    let user_id = resolve_user_id(request.user_id.as_deref())?;
    if !request.session_data.confidence_in_range() {
        return Err(ApiError::InvalidInput(
            "session_data.confidence must be within [0, 1]".to_string(),
        ));
    }

    let entry = SessionLogEntry::new(user_id.as_str(), Utc::now(), request.session_data);
    let record = persistence.persist_session(&entry).await?;

    // The session is already stored; a failed alert write must not fail the save.
    let alert_id = if entry.data.alert_triggered {
        let report = AlertReport::from_session(&entry, Utc::now());
        match persistence.persist_alert(&report).await {
            Ok(_) => {
                info!(user_id = %user_id, alert_id = %report.alert_id, "Alert saved");
                Some(report.alert_id)
            }
            Err(e) => {
                warn!(
                    user_id = %user_id,
                    alert_id = %report.alert_id,
                    "Failed to save alert report: {}",
                    e
                );
                record_error("alert_write", "/save");
                None
            }
        }
    } else {
        None
    };

    Ok(Json(SaveResponse {
        status: "success",
        file_id: record.id,
        message: "Session data saved successfully",
        alert_id,
    }))
}

/// GET /history/{user_id}?limit=N
async fn history(
    State(persistence): State<GuardedPersistence>,
    Path(user_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    validate_user_id(&user_id)?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .min(MAX_HISTORY_LIMIT);

    let sessions = persistence.user_sessions(&user_id, limit).await?;
    Ok(Json(HistoryResponse {
        count: sessions.len(),
        user_id,
        sessions,
    }))
}

pub fn session_routes() -> Router<ServerState> {
    Router::new()
        .route("/save", post(save))
        .route("/history/{user_id}", get(history))
}
