//! Remote-first persistence with a local fallback, and per-user history.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::blob_store::{BlobEntry, BlobStore, StorageError};
use super::models::{session_path, SessionLogEntry, ALERTS_DIR, SESSIONS_DIR};
use crate::alert::AlertReport;
use crate::server::metrics;

/// Where records go, decided once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    Local,
    Remote,
}

impl StorageMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageMode::Local => "local",
            StorageMode::Remote => "remote",
        }
    }
}

/// Id of a written record and the backend that accepted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub id: String,
    pub backend: StorageMode,
}

pub struct SessionPersistence {
    local: Arc<dyn BlobStore>,
    remote: Option<Arc<dyn BlobStore>>,
}

struct HistoryCandidate<'a> {
    store: &'a dyn BlobStore,
    entry: BlobEntry,
    stamp: String,
    suffix: u32,
}

impl SessionPersistence {
    pub fn local_only(local: Arc<dyn BlobStore>) -> Self {
        Self {
            local,
            remote: None,
        }
    }

    /// Remote store first, `local` when a remote write fails.
    pub fn with_remote(remote: Arc<dyn BlobStore>, local: Arc<dyn BlobStore>) -> Self {
        Self {
            local,
            remote: Some(remote),
        }
    }

    pub fn mode(&self) -> StorageMode {
        if self.remote.is_some() {
            StorageMode::Remote
        } else {
            StorageMode::Local
        }
    }

    pub async fn persist_session(&self, entry: &SessionLogEntry) -> Result<StoredRecord, StorageError> {
        let path = session_path(&entry.user_id, entry.saved_at);
        let bytes = serde_json::to_vec_pretty(entry)?;
        let record = self.write(&path, &bytes, "session").await?;
        info!(
            user_id = %entry.user_id,
            backend = record.backend.as_str(),
            id = %record.id,
            "Saved session"
        );
        Ok(record)
    }

    /// Writes the report as JSON plus a plain-text rendering. Returns the JSON record.
    pub async fn persist_alert(&self, report: &AlertReport) -> Result<StoredRecord, StorageError> {
        let base = format!("{}/{}", ALERTS_DIR, report.alert_id);
        let json = serde_json::to_vec_pretty(report)?;
        let record = self.write(&format!("{}.json", base), &json, "alert").await?;
        self.write(&format!("{}.txt", base), report.render_text().as_bytes(), "alert_text")
            .await?;
        info!(
            alert_id = %report.alert_id,
            level = %report.level,
            backend = record.backend.as_str(),
            "Saved alert report"
        );
        Ok(record)
    }

    async fn write(&self, path: &str, bytes: &[u8], kind: &str) -> Result<StoredRecord, StorageError> {
        if let Some(remote) = &self.remote {
            match remote.put(path, bytes).await {
                Ok(id) => {
                    metrics::record_storage_write(StorageMode::Remote.as_str(), kind);
                    return Ok(StoredRecord {
                        id,
                        backend: StorageMode::Remote,
                    });
                }
                Err(e) => {
                    warn!(path = %path, "Remote store write failed, saving locally: {}", e);
                    metrics::record_storage_fallback();
                }
            }
        }

        let id = self.local.put(path, bytes).await?;
        metrics::record_storage_write(StorageMode::Local.as_str(), kind);
        Ok(StoredRecord {
            id,
            backend: StorageMode::Local,
        })
    }

    /// Most recent sessions of `user_id`, newest first.
    ///
    /// In remote mode the remote records and any local fallback records are
    /// merged. A failing remote listing only logs a warning. Records that cannot
    /// be read or parsed are skipped.
    pub async fn user_sessions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<SessionLogEntry>, StorageError> {
        let prefix = format!("{}/session_{}_", SESSIONS_DIR, user_id);
        let name_pattern = Regex::new(&format!(
            r"^session_{}_(\d{{8}}_\d{{6}}_\d{{6}})(?:-(\d+))?\.json$",
            regex::escape(user_id)
        ))
        .map_err(|e| StorageError::InvalidPath(e.to_string()))?;

        let mut candidates = Vec::new();
        if let Some(remote) = &self.remote {
            match remote.list(&prefix).await {
                Ok(entries) => collect(&mut candidates, remote.as_ref(), entries, &name_pattern),
                Err(e) => warn!(user_id = %user_id, "Remote listing failed, showing local records only: {}", e),
            }
        }
        let local_entries = self.local.list(&prefix).await?;
        collect(&mut candidates, self.local.as_ref(), local_entries, &name_pattern);

        candidates.sort_by(|a, b| b.stamp.cmp(&a.stamp).then(b.suffix.cmp(&a.suffix)));
        debug!(user_id = %user_id, found = candidates.len(), limit, "Loading session history");

        let mut sessions = Vec::new();
        for candidate in candidates.into_iter().take(limit) {
            let bytes = match candidate.store.get(&candidate.entry.id).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(id = %candidate.entry.id, "Skipping unreadable session record: {}", e);
                    continue;
                }
            };
            match serde_json::from_slice::<SessionLogEntry>(&bytes) {
                Ok(session) => sessions.push(session),
                Err(e) => warn!(id = %candidate.entry.id, "Skipping malformed session record: {}", e),
            }
        }
        Ok(sessions)
    }
}

fn collect<'a>(
    candidates: &mut Vec<HistoryCandidate<'a>>,
    store: &'a dyn BlobStore,
    entries: Vec<BlobEntry>,
    name_pattern: &Regex,
) {
    for entry in entries {
        let Some(captures) = name_pattern.captures(entry.file_name()) else {
            continue;
        };
        let stamp = captures[1].to_string();
        let suffix = captures
            .get(2)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0);
        candidates.push(HistoryCandidate {
            store,
            entry,
            stamp,
            suffix,
        });
    }
}
