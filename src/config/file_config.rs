use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub data_dir: Option<String>,
    pub port: Option<u16>,
    pub metrics_port: Option<u16>,
    pub logging_level: Option<String>,
    pub max_upload_bytes: Option<usize>,

    // Feature configs
    pub fusion: Option<FusionConfig>,
    pub alerts: Option<AlertsConfig>,
    pub storage: Option<StorageConfig>,
    pub classifiers: Option<ClassifiersConfig>,
    pub chat: Option<ChatConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct FusionConfig {
    pub video_weight: Option<f64>,
    pub audio_weight: Option<f64>,
    pub disagreement_penalty: Option<f64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct AlertsConfig {
    /// Labels that can raise an alert, e.g. `["stressed", "anxious", "sad"]`.
    pub negative_emotions: Option<Vec<String>>,
    pub threshold: Option<f64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct StorageConfig {
    /// "local" or "remote"
    pub mode: Option<String>,
    pub remote_url: Option<String>,
    pub remote_root: Option<String>,
    pub remote_token: Option<String>,
    pub timeout_sec: Option<u64>,
    /// Persist every /analyze result as a session log.
    pub auto_persist: Option<bool>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ClassifiersConfig {
    pub video_url: Option<String>,
    pub audio_url: Option<String>,
    pub timeout_sec: Option<u64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ChatConfig {
    pub generator_url: Option<String>,
    pub model: Option<String>,
    pub timeout_sec: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
