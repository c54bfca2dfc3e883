mod file_config;

pub use file_config::{
    AlertsConfig, ChatConfig, ClassifiersConfig, FileConfig, FusionConfig, StorageConfig,
};

use crate::alert::AlertPolicy;
use crate::emotion::{Emotion, FusionPolicy};
use crate::server::RequestsLoggingLevel;
use crate::storage::StorageMode;
use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_METRICS_PORT: u16 = 9091;
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_REMOTE_ROOT: &str = "MAITRI_Data";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_STORAGE_TIMEOUT_SEC: u64 = 10;
pub const DEFAULT_CLASSIFIER_TIMEOUT_SEC: u64 = 10;
pub const DEFAULT_CHAT_TIMEOUT_SEC: u64 = 30;
pub const DEFAULT_CHAT_MODEL: &str = "llama3";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub data_dir: Option<PathBuf>,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub max_upload_bytes: usize,
    pub storage_mode: Option<StorageMode>,
    pub remote_storage_url: Option<String>,
    pub remote_storage_token: Option<String>,
    pub remote_root: Option<String>,
    pub storage_timeout_sec: u64,
    pub auto_persist: bool,
    pub video_classifier_url: Option<String>,
    pub audio_classifier_url: Option<String>,
    pub classifier_timeout_sec: u64,
    pub chat_generator_url: Option<String>,
    pub chat_model: Option<String>,
    pub chat_timeout_sec: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            port: DEFAULT_PORT,
            metrics_port: DEFAULT_METRICS_PORT,
            logging_level: RequestsLoggingLevel::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            storage_mode: None,
            remote_storage_url: None,
            remote_storage_token: None,
            remote_root: None,
            storage_timeout_sec: DEFAULT_STORAGE_TIMEOUT_SEC,
            auto_persist: false,
            video_classifier_url: None,
            audio_classifier_url: None,
            classifier_timeout_sec: DEFAULT_CLASSIFIER_TIMEOUT_SEC,
            chat_generator_url: None,
            chat_model: None,
            chat_timeout_sec: DEFAULT_CHAT_TIMEOUT_SEC,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub data_dir: PathBuf,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub max_upload_bytes: usize,

    // Decision core
    pub fusion: FusionPolicy,
    pub alerts: AlertPolicy,

    // External collaborators
    pub storage: StorageSettings,
    pub classifiers: ClassifierSettings,
    pub chat: ChatSettings,
}

#[derive(Debug, Clone)]
pub struct StorageSettings {
    pub mode: StorageMode,
    pub remote_url: Option<String>,
    pub remote_root: String,
    pub remote_token: Option<String>,
    pub timeout: Duration,
    pub auto_persist: bool,
}

#[derive(Debug, Clone)]
pub struct ClassifierSettings {
    pub video_url: Option<String>,
    pub audio_url: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub generator_url: Option<String>,
    pub model: String,
    pub timeout: Duration,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let data_dir = file
            .data_dir
            .map(PathBuf::from)
            .or_else(|| cli.data_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        if data_dir.exists() && !data_dir.is_dir() {
            bail!("data_dir is not a directory: {:?}", data_dir);
        }
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {:?}", data_dir))?;

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let max_upload_bytes = file.max_upload_bytes.unwrap_or(cli.max_upload_bytes);
        if max_upload_bytes == 0 {
            bail!("max_upload_bytes must be greater than zero");
        }

        let fusion = resolve_fusion(file.fusion.unwrap_or_default())?;
        let alerts = resolve_alerts(file.alerts.unwrap_or_default())?;
        let storage = resolve_storage(cli, file.storage.unwrap_or_default())?;

        // Classifier settings
        let classifiers_file = file.classifiers.unwrap_or_default();
        let classifiers = ClassifierSettings {
            video_url: validated_url(
                "video classifier url",
                classifiers_file
                    .video_url
                    .or_else(|| cli.video_classifier_url.clone()),
            )?,
            audio_url: validated_url(
                "audio classifier url",
                classifiers_file
                    .audio_url
                    .or_else(|| cli.audio_classifier_url.clone()),
            )?,
            timeout: timeout(
                "classifier timeout",
                classifiers_file
                    .timeout_sec
                    .unwrap_or(cli.classifier_timeout_sec),
            )?,
        };

        // Chat settings
        let chat_file = file.chat.unwrap_or_default();
        let chat = ChatSettings {
            generator_url: validated_url(
                "chat generator url",
                chat_file
                    .generator_url
                    .or_else(|| cli.chat_generator_url.clone()),
            )?,
            model: chat_file
                .model
                .or_else(|| cli.chat_model.clone())
                .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            timeout: timeout(
                "chat timeout",
                chat_file.timeout_sec.unwrap_or(cli.chat_timeout_sec),
            )?,
        };

        Ok(Self {
            data_dir,
            port,
            metrics_port,
            logging_level,
            max_upload_bytes,
            fusion,
            alerts,
            storage,
            classifiers,
            chat,
        })
    }
}

fn resolve_fusion(file: FusionConfig) -> Result<FusionPolicy> {
    let defaults = FusionPolicy::default();
    let policy = FusionPolicy {
        video_weight: file.video_weight.unwrap_or(defaults.video_weight),
        audio_weight: file.audio_weight.unwrap_or(defaults.audio_weight),
        disagreement_penalty: file
            .disagreement_penalty
            .unwrap_or(defaults.disagreement_penalty),
    };

    for (name, weight) in [
        ("video_weight", policy.video_weight),
        ("audio_weight", policy.audio_weight),
    ] {
        if !weight.is_finite() || weight < 0.0 {
            bail!("fusion.{} must be a non-negative number, got {}", name, weight);
        }
    }
    if policy.video_weight + policy.audio_weight <= 0.0 {
        bail!("fusion weights must not both be zero");
    }
    if !(policy.disagreement_penalty > 0.0 && policy.disagreement_penalty <= 1.0) {
        bail!(
            "fusion.disagreement_penalty must be in (0, 1], got {}",
            policy.disagreement_penalty
        );
    }
    Ok(policy)
}

fn resolve_alerts(file: AlertsConfig) -> Result<AlertPolicy> {
    let defaults = AlertPolicy::default();

    let negative_emotions = match file.negative_emotions {
        Some(labels) => {
            let mut emotions = Vec::with_capacity(labels.len());
            for label in labels {
                let emotion: Emotion = label
                    .parse()
                    .with_context(|| format!("alerts.negative_emotions: '{}'", label))?;
                if !emotions.contains(&emotion) {
                    emotions.push(emotion);
                }
            }
            emotions
        }
        None => defaults.negative_emotions,
    };

    let threshold = file.threshold.unwrap_or(defaults.threshold);
    if !(0.0..=1.0).contains(&threshold) {
        bail!("alerts.threshold must be in [0, 1], got {}", threshold);
    }

    Ok(AlertPolicy {
        negative_emotions,
        threshold,
    })
}

fn resolve_storage(cli: &CliConfig, file: StorageConfig) -> Result<StorageSettings> {
    let remote_url = validated_url(
        "remote storage url",
        file.remote_url.or_else(|| cli.remote_storage_url.clone()),
    )?;

    let explicit_mode = match file.mode {
        Some(s) => Some(
            StorageMode::from_str(&s, true)
                .map_err(|_| anyhow::anyhow!("storage.mode must be 'local' or 'remote', got '{}'", s))?,
        ),
        None => cli.storage_mode,
    };
    let mode = explicit_mode.unwrap_or(if remote_url.is_some() {
        StorageMode::Remote
    } else {
        StorageMode::Local
    });

    if mode == StorageMode::Remote && remote_url.is_none() {
        bail!("Remote storage mode requires --remote-storage-url or storage.remote_url");
    }
    if mode == StorageMode::Local && remote_url.is_some() {
        warn!("Storage mode is local, the remote storage url will not be used");
    }

    Ok(StorageSettings {
        mode,
        remote_url,
        remote_root: file
            .remote_root
            .or_else(|| cli.remote_root.clone())
            .unwrap_or_else(|| DEFAULT_REMOTE_ROOT.to_string()),
        remote_token: file
            .remote_token
            .or_else(|| cli.remote_storage_token.clone()),
        timeout: timeout(
            "storage timeout",
            file.timeout_sec.unwrap_or(cli.storage_timeout_sec),
        )?,
        auto_persist: file.auto_persist.unwrap_or(cli.auto_persist),
    })
}

fn validated_url(name: &str, url: Option<String>) -> Result<Option<String>> {
    let Some(url) = url else {
        return Ok(None);
    };
    let parsed =
        reqwest::Url::parse(&url).with_context(|| format!("Invalid {}: {}", name, url))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        bail!("Invalid {}: {} (expected http or https)", name, url);
    }
    Ok(Some(url))
}

fn timeout(name: &str, seconds: u64) -> Result<Duration> {
    if seconds == 0 {
        bail!("{} must be at least one second", name);
    }
    Ok(Duration::from_secs(seconds))
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cli_with_dir(dir: &TempDir) -> CliConfig {
        CliConfig {
            data_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_logging_level() {
        assert!(matches!(
            parse_logging_level("none"),
            Some(RequestsLoggingLevel::None)
        ));
        assert!(matches!(
            parse_logging_level("BODY"),
            Some(RequestsLoggingLevel::Body)
        ));
        assert!(parse_logging_level("invalid").is_none());
    }

    #[test]
    fn test_resolve_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = AppConfig::resolve(&cli_with_dir(&temp_dir), None).unwrap();

        assert_eq!(config.data_dir, temp_dir.path());
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.metrics_port, DEFAULT_METRICS_PORT);
        assert_eq!(config.fusion, FusionPolicy::default());
        assert_eq!(config.alerts, AlertPolicy::default());
        assert_eq!(config.storage.mode, StorageMode::Local);
        assert_eq!(config.storage.remote_root, "MAITRI_Data");
        assert!(!config.storage.auto_persist);
        assert!(config.classifiers.video_url.is_none());
        assert_eq!(config.chat.model, DEFAULT_CHAT_MODEL);
    }

    #[test]
    fn test_resolve_toml_overrides_cli() {
        let temp_dir = TempDir::new().unwrap();
        let cli = CliConfig {
            data_dir: Some(PathBuf::from("/should/be/overridden")),
            port: 3001,
            metrics_port: 9999,
            logging_level: RequestsLoggingLevel::Path,
            ..Default::default()
        };
        let file_config = FileConfig {
            data_dir: Some(temp_dir.path().to_string_lossy().to_string()),
            port: Some(4000),
            logging_level: Some("headers".to_string()),
            ..Default::default()
        };

        let config = AppConfig::resolve(&cli, Some(file_config)).unwrap();

        assert_eq!(config.data_dir, temp_dir.path());
        assert_eq!(config.port, 4000);
        assert_eq!(config.logging_level, RequestsLoggingLevel::Headers);
        // CLI value used when TOML doesn't specify
        assert_eq!(config.metrics_port, 9999);
    }

    #[test]
    fn test_data_dir_is_created() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b");
        let cli = CliConfig {
            data_dir: Some(nested.clone()),
            ..Default::default()
        };
        AppConfig::resolve(&cli, None).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn test_data_dir_not_directory_error() {
        let temp_file = tempfile::NamedTempFile::new().unwrap();
        let cli = CliConfig {
            data_dir: Some(temp_file.path().to_path_buf()),
            ..Default::default()
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result.unwrap_err().to_string().contains("not a directory"));
    }

    #[test]
    fn test_remote_url_implies_remote_mode() {
        let temp_dir = TempDir::new().unwrap();
        let cli = CliConfig {
            remote_storage_url: Some("http://blobs:9000".to_string()),
            ..cli_with_dir(&temp_dir)
        };
        let config = AppConfig::resolve(&cli, None).unwrap();
        assert_eq!(config.storage.mode, StorageMode::Remote);
    }

    #[test]
    fn test_explicit_local_mode_wins_over_url() {
        let temp_dir = TempDir::new().unwrap();
        let cli = CliConfig {
            remote_storage_url: Some("http://blobs:9000".to_string()),
            storage_mode: Some(StorageMode::Local),
            ..cli_with_dir(&temp_dir)
        };
        let config = AppConfig::resolve(&cli, None).unwrap();
        assert_eq!(config.storage.mode, StorageMode::Local);
    }

    #[test]
    fn test_remote_mode_requires_url() {
        let temp_dir = TempDir::new().unwrap();
        let file_config = FileConfig {
            storage: Some(StorageConfig {
                mode: Some("remote".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let result = AppConfig::resolve(&cli_with_dir(&temp_dir), Some(file_config));
        assert!(result.unwrap_err().to_string().contains("requires"));
    }

    #[test]
    fn test_invalid_storage_mode() {
        let temp_dir = TempDir::new().unwrap();
        let file_config = FileConfig {
            storage: Some(StorageConfig {
                mode: Some("cloud".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(AppConfig::resolve(&cli_with_dir(&temp_dir), Some(file_config)).is_err());
    }

    #[test]
    fn test_invalid_urls_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let cli = CliConfig {
            video_classifier_url: Some("not a url".to_string()),
            ..cli_with_dir(&temp_dir)
        };
        assert!(AppConfig::resolve(&cli, None).is_err());

        let cli = CliConfig {
            chat_generator_url: Some("ftp://ollama".to_string()),
            ..cli_with_dir(&temp_dir)
        };
        assert!(AppConfig::resolve(&cli, None).is_err());
    }

    #[test]
    fn test_fusion_section() {
        let temp_dir = TempDir::new().unwrap();
        let file_config = FileConfig {
            fusion: Some(FusionConfig {
                video_weight: Some(0.6),
                audio_weight: Some(0.4),
                disagreement_penalty: None,
            }),
            ..Default::default()
        };
        let config = AppConfig::resolve(&cli_with_dir(&temp_dir), Some(file_config)).unwrap();
        assert_eq!(config.fusion.video_weight, 0.6);
        assert_eq!(config.fusion.audio_weight, 0.4);
        assert_eq!(config.fusion.disagreement_penalty, 0.9);
    }

    #[test]
    fn test_fusion_validation() {
        for fusion in [
            FusionConfig {
                video_weight: Some(-1.0),
                ..Default::default()
            },
            FusionConfig {
                video_weight: Some(0.0),
                audio_weight: Some(0.0),
                ..Default::default()
            },
            FusionConfig {
                disagreement_penalty: Some(0.0),
                ..Default::default()
            },
            FusionConfig {
                disagreement_penalty: Some(1.5),
                ..Default::default()
            },
        ] {
            assert!(resolve_fusion(fusion).is_err());
        }
    }

    #[test]
    fn test_alerts_section() {
        let policy = resolve_alerts(AlertsConfig {
            negative_emotions: Some(vec![
                "Stressed".to_string(),
                "fear".to_string(),
                "anxious".to_string(),
            ]),
            threshold: Some(0.8),
        })
        .unwrap();
        assert_eq!(
            policy.negative_emotions,
            vec![Emotion::Stressed, Emotion::Anxious]
        );
        assert_eq!(policy.threshold, 0.8);
    }

    #[test]
    fn test_alerts_validation() {
        assert!(resolve_alerts(AlertsConfig {
            negative_emotions: Some(vec!["bored".to_string()]),
            threshold: None,
        })
        .is_err());
        assert!(resolve_alerts(AlertsConfig {
            negative_emotions: None,
            threshold: Some(1.2),
        })
        .is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let cli = CliConfig {
            classifier_timeout_sec: 0,
            ..cli_with_dir(&temp_dir)
        };
        assert!(AppConfig::resolve(&cli, None).is_err());
    }
}
