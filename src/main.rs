use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::{fmt::Debug, path::PathBuf};
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use maitri_server::chatbot::{Chatbot, OllamaGenerator, TextGenerator};
use maitri_server::config::{self, AppConfig, StorageSettings};
use maitri_server::emotion::{
    ClipLengthAudioClassifier, EmotionAnalyzer, EmotionClassifier, HttpEmotionClassifier, Modality,
    StaticClassifier,
};
use maitri_server::server::{metrics, run_server, RequestsLoggingLevel, ServerConfig};
use maitri_server::storage::{
    BlobStore, LocalBlobStore, RemoteBlobStore, SessionPersistence, StorageMode,
};

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(format!("Error resolving path '{}': {}", s, msg));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir().map_err(|e| format!("Failed to get current dir: {}", e))?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(version, about = "MAITRI emotion monitoring and support service")]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Directory where session logs and alert reports are written.
    /// Created if missing.
    #[clap(long, value_parser = parse_path)]
    pub data_dir: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = config::DEFAULT_PORT)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = config::DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Maximum accepted request body size in bytes.
    #[clap(long, default_value_t = config::DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,

    /// Where session records go. Defaults to remote when a remote URL is set.
    #[clap(long)]
    pub storage_mode: Option<StorageMode>,

    /// Base URL of the remote blob store.
    #[clap(long)]
    pub remote_storage_url: Option<String>,

    /// Bearer token for the remote blob store.
    #[clap(long)]
    pub remote_storage_token: Option<String>,

    /// Folder inside the remote store that holds MAITRI records.
    #[clap(long)]
    pub remote_root: Option<String>,

    /// Timeout in seconds for remote storage requests.
    #[clap(long, default_value_t = config::DEFAULT_STORAGE_TIMEOUT_SEC)]
    pub storage_timeout_sec: u64,

    /// Also save every /analyze result as a session log.
    #[clap(long)]
    pub auto_persist: bool,

    /// URL of the facial-expression classifier. A neutral stand-in is used if unset.
    #[clap(long)]
    pub video_classifier_url: Option<String>,

    /// URL of the voice-tone classifier. A clip-length heuristic is used if unset.
    #[clap(long)]
    pub audio_classifier_url: Option<String>,

    /// Timeout in seconds for classifier requests.
    #[clap(long, default_value_t = config::DEFAULT_CLASSIFIER_TIMEOUT_SEC)]
    pub classifier_timeout_sec: u64,

    /// Base URL of an Ollama-compatible text generator for /chat.
    #[clap(long)]
    pub chat_generator_url: Option<String>,

    /// Model name passed to the text generator.
    #[clap(long)]
    pub chat_model: Option<String>,

    /// Timeout in seconds for text generator requests.
    #[clap(long, default_value_t = config::DEFAULT_CHAT_TIMEOUT_SEC)]
    pub chat_timeout_sec: u64,
}

/// Convert CLI args to CliConfig for config resolution
impl From<&CliArgs> for config::CliConfig {
    fn from(args: &CliArgs) -> Self {
        config::CliConfig {
            data_dir: args.data_dir.clone(),
            port: args.port,
            metrics_port: args.metrics_port,
            logging_level: args.logging_level.clone(),
            max_upload_bytes: args.max_upload_bytes,
            storage_mode: args.storage_mode,
            remote_storage_url: args.remote_storage_url.clone(),
            remote_storage_token: args.remote_storage_token.clone(),
            remote_root: args.remote_root.clone(),
            storage_timeout_sec: args.storage_timeout_sec,
            auto_persist: args.auto_persist,
            video_classifier_url: args.video_classifier_url.clone(),
            audio_classifier_url: args.audio_classifier_url.clone(),
            classifier_timeout_sec: args.classifier_timeout_sec,
            chat_generator_url: args.chat_generator_url.clone(),
            chat_model: args.chat_model.clone(),
            chat_timeout_sec: args.chat_timeout_sec,
        }
    }
}

fn build_analyzer(app_config: &AppConfig) -> Result<EmotionAnalyzer> {
    let settings = &app_config.classifiers;

    let video: Arc<dyn EmotionClassifier> = match &settings.video_url {
        Some(url) => {
            info!("Video classifier: {}", url);
            Arc::new(HttpEmotionClassifier::new(
                url.as_str(),
                Modality::Video,
                settings.timeout,
            )?)
        }
        None => {
            warn!("No video classifier configured, every frame reads as neutral");
            Arc::new(StaticClassifier::neutral_video())
        }
    };

    let audio: Arc<dyn EmotionClassifier> = match &settings.audio_url {
        Some(url) => {
            info!("Audio classifier: {}", url);
            Arc::new(HttpEmotionClassifier::new(
                url.as_str(),
                Modality::Audio,
                settings.timeout,
            )?)
        }
        None => {
            warn!("No audio classifier configured, using clip-length heuristic");
            Arc::new(ClipLengthAudioClassifier)
        }
    };

    Ok(EmotionAnalyzer::new(
        video,
        audio,
        app_config.fusion.clone(),
        app_config.alerts.clone(),
    ))
}

fn build_chatbot(app_config: &AppConfig) -> Result<Chatbot> {
    let chat = &app_config.chat;
    let generator: Option<Arc<dyn TextGenerator>> = match &chat.generator_url {
        Some(url) => {
            info!("Chat generator: {} (model {})", url, chat.model);
            Some(Arc::new(OllamaGenerator::new(
                url.as_str(),
                chat.model.as_str(),
                chat.timeout,
            )?))
        }
        None => {
            info!("No chat generator configured, replying from templates");
            None
        }
    };
    Ok(Chatbot::new(generator, &app_config.alerts))
}

async fn build_persistence(app_config: &AppConfig) -> Result<SessionPersistence> {
    let local = LocalBlobStore::new(&app_config.data_dir);
    local
        .init()
        .await
        .with_context(|| format!("Failed to prepare data directory {:?}", app_config.data_dir))?;
    let local: Arc<dyn BlobStore> = Arc::new(local);

    let StorageSettings {
        mode,
        remote_url,
        remote_root,
        remote_token,
        timeout,
        ..
    } = &app_config.storage;

    match (mode, remote_url) {
        (StorageMode::Remote, Some(url)) => {
            info!("Remote storage: {} (root '{}')", url, remote_root);
            let remote = RemoteBlobStore::new(
                url.as_str(),
                remote_root.as_str(),
                remote_token.clone(),
                *timeout,
            )?;
            Ok(SessionPersistence::with_remote(Arc::new(remote), local))
        }
        _ => {
            info!("Local storage only");
            Ok(SessionPersistence::local_only(local))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    // Load TOML config if provided
    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Some(config::FileConfig::load(path)?)
        }
        None => None,
    };

    // Resolve final configuration (TOML overrides CLI)
    let cli_config: config::CliConfig = (&cli_args).into();
    let app_config = AppConfig::resolve(&cli_config, file_config)?;

    info!("Configuration loaded:");
    info!("  data_dir: {:?}", app_config.data_dir);
    info!("  port: {}", app_config.port);
    info!("  metrics_port: {}", app_config.metrics_port);
    info!("  storage mode: {}", app_config.storage.mode.as_str());
    info!("  auto_persist: {}", app_config.storage.auto_persist);

    info!("Initializing metrics...");
    metrics::init_metrics();

    let analyzer = Arc::new(build_analyzer(&app_config)?);
    let chatbot = Arc::new(build_chatbot(&app_config)?);
    let persistence = Arc::new(build_persistence(&app_config).await?);

    let server_config = ServerConfig {
        requests_logging_level: app_config.logging_level.clone(),
        port: app_config.port,
        max_upload_bytes: app_config.max_upload_bytes,
        auto_persist: app_config.storage.auto_persist,
    };

    tokio::select! {
        result = run_server(
            server_config,
            app_config.metrics_port,
            analyzer,
            chatbot,
            persistence,
        ) => {
            info!("HTTP server stopped: {:?}", result);
            result
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
            Ok(())
        }
    }
}
