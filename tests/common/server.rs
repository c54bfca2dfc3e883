//! Test server lifecycle management
//!
//! This module manages spawning and shutting down test HTTP servers.
//! Each test gets an isolated server with its own data directory.

use super::constants::*;
use super::remote::{unreachable_url, FakeRemoteStore};
use maitri_server::alert::AlertPolicy;
use maitri_server::chatbot::Chatbot;
use maitri_server::emotion::{EmotionAnalyzer, FusionPolicy, RawPrediction, StaticClassifier};
use maitri_server::server::{make_app, RequestsLoggingLevel, ServerConfig};
use maitri_server::storage::{BlobStore, LocalBlobStore, RemoteBlobStore, SessionPersistence};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Where session records of a test server go besides the local directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteSetup {
    /// Local storage only
    None,
    /// A working in-process blob service
    Fake,
    /// Remote mode pointed at a port nothing listens on
    Unreachable,
}

/// Knobs for [`TestServer::spawn_with`]
#[derive(Debug, Clone)]
pub struct TestServerOptions {
    pub video: (&'static str, f64),
    pub audio: (&'static str, f64),
    pub remote: RemoteSetup,
    pub auto_persist: bool,
    pub max_upload_bytes: usize,
}

impl Default for TestServerOptions {
    fn default() -> Self {
        Self {
            video: DEFAULT_VIDEO,
            audio: DEFAULT_AUDIO,
            remote: RemoteSetup::None,
            auto_persist: false,
            max_upload_bytes: ServerConfig::default().max_upload_bytes,
        }
    }
}

/// Test server instance with an isolated data directory
///
/// When dropped, the server gracefully shuts down and temp resources are cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// The fake blob service, when spawned with [`RemoteSetup::Fake`]
    pub remote: Option<FakeRemoteStore>,

    // Private fields - keep resources alive until drop
    _temp_data_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a local-only server whose classifiers always answer happy
    pub async fn spawn() -> Self {
        Self::spawn_with(TestServerOptions::default()).await
    }

    /// Spawns a new test server on a random port
    ///
    /// # Panics
    ///
    /// Panics if:
    /// - The temp directory cannot be created
    /// - Port binding fails
    /// - Server doesn't become ready within timeout
    pub async fn spawn_with(options: TestServerOptions) -> Self {
        let temp_data_dir = TempDir::new().expect("Failed to create temp data dir");

        let alerts = AlertPolicy::default();
        let analyzer = EmotionAnalyzer::new(
            Arc::new(StaticClassifier::new(RawPrediction::new(
                options.video.0,
                options.video.1,
            ))),
            Arc::new(StaticClassifier::new(RawPrediction::new(
                options.audio.0,
                options.audio.1,
            ))),
            FusionPolicy::default(),
            alerts.clone(),
        );
        let chatbot = Chatbot::templated(&alerts);

        let local = LocalBlobStore::new(temp_data_dir.path());
        local.init().await.expect("Failed to init local store");
        let local: Arc<dyn BlobStore> = Arc::new(local);

        let (persistence, remote) = match options.remote {
            RemoteSetup::None => (SessionPersistence::local_only(local), None),
            RemoteSetup::Fake => {
                let fake = FakeRemoteStore::spawn().await;
                let store = remote_store(&fake.base_url);
                (SessionPersistence::with_remote(store, local), Some(fake))
            }
            RemoteSetup::Unreachable => {
                let store = remote_store(&unreachable_url().await);
                (SessionPersistence::with_remote(store, local), None)
            }
        };

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");

        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let base_url = format!("http://127.0.0.1:{}", port);

        // Create shutdown channel
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            max_upload_bytes: options.max_upload_bytes,
            auto_persist: options.auto_persist,
        };

        let app = make_app(
            config,
            Arc::new(analyzer),
            Arc::new(chatbot),
            Arc::new(persistence),
        );

        // Spawn server in background task with graceful shutdown
        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            })
            .await
            .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            remote,
            _temp_data_dir: temp_data_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Root of the local session and alert files
    pub fn data_dir(&self) -> &Path {
        self._temp_data_dir.path()
    }

    /// Local files under `sub` (e.g. "sessions"), sorted by name
    pub fn local_files(&self, sub: &str) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = match std::fs::read_dir(self.data_dir().join(sub)) {
            Ok(entries) => entries.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
            Err(_) => Vec::new(),
        };
        files.sort();
        files
    }

    /// Waits for the server to become ready by polling the / endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => {
                    return;
                }
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

fn remote_store(base_url: &str) -> Arc<dyn BlobStore> {
    Arc::new(
        RemoteBlobStore::new(
            base_url,
            "MAITRI_Data",
            Some("test-token".to_string()),
            Duration::from_millis(REMOTE_TIMEOUT_MS),
        )
        .expect("Failed to build remote store"),
    )
}

impl Drop for TestServer {
    fn drop(&mut self) {
        // Send shutdown signal
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
        // TempDir is cleaned up automatically
    }
}
