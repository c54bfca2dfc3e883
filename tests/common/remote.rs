//! In-process stand-in for the remote blob service

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

#[derive(Default)]
struct Blobs {
    next_id: usize,
    /// id -> (path, bytes)
    by_id: BTreeMap<String, (String, Vec<u8>)>,
}

type SharedBlobs = Arc<Mutex<Blobs>>;

#[derive(Deserialize)]
struct ListQuery {
    prefix: Option<String>,
}

async fn put_blob(
    State(blobs): State<SharedBlobs>,
    Path(path): Path<String>,
    body: Bytes,
) -> impl IntoResponse {
    let mut blobs = blobs.lock().unwrap();
    blobs.next_id += 1;
    let id = format!("blob-{}", blobs.next_id);
    blobs.by_id.insert(id.clone(), (path, body.to_vec()));
    Json(json!({ "id": id }))
}

async fn list_blobs(
    State(blobs): State<SharedBlobs>,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    let prefix = query.prefix.unwrap_or_default();
    let blobs = blobs.lock().unwrap();
    let listed: Vec<_> = blobs
        .by_id
        .iter()
        .filter(|(_, (path, _))| path.starts_with(&prefix))
        .map(|(id, (path, _))| json!({ "id": id, "path": path }))
        .collect();
    Json(json!({ "blobs": listed }))
}

async fn get_content(State(blobs): State<SharedBlobs>, Path(id): Path<String>) -> impl IntoResponse {
    match blobs.lock().unwrap().by_id.get(&id) {
        Some((_, bytes)) => (StatusCode::OK, bytes.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// A blob service listening on a random local port.
///
/// When dropped, the service shuts down.
pub struct FakeRemoteStore {
    pub base_url: String,
    blobs: SharedBlobs,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl FakeRemoteStore {
    pub async fn spawn() -> Self {
        let blobs = SharedBlobs::default();
        let app = Router::new()
            .route("/blobs", get(list_blobs))
            .route("/blobs/{*path}", axum::routing::put(put_blob))
            .route("/content/{id}", get(get_content))
            .with_state(blobs.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake remote store");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Fake remote store failed");
        });

        Self {
            base_url: format!("http://127.0.0.1:{}", port),
            blobs,
            _shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Paths of every stored blob, sorted.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self
            .blobs
            .lock()
            .unwrap()
            .by_id
            .values()
            .map(|(path, _)| path.clone())
            .collect();
        paths.sort();
        paths
    }
}

impl Drop for FakeRemoteStore {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// A URL nothing listens on.
pub async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind probe port");
    let port = listener
        .local_addr()
        .expect("Failed to get local address")
        .port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}
