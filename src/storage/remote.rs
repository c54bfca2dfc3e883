//! HTTP client for a generic blob service standing in for cloud drive storage.
//!
//! Protocol:
//! * `PUT {base}/blobs/{path}` with the raw bytes, answers `{"id": "..."}`
//! * `GET {base}/blobs?prefix=...` answers `{"blobs": [{"id": "...", "path": "..."}]}`
//! * `GET {base}/content/{id}` answers the raw bytes

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::blob_store::{validate_relative_path, BlobEntry, BlobStore, StorageError};

pub struct RemoteBlobStore {
    client: Client,
    base_url: String,
    /// Folder every path is placed under, e.g. `MAITRI_Data`.
    root: String,
    token: Option<String>,
}

#[derive(Deserialize)]
struct PutResponse {
    id: String,
}

#[derive(Deserialize)]
struct ListResponse {
    blobs: Vec<BlobEntry>,
}

impl RemoteBlobStore {
    pub fn new(
        base_url: impl Into<String>,
        root: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, StorageError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            root: root.into().trim_matches('/').to_string(),
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn rooted(&self, path: &str) -> String {
        if self.root.is_empty() {
            path.to_string()
        } else {
            format!("{}/{}", self.root, path)
        }
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, StorageError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StorageError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }
}

fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[async_trait]
impl BlobStore for RemoteBlobStore {
    fn name(&self) -> &str {
        "remote"
    }

    async fn put(&self, path: &str, bytes: &[u8]) -> Result<String, StorageError> {
        validate_relative_path(path)?;
        let url = format!("{}/blobs/{}", self.base_url, encode_path(&self.rooted(path)));
        debug!(url = %url, bytes = bytes.len(), "Uploading blob");

        let response = self
            .send(
                self.client
                    .put(&url)
                    .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
                    .body(bytes.to_vec()),
            )
            .await?;
        let body: PutResponse = response
            .json()
            .await
            .map_err(|e| StorageError::InvalidResponse(e.to_string()))?;
        Ok(body.id)
    }

    async fn list(&self, prefix: &str) -> Result<Vec<BlobEntry>, StorageError> {
        let rooted_prefix = self.rooted(prefix);
        let url = format!(
            "{}/blobs?prefix={}",
            self.base_url,
            urlencoding::encode(&rooted_prefix)
        );
        let response = self.send(self.client.get(&url)).await?;
        let body: ListResponse = response
            .json()
            .await
            .map_err(|e| StorageError::InvalidResponse(e.to_string()))?;

        // Paths come back rooted; hand them out relative to the root like the local store.
        let strip = if self.root.is_empty() {
            String::new()
        } else {
            format!("{}/", self.root)
        };
        Ok(body
            .blobs
            .into_iter()
            .filter(|blob| blob.path.starts_with(&rooted_prefix))
            .map(|blob| BlobEntry {
                path: blob
                    .path
                    .strip_prefix(&strip)
                    .map(str::to_string)
                    .unwrap_or(blob.path.clone()),
                id: blob.id,
            })
            .collect())
    }

    async fn get(&self, id: &str) -> Result<Vec<u8>, StorageError> {
        let url = format!("{}/content/{}", self.base_url, urlencoding::encode(id));
        let response = self.send(self.client.get(&url)).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
