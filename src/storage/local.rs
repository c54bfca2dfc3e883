//! Blob store backed by a local directory.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::blob_store::{validate_relative_path, BlobEntry, BlobStore, StorageError};

/// Upper bound on collision suffixes tried for a single name.
const MAX_SUFFIX: u32 = 10_000;

/// Files under a root directory. Ids are the full file paths.
///
/// Existing files are never overwritten: a name collision gets a `-N` suffix
/// before the extension.
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the root directory.
    pub async fn init(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Ids must name a file under the root. Only the part below the root is
    /// checked for `..`, the root itself may be written with one.
    fn resolve_id(&self, id: &str) -> Result<PathBuf, StorageError> {
        let path = PathBuf::from(id);
        let below_root = path
            .strip_prefix(&self.root)
            .map_err(|_| StorageError::InvalidPath(id.to_string()))?;
        if below_root
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(StorageError::InvalidPath(id.to_string()));
        }
        Ok(path)
    }
}

fn with_suffix(file_name: &str, n: u32) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}-{}.{}", stem, n, ext),
        _ => format!("{}-{}", file_name, n),
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    fn name(&self) -> &str {
        "local"
    }

    async fn put(&self, path: &str, bytes: &[u8]) -> Result<String, StorageError> {
        validate_relative_path(path)?;
        let target = self.root.join(path);
        let dir = target
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());
        fs::create_dir_all(&dir).await?;

        let file_name = target
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| StorageError::InvalidPath(path.to_string()))?
            .to_string();

        let mut candidate = target;
        let mut n = 0;
        let mut file = loop {
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&candidate)
                .await
            {
                Ok(file) => break file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists && n < MAX_SUFFIX => {
                    n += 1;
                    candidate = dir.join(with_suffix(&file_name, n));
                }
                Err(e) => return Err(e.into()),
            }
        };
        file.write_all(bytes).await?;
        file.flush().await?;

        debug!(path = %candidate.display(), bytes = bytes.len(), "Wrote local blob");
        Ok(candidate.display().to_string())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<BlobEntry>, StorageError> {
        let (dir_part, name_prefix) = match prefix.rsplit_once('/') {
            Some((dir, name)) => (Some(dir), name),
            None => (None, prefix),
        };
        let dir = match dir_part {
            Some(d) => {
                validate_relative_path(d)?;
                self.root.join(d)
            }
            None => self.root.clone(),
        };

        let mut reader = match fs::read_dir(&dir).await {
            Ok(reader) => reader,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if !name.starts_with(name_prefix) {
                continue;
            }
            let path = match dir_part {
                Some(d) => format!("{}/{}", d, name),
                None => name,
            };
            entries.push(BlobEntry {
                id: entry.path().display().to_string(),
                path,
            });
        }
        Ok(entries)
    }

    async fn get(&self, id: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve_id(id)?;
        Ok(fs::read(path).await?)
    }
}
