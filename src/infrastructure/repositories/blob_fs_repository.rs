use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;

use crate::domain::repositories::blob_repository::{
    BlobRemoval, BlobRepository, BlobRepositoryError, BlobRepositoryResult, BlobStream,
};

/// Chunk size used when streaming blobs back to clients
const STREAM_CHUNK_BYTES: usize = 64 * 1024;

/// Concurrent unlinks during a batched removal
const REMOVAL_CONCURRENCY: usize = 8;

/// Blob store on the local filesystem. Keys map to relative paths below
/// `root`.
pub struct BlobFsRepository {
    root: PathBuf,
}

impl BlobFsRepository {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Creates the root directory if needed
    pub async fn init(&self) -> BlobRepositoryResult<()> {
        fs::create_dir_all(&self.root).await?;
        tracing::info!("Blob storage ready at {}", self.root.display());
        Ok(())
    }

    /// Resolves a key below the root; absolute keys and anything other
    /// than plain path segments are refused
    fn resolve(&self, key: &str) -> BlobRepositoryResult<PathBuf> {
        let relative = Path::new(key);
        let plain = !key.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));

        if !plain {
            return Err(BlobRepositoryError::InvalidPath(key.to_string()));
        }
        Ok(self.root.join(relative))
    }

    async fn remove_one(&self, key: &str) -> Result<(), String> {
        let path = self.resolve(key).map_err(|e| e.to_string())?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("Blob {} already gone", key);
                Ok(())
            }
            Err(e) => Err(e.to_string()),
        }
    }
}

#[async_trait]
impl BlobRepository for BlobFsRepository {
    async fn put(&self, key: &str, content: Bytes) -> BlobRepositoryResult<()> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => BlobRepositoryError::AlreadyExists(key.to_string()),
                _ => BlobRepositoryError::IoError(e),
            })?;

        let written = async {
            file.write_all(&content).await?;
            file.sync_all().await
        }
        .await;

        if let Err(e) = written {
            tracing::error!("Write of blob {} failed, removing partial file: {}", key, e);
            let _ = fs::remove_file(&path).await;
            return Err(BlobRepositoryError::IoError(e));
        }

        tracing::debug!("Stored blob {} ({} bytes)", key, content.len());
        Ok(())
    }

    async fn open(&self, key: &str) -> BlobRepositoryResult<BlobStream> {
        let path = self.resolve(key)?;
        let file = fs::File::open(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => BlobRepositoryError::NotFound(key.to_string()),
            _ => BlobRepositoryError::IoError(e),
        })?;

        Ok(Box::pin(ReaderStream::with_capacity(file, STREAM_CHUNK_BYTES)))
    }

    async fn remove(&self, keys: &[String]) -> BlobRemoval {
        let outcomes: Vec<(String, Result<(), String>)> = stream::iter(keys.iter().cloned())
            .map(|key| async move {
                let outcome = self.remove_one(&key).await;
                (key, outcome)
            })
            .buffered(REMOVAL_CONCURRENCY)
            .collect()
            .await;

        let mut removal = BlobRemoval::default();
        for (key, outcome) in outcomes {
            match outcome {
                Ok(()) => removal.removed.push(key),
                Err(reason) => {
                    tracing::warn!("Could not remove blob {}: {}", key, reason);
                    removal.failed.push((key, reason));
                }
            }
        }
        removal
    }
}
