use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

/// Errors raised by the blob store
#[derive(Debug, thiserror::Error)]
pub enum BlobRepositoryError {
    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("Invalid blob path: {0}")]
    InvalidPath(String),

    #[error("Blob already exists: {0}")]
    AlreadyExists(String),

    #[error("IO Error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type BlobRepositoryResult<T> = Result<T, BlobRepositoryError>;

/// Byte stream of a stored blob
pub type BlobStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Outcome of a batched removal. Removal is best effort: every path is
/// attempted and the failures are reported, never raised.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BlobRemoval {
    pub removed: Vec<String>,
    /// Paths that could not be removed, with the reason
    pub failed: Vec<(String, String)>,
}

impl BlobRemoval {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn failed_paths(&self) -> impl Iterator<Item = &str> {
        self.failed.iter().map(|(path, _)| path.as_str())
    }
}

/// Binary object storage keyed by opaque path strings
#[async_trait]
pub trait BlobRepository: Send + Sync + 'static {
    /// Stores `content` under `path`; never overwrites an existing blob
    async fn put(&self, path: &str, content: Bytes) -> BlobRepositoryResult<()>;

    async fn open(&self, path: &str) -> BlobRepositoryResult<BlobStream>;

    /// Removes every path. A blob that is already gone counts as removed.
    async fn remove(&self, paths: &[String]) -> BlobRemoval;
}
