use async_trait::async_trait;

use crate::common::errors::DomainError;
use crate::domain::entities::file::File;
use crate::domain::repositories::folder_repository::ListScope;

/**
 * Error types for file record operations.
 *
 * Only metadata lives behind this repository; blob content is handled by
 * the `BlobRepository`.
 */
#[derive(Debug, thiserror::Error)]
pub enum FileRepositoryError {
    /// Returned when a requested file cannot be found for the owner
    #[error("File not found: {0}")]
    NotFound(String),

    /// Returned when a storage path is already taken by another record
    #[error("File already exists: {0}")]
    AlreadyExists(String),

    /// Catch-all for failures of the underlying store
    #[error("Store error: {0}")]
    Store(String),
}

pub type FileRepositoryResult<T> = Result<T, FileRepositoryError>;

impl From<FileRepositoryError> for DomainError {
    fn from(err: FileRepositoryError) -> Self {
        match err {
            FileRepositoryError::NotFound(id) => DomainError::not_found("File", id),
            FileRepositoryError::AlreadyExists(id) => DomainError::already_exists("File", id),
            FileRepositoryError::Store(msg) => DomainError::internal_error("File", msg),
        }
    }
}

/// Record store for files, scoped to an owner on every call
#[async_trait]
pub trait FileRepository: Send + Sync + 'static {
    async fn create_file(&self, file: &File) -> FileRepositoryResult<File>;

    async fn get_file(&self, id: &str, owner_id: &str) -> FileRepositoryResult<Option<File>>;

    /// Bulk lookup; ids that do not exist for the owner are simply absent
    async fn get_files(&self, ids: &[String], owner_id: &str) -> FileRepositoryResult<Vec<File>>;

    /// Files directly inside `folder_id` (`None` = root), ordered by name
    async fn list_files(
        &self,
        folder_id: Option<&str>,
        owner_id: &str,
        scope: ListScope,
    ) -> FileRepositoryResult<Vec<File>>;

    async fn list_trashed(&self, owner_id: &str) -> FileRepositoryResult<Vec<File>>;

    async fn list_favorites(&self, owner_id: &str) -> FileRepositoryResult<Vec<File>>;

    /// Moves files into `target_folder_id`. Returns the ids actually moved.
    async fn move_files(
        &self,
        ids: &[String],
        target_folder_id: Option<&str>,
        owner_id: &str,
    ) -> FileRepositoryResult<Vec<String>>;

    async fn rename_file(&self, id: &str, new_name: &str, owner_id: &str) -> FileRepositoryResult<File>;

    async fn set_favorite(&self, id: &str, is_favorite: bool, owner_id: &str) -> FileRepositoryResult<()>;

    /// Sets or clears the trash flag. Returns the ids actually updated.
    async fn set_trashed(
        &self,
        ids: &[String],
        trashed: bool,
        owner_id: &str,
    ) -> FileRepositoryResult<Vec<String>>;

    /// Deletes file records. Returns the ids actually removed.
    async fn delete_files(&self, ids: &[String], owner_id: &str) -> FileRepositoryResult<Vec<String>>;

    /// Sum of sizes of the owner's non-trashed files
    async fn total_size(&self, owner_id: &str) -> FileRepositoryResult<u64>;
}
