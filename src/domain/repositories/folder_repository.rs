use async_trait::async_trait;

use crate::common::errors::{DomainError, ErrorKind};
use crate::domain::entities::folder::Folder;

/// Error types for folder repository operations
#[derive(Debug, thiserror::Error)]
pub enum FolderRepositoryError {
    #[error("Folder not found: {0}")]
    NotFound(String),

    #[error("Folder already exists: {0}")]
    AlreadyExists(String),

    /// The store refused a parent update that would close a cycle
    #[error("Folder {0} cannot be moved into its own subfolder")]
    WouldCycle(String),

    /// Any failure of the underlying store (connection, timeout, query)
    #[error("Store error: {0}")]
    Store(String),
}

/// Result type for folder repository operations
pub type FolderRepositoryResult<T> = Result<T, FolderRepositoryError>;

impl From<FolderRepositoryError> for DomainError {
    fn from(err: FolderRepositoryError) -> Self {
        match err {
            FolderRepositoryError::NotFound(id) => DomainError::not_found("Folder", id),
            FolderRepositoryError::AlreadyExists(id) => DomainError::already_exists("Folder", id),
            FolderRepositoryError::WouldCycle(id) => DomainError::new(
                ErrorKind::InvalidInput,
                "Folder",
                "Cannot move a folder into its own subfolder",
            ).with_id(id),
            FolderRepositoryError::Store(msg) => DomainError::internal_error("Folder", msg),
        }
    }
}

/// Which records a listing should return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    /// Only records that are not in the trash
    Active,
    /// Everything, trashed records included
    All,
}

/// Record store for folders. Every call is scoped to `owner_id`; a folder
/// owned by someone else behaves exactly like a missing one.
#[async_trait]
pub trait FolderRepository: Send + Sync + 'static {
    /// Persists a new folder record
    async fn create_folder(&self, folder: &Folder) -> FolderRepositoryResult<Folder>;

    /// Point lookup by id and owner
    async fn get_folder(&self, id: &str, owner_id: &str) -> FolderRepositoryResult<Option<Folder>>;

    /// Direct children of `parent_id` (`None` = root), ordered by name
    async fn list_children(
        &self,
        parent_id: Option<&str>,
        owner_id: &str,
        scope: ListScope,
    ) -> FolderRepositoryResult<Vec<Folder>>;

    /// Trashed folders of the owner, most recently trashed first
    async fn list_trashed(&self, owner_id: &str) -> FolderRepositoryResult<Vec<Folder>>;

    /// Non-trashed favorite folders, ordered by name
    async fn list_favorites(&self, owner_id: &str) -> FolderRepositoryResult<Vec<Folder>>;

    /// Number of folders the owner has, trashed included
    async fn count_folders(&self, owner_id: &str) -> FolderRepositoryResult<u64>;

    /// Re-parents a folder. Implementations that can do so atomically
    /// refuse updates that would create a cycle with `WouldCycle`.
    async fn update_parent(
        &self,
        id: &str,
        new_parent_id: Option<&str>,
        owner_id: &str,
    ) -> FolderRepositoryResult<()>;

    async fn rename_folder(&self, id: &str, new_name: &str, owner_id: &str) -> FolderRepositoryResult<Folder>;

    async fn set_favorite(&self, id: &str, is_favorite: bool, owner_id: &str) -> FolderRepositoryResult<()>;

    /// Sets or clears the trash flag (and `trashed_at`) on every listed
    /// folder. Returns the ids that were actually updated.
    async fn set_trashed(
        &self,
        ids: &[String],
        trashed: bool,
        owner_id: &str,
    ) -> FolderRepositoryResult<Vec<String>>;

    /// Deletes folder records. Returns the ids that were actually removed.
    async fn delete_folders(&self, ids: &[String], owner_id: &str) -> FolderRepositoryResult<Vec<String>>;
}
