use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use tracing::{error, info, instrument, warn};

use crate::application::dtos::file_dto::{FileDto, FolderContentsDto};
use crate::common::errors::{DomainError, ErrorKind, Result};
use crate::domain::entities::file::{format_file_size, File};
use crate::domain::entities::folder::is_valid_name;
use crate::domain::entities::user_preferences::UserPreferences;
use crate::domain::repositories::blob_repository::{BlobRepository, BlobRepositoryError, BlobStream};
use crate::domain::repositories::file_repository::FileRepository;
use crate::domain::repositories::folder_repository::{FolderRepository, ListScope};
use crate::domain::repositories::preferences_repository::PreferencesRepository;

/**
 * A file received from the browser, ready to be stored.
 */
#[derive(Debug, Clone)]
pub struct UploadFileDto {
    pub name: String,
    pub folder_id: Option<String>,
    /// Content type announced by the client, if any
    pub content_type: Option<String>,
    pub content: Bytes,
}

/**
 * Service component for file operations in the application layer.
 *
 * Record changes go through the `FileRepository`, content through the
 * `BlobRepository`. An upload writes the blob before the record, so a
 * record never points to content that was not stored.
 */
pub struct FileService {
    file_repository: Arc<dyn FileRepository>,
    folder_repository: Arc<dyn FolderRepository>,
    blob_repository: Arc<dyn BlobRepository>,
    preferences_repository: Arc<dyn PreferencesRepository>,
    /// Quota applied when the user has no preferences row
    default_quota_bytes: u64,
}

impl FileService {
    pub fn new(
        file_repository: Arc<dyn FileRepository>,
        folder_repository: Arc<dyn FolderRepository>,
        blob_repository: Arc<dyn BlobRepository>,
        preferences_repository: Arc<dyn PreferencesRepository>,
        default_quota_bytes: u64,
    ) -> Self {
        Self {
            file_repository,
            folder_repository,
            blob_repository,
            preferences_repository,
            default_quota_bytes,
        }
    }

    async fn ensure_folder(&self, folder_id: Option<&str>, owner_id: &str) -> Result<()> {
        if let Some(folder_id) = folder_id {
            if self.folder_repository.get_folder(folder_id, owner_id).await?.is_none() {
                return Err(DomainError::not_found("Folder", folder_id));
            }
        }
        Ok(())
    }

    /// Active files and folders directly inside `folder_id` (`None` = root)
    #[instrument(skip(self))]
    pub async fn list_contents(&self, folder_id: Option<&str>, owner_id: &str) -> Result<FolderContentsDto> {
        self.ensure_folder(folder_id, owner_id).await?;

        let (files, folders) = tokio::try_join!(
            async {
                self.file_repository
                    .list_files(folder_id, owner_id, ListScope::Active)
                    .await
                    .map_err(DomainError::from)
            },
            async {
                self.folder_repository
                    .list_children(folder_id, owner_id, ListScope::Active)
                    .await
                    .map_err(DomainError::from)
            },
        )?;

        Ok(FolderContentsDto::new(files, folders))
    }

    /// Everything the owner moved to the trash
    #[instrument(skip(self))]
    pub async fn list_trash(&self, owner_id: &str) -> Result<FolderContentsDto> {
        let files = self.file_repository.list_trashed(owner_id).await?;
        let folders = self.folder_repository.list_trashed(owner_id).await?;
        Ok(FolderContentsDto::new(files, folders))
    }

    #[instrument(skip(self))]
    pub async fn list_favorites(&self, owner_id: &str) -> Result<FolderContentsDto> {
        let files = self.file_repository.list_favorites(owner_id).await?;
        let folders = self.folder_repository.list_favorites(owner_id).await?;
        Ok(FolderContentsDto::new(files, folders))
    }

    async fn quota_for(&self, owner_id: &str) -> Result<u64> {
        let preferences = self.preferences_repository.get_preferences(owner_id).await?;
        Ok(UserPreferences::effective_quota(preferences.as_ref(), self.default_quota_bytes))
    }

    /// Stores an uploaded file.
    ///
    /// Fails with `QuotaExceeded` when the new file would push the owner
    /// past the quota. If the record cannot be written the blob is removed
    /// again.
    #[instrument(skip(self, upload), fields(name = %upload.name, size = upload.content.len()))]
    pub async fn upload(&self, upload: UploadFileDto, owner_id: &str) -> Result<FileDto> {
        if !is_valid_name(&upload.name) {
            return Err(DomainError::validation_error(
                "File",
                format!("Invalid file name: {}", upload.name),
            ));
        }

        let folder_id = upload.folder_id.filter(|id| !id.is_empty());
        self.ensure_folder(folder_id.as_deref(), owner_id).await?;

        let size = upload.content.len() as u64;
        let used = self.file_repository.total_size(owner_id).await?;
        let quota = self.quota_for(owner_id).await?;
        if used.saturating_add(size) > quota {
            warn!("Upload of {} bytes rejected for user {}: quota exceeded", size, owner_id);
            return Err(DomainError::quota_exceeded(format!(
                "Storage quota exceeded: {} used of {}",
                format_file_size(used),
                format_file_size(quota)
            )));
        }

        let name = upload.name.trim().to_string();
        let storage_path = File::build_storage_path(owner_id, &name, Utc::now());
        let content_type = upload
            .content_type
            .filter(|ct| !ct.is_empty() && ct != "application/octet-stream")
            .or_else(|| mime_guess::from_path(&name).first().map(|mime| mime.to_string()));
        let file = File::new(
            name,
            storage_path.clone(),
            size,
            content_type,
            folder_id,
            owner_id.to_string(),
        )
        .map_err(|e| DomainError::validation_error("File", e.to_string()))?;

        self.blob_repository
            .put(&storage_path, upload.content)
            .await
            .map_err(|e| match e {
                BlobRepositoryError::AlreadyExists(path) => DomainError::already_exists("File", path),
                other => DomainError::internal_error("File", other.to_string()),
            })?;

        match self.file_repository.create_file(&file).await {
            Ok(created) => {
                info!("File {} uploaded for user {}", created.id(), owner_id);
                Ok(FileDto::from(created))
            }
            Err(e) => {
                error!("Record insert failed for {}, removing blob: {}", storage_path, e);
                let removal = self.blob_repository.remove(&[storage_path.clone()]).await;
                if !removal.is_complete() {
                    error!("Orphaned blob left behind at {}", storage_path);
                }
                Err(e.into())
            }
        }
    }

    /// The file record and a stream over its content
    #[instrument(skip(self))]
    pub async fn download(&self, id: &str, owner_id: &str) -> Result<(File, BlobStream)> {
        let file = self
            .file_repository
            .get_file(id, owner_id)
            .await?
            .ok_or_else(|| DomainError::not_found("File", id))?;

        let stream = self.open_blob(&file).await?;
        Ok((file, stream))
    }

    pub(crate) async fn open_blob(&self, file: &File) -> Result<BlobStream> {
        self.blob_repository
            .open(file.storage_path())
            .await
            .map_err(|e| match e {
                BlobRepositoryError::NotFound(_) => {
                    error!("Record {} points to a missing blob {}", file.id(), file.storage_path());
                    DomainError::not_found("File", file.id())
                }
                other => DomainError::internal_error("File", other.to_string()),
            })
    }

    /// Deletes one file for good, blob first
    #[instrument(skip(self))]
    pub async fn delete_file(&self, id: &str, owner_id: &str) -> Result<()> {
        let file = self
            .file_repository
            .get_file(id, owner_id)
            .await?
            .ok_or_else(|| DomainError::not_found("File", id))?;

        let removal = self.blob_repository.remove(&[file.storage_path().to_string()]).await;
        if let Some((path, reason)) = removal.failed.first() {
            return Err(DomainError::new(
                ErrorKind::InternalError,
                "File",
                format!("Could not remove stored content {}: {}", path, reason),
            )
            .with_id(id));
        }

        let removed = self.file_repository.delete_files(&[id.to_string()], owner_id).await?;
        if removed.is_empty() {
            return Err(DomainError::not_found("File", id));
        }

        info!("File {} deleted for user {}", id, owner_id);
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn rename_file(&self, id: &str, new_name: &str, owner_id: &str) -> Result<FileDto> {
        if !is_valid_name(new_name) {
            return Err(DomainError::validation_error(
                "File",
                format!("Invalid file name: {}", new_name),
            ));
        }

        let file = self.file_repository.rename_file(id, new_name.trim(), owner_id).await?;
        Ok(FileDto::from(file))
    }

    pub async fn set_favorite(&self, id: &str, is_favorite: bool, owner_id: &str) -> Result<()> {
        self.file_repository.set_favorite(id, is_favorite, owner_id).await?;
        Ok(())
    }
}
