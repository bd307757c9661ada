use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::application::dtos::file_dto::PublicFileDto;
use crate::application::dtos::share_dto::{CreateShareDto, ShareLinkDto, SharedFileDto};
use crate::common::errors::DomainError;
use crate::domain::entities::file::File;
use crate::domain::entities::share::{ShareError, SharedLink};
use crate::domain::repositories::blob_repository::{BlobRepository, BlobRepositoryError, BlobStream};
use crate::domain::repositories::file_repository::FileRepository;
use crate::domain::repositories::share_repository::ShareRepository;

#[derive(Debug, Error)]
pub enum ShareServiceError {
    #[error("Share not found: {0}")]
    NotFound(String),
    #[error("File not found: {0}")]
    FileNotFound(String),
    #[error("Share link has expired")]
    Expired,
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Repository error: {0}")]
    Repository(String),
}

impl From<ShareServiceError> for DomainError {
    fn from(error: ShareServiceError) -> Self {
        match error {
            ShareServiceError::NotFound(s) => DomainError::not_found("Share", s),
            ShareServiceError::FileNotFound(s) => DomainError::not_found("File", s),
            ShareServiceError::Expired => DomainError::expired("Share", "Share link has expired"),
            ShareServiceError::Validation(s) => DomainError::validation_error("Share", s),
            ShareServiceError::Repository(s) => DomainError::internal_error("Share", s),
        }
    }
}

impl From<ShareError> for ShareServiceError {
    fn from(error: ShareError) -> Self {
        ShareServiceError::Validation(error.to_string())
    }
}

pub struct ShareService {
    share_repository: Arc<dyn ShareRepository>,
    file_repository: Arc<dyn FileRepository>,
    blob_repository: Arc<dyn BlobRepository>,
}

impl ShareService {
    pub fn new(
        share_repository: Arc<dyn ShareRepository>,
        file_repository: Arc<dyn FileRepository>,
        blob_repository: Arc<dyn BlobRepository>,
    ) -> Self {
        Self {
            share_repository,
            file_repository,
            blob_repository,
        }
    }

    /// Creates a public link for a file the caller owns
    #[instrument(skip(self, dto), fields(file_id = %dto.file_id))]
    pub async fn create_link(&self, dto: CreateShareDto, owner_id: &str) -> Result<ShareLinkDto, DomainError> {
        if dto.file_id.trim().is_empty() {
            return Err(ShareServiceError::Validation("File ID is required".to_string()).into());
        }

        let file = self
            .file_repository
            .get_file(&dto.file_id, owner_id)
            .await?
            .ok_or_else(|| ShareServiceError::FileNotFound(dto.file_id.clone()))?;

        let link = SharedLink::new(file.id().to_string(), dto.expires_in_days).map_err(ShareServiceError::from)?;
        let saved = self.share_repository.create_link(&link).await?;

        info!("Share link {} created for file {}", saved.id, saved.file_id);
        Ok(ShareLinkDto::from(saved))
    }

    /// The most recent link of a file, if any
    pub async fn link_for_file(&self, file_id: &str, owner_id: &str) -> Result<ShareLinkDto, DomainError> {
        let link = self
            .share_repository
            .find_by_file(file_id, owner_id)
            .await?
            .ok_or_else(|| ShareServiceError::NotFound(file_id.to_string()))?;
        Ok(ShareLinkDto::from(link))
    }

    #[instrument(skip(self))]
    pub async fn revoke_link(&self, id: &str, owner_id: &str) -> Result<(), DomainError> {
        if !self.share_repository.delete_link(id, owner_id).await? {
            return Err(ShareServiceError::NotFound(id.to_string()).into());
        }
        info!("Share link {} revoked", id);
        Ok(())
    }

    /// Resolves a token to a live link. Trashed files are not served.
    async fn resolve(&self, token: &str) -> Result<(SharedLink, File), ShareServiceError> {
        let (link, file) = self
            .share_repository
            .find_by_token(token)
            .await
            .map_err(|e| ShareServiceError::Repository(e.to_string()))?
            .ok_or_else(|| ShareServiceError::NotFound(token.to_string()))?;

        if link.is_expired() {
            warn!("Expired share link {} requested", link.id);
            return Err(ShareServiceError::Expired);
        }
        if file.is_trashed() {
            debug!("Share link {} points to a trashed file", link.id);
            return Err(ShareServiceError::FileNotFound(file.id().to_string()));
        }

        Ok((link, file))
    }

    /// Public information shown on the share page
    #[instrument(skip(self))]
    pub async fn shared_file(&self, token: &str) -> Result<SharedFileDto, DomainError> {
        let (link, file) = self.resolve(token).await?;
        Ok(SharedFileDto {
            file: PublicFileDto::from(&file),
            expires_at: link.expires_at,
            download_count: link.download_count,
            download_url: format!("/api/shared/download/{}", link.token),
        })
    }

    /// Public download; every successful call counts as one download
    #[instrument(skip(self))]
    pub async fn download_shared(&self, token: &str) -> Result<(File, BlobStream), DomainError> {
        let (link, file) = self.resolve(token).await?;

        let stream = self
            .blob_repository
            .open(file.storage_path())
            .await
            .map_err(|e| match e {
                BlobRepositoryError::NotFound(_) => DomainError::not_found("File", file.id()),
                other => DomainError::internal_error("File", other.to_string()),
            })?;

        self.share_repository.increment_download_count(&link.id).await?;
        Ok((file, stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::errors::ErrorKind;
    use crate::test_support::{MemoryShareRepository, TestTree};
    use chrono::{Duration, Utc};

    struct Fixture {
        tree: TestTree,
        shares: Arc<MemoryShareRepository>,
        service: ShareService,
    }

    fn fixture() -> Fixture {
        let tree = TestTree::new();
        let shares = Arc::new(MemoryShareRepository::new(tree.files.clone()));
        let service = ShareService::new(shares.clone(), tree.files.clone(), tree.blobs.clone());
        Fixture { tree, shares, service }
    }

    fn create(file_id: &str, days: Option<u32>) -> CreateShareDto {
        CreateShareDto { file_id: file_id.to_string(), expires_in_days: days }
    }

    #[tokio::test]
    async fn test_create_and_download_counts() {
        let fx = fixture();
        let file_id = fx.tree.file("report.pdf", None).await;

        let dto = fx.service.create_link(create(&file_id, Some(7)), TestTree::OWNER).await.unwrap();
        assert_eq!(dto.url, format!("/shared/{}", dto.link.token));
        assert!(dto.link.expires_at.is_some());

        fx.service.download_shared(&dto.link.token).await.unwrap();
        fx.service.download_shared(&dto.link.token).await.unwrap();

        let info = fx.service.shared_file(&dto.link.token).await.unwrap();
        assert_eq!(info.download_count, 2);
        assert_eq!(info.file.name, "report.pdf");
    }

    #[tokio::test]
    async fn test_create_rejects_foreign_file_and_bad_expiry() {
        let fx = fixture();
        let file_id = fx.tree.file("a.txt", None).await;

        let err = fx.service.create_link(create(&file_id, None), "intruder").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);

        let err = fx.service.create_link(create(&file_id, Some(0)), TestTree::OWNER).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);

        let err = fx.service.create_link(create(&file_id, Some(366)), TestTree::OWNER).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_expired_and_unknown_tokens() {
        let fx = fixture();
        let file_id = fx.tree.file("a.txt", None).await;
        let mut link = SharedLink::new(file_id, Some(1)).unwrap();
        link.expires_at = Some(Utc::now() - Duration::hours(1));
        fx.shares.insert(link.clone());

        let err = fx.service.shared_file(&link.token).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Expired);

        let err = fx.service.download_shared("no-such-token").await.err().unwrap();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_revoke_is_owner_checked() {
        let fx = fixture();
        let file_id = fx.tree.file("a.txt", None).await;
        let dto = fx.service.create_link(create(&file_id, None), TestTree::OWNER).await.unwrap();

        let err = fx.service.revoke_link(&dto.link.id, "intruder").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);

        fx.service.revoke_link(&dto.link.id, TestTree::OWNER).await.unwrap();
        let err = fx.service.link_for_file(&file_id, TestTree::OWNER).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
}
