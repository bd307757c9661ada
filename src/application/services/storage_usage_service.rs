use std::sync::Arc;

use tracing::instrument;

use crate::application::dtos::storage_dto::StorageUsageDto;
use crate::common::errors::Result;
use crate::domain::entities::user_preferences::UserPreferences;
use crate::domain::repositories::file_repository::FileRepository;
use crate::domain::repositories::preferences_repository::PreferencesRepository;

/// Computes the storage meter shown in the sidebar
pub struct StorageUsageService {
    file_repository: Arc<dyn FileRepository>,
    preferences_repository: Arc<dyn PreferencesRepository>,
    default_quota_bytes: u64,
}

impl StorageUsageService {
    pub fn new(
        file_repository: Arc<dyn FileRepository>,
        preferences_repository: Arc<dyn PreferencesRepository>,
        default_quota_bytes: u64,
    ) -> Self {
        Self {
            file_repository,
            preferences_repository,
            default_quota_bytes,
        }
    }

    /// Bytes used by non-trashed files against the user's quota
    #[instrument(skip(self))]
    pub async fn usage(&self, owner_id: &str) -> Result<StorageUsageDto> {
        let used = self.file_repository.total_size(owner_id).await?;
        let preferences = self.preferences_repository.get_preferences(owner_id).await?;
        let quota = UserPreferences::effective_quota(preferences.as_ref(), self.default_quota_bytes);

        Ok(StorageUsageDto::new(used, quota))
    }
}
