use std::sync::Arc;

use tracing::{info, instrument};

use crate::application::dtos::preferences_dto::{PreferencesDto, UpdatePreferencesDto};
use crate::common::errors::Result;
use crate::domain::entities::user_preferences::UserPreferences;
use crate::domain::repositories::preferences_repository::PreferencesRepository;

pub struct PreferencesService {
    preferences_repository: Arc<dyn PreferencesRepository>,
    default_quota_bytes: u64,
}

impl PreferencesService {
    pub fn new(preferences_repository: Arc<dyn PreferencesRepository>, default_quota_bytes: u64) -> Self {
        Self {
            preferences_repository,
            default_quota_bytes,
        }
    }

    /// Stored preferences; `None` until the user saves something
    pub async fn get(&self, owner_id: &str) -> Result<Option<PreferencesDto>> {
        Ok(self
            .preferences_repository
            .get_preferences(owner_id)
            .await?
            .map(PreferencesDto::from))
    }

    /// Updates display settings, creating the row on first use
    #[instrument(skip(self, dto))]
    pub async fn update(&self, owner_id: &str, dto: UpdatePreferencesDto) -> Result<PreferencesDto> {
        let current = match self.preferences_repository.get_preferences(owner_id).await? {
            Some(existing) => existing,
            None => {
                let mut fresh = UserPreferences::defaults_for(owner_id.to_string());
                fresh.storage_quota_bytes = self.default_quota_bytes;
                fresh
            }
        };

        let updated = current.with_display(dto.view_mode, dto.theme);
        let saved = self.preferences_repository.upsert_preferences(&updated).await?;

        info!("Preferences saved for user {}", owner_id);
        Ok(PreferencesDto::from(saved))
    }
}
