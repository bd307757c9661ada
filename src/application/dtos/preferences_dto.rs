use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::user_preferences::{Theme, UserPreferences, ViewMode};

#[derive(Debug, Clone, Serialize)]
pub struct PreferencesDto {
    pub user_id: String,
    pub view_mode: ViewMode,
    pub theme: Theme,
    pub storage_quota_bytes: u64,
    pub updated_at: DateTime<Utc>,
}

impl From<UserPreferences> for PreferencesDto {
    fn from(preferences: UserPreferences) -> Self {
        Self {
            user_id: preferences.user_id,
            view_mode: preferences.view_mode,
            theme: preferences.theme,
            storage_quota_bytes: preferences.storage_quota_bytes,
            updated_at: preferences.updated_at,
        }
    }
}

/// Absent fields keep their stored value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePreferencesDto {
    #[serde(default)]
    pub view_mode: Option<ViewMode>,
    #[serde(default)]
    pub theme: Option<Theme>,
}
