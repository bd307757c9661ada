use async_trait::async_trait;

use crate::common::errors::Result;
use crate::domain::entities::user_preferences::UserPreferences;

#[async_trait]
pub trait PreferencesRepository: Send + Sync + 'static {
    async fn get_preferences(&self, user_id: &str) -> Result<Option<UserPreferences>>;

    /// Inserts or replaces the row keyed by `user_id`
    async fn upsert_preferences(&self, preferences: &UserPreferences) -> Result<UserPreferences>;
}
