use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::sync::Arc;

use crate::common::errors::{DomainError, Result};
use crate::domain::entities::user_preferences::UserPreferences;
use crate::domain::repositories::preferences_repository::PreferencesRepository;

pub struct PreferencesPgRepository {
    pool: Arc<PgPool>,
}

impl PreferencesPgRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    fn row_to_preferences(row: &PgRow) -> Result<UserPreferences> {
        let view_mode: String = row.get("view_mode");
        let theme: String = row.get("theme");
        let quota: i64 = row.get("storage_quota_bytes");

        Ok(UserPreferences {
            user_id: row.get("user_id"),
            view_mode: view_mode
                .parse()
                .map_err(|e: String| DomainError::internal_error("Preferences", e))?,
            theme: theme
                .parse()
                .map_err(|e: String| DomainError::internal_error("Preferences", e))?,
            storage_quota_bytes: quota.max(0) as u64,
            updated_at: row.get("updated_at"),
        })
    }
}

#[async_trait]
impl PreferencesRepository for PreferencesPgRepository {
    async fn get_preferences(&self, user_id: &str) -> Result<Option<UserPreferences>> {
        let row = sqlx::query(
            "SELECT user_id, view_mode, theme, storage_quota_bytes, updated_at \
             FROM user_preferences WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&*self.pool)
        .await?;

        row.as_ref().map(Self::row_to_preferences).transpose()
    }

    async fn upsert_preferences(&self, preferences: &UserPreferences) -> Result<UserPreferences> {
        let row = sqlx::query(
            r#"
            INSERT INTO user_preferences (user_id, view_mode, theme, storage_quota_bytes, updated_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (user_id) DO UPDATE
            SET view_mode = EXCLUDED.view_mode,
                theme = EXCLUDED.theme,
                updated_at = NOW()
            RETURNING user_id, view_mode, theme, storage_quota_bytes, updated_at
            "#,
        )
        .bind(&preferences.user_id)
        .bind(preferences.view_mode.to_string())
        .bind(preferences.theme.to_string())
        .bind(preferences.storage_quota_bytes as i64)
        .fetch_one(&*self.pool)
        .await?;

        Self::row_to_preferences(&row)
    }
}
