use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::sync::Arc;

use crate::common::errors::{DomainError, Result};
use crate::domain::entities::file::File;
use crate::domain::entities::share::SharedLink;
use crate::domain::repositories::share_repository::ShareRepository;
use crate::infrastructure::repositories::pg::file_pg_repository::FilePgRepository;

pub struct SharePgRepository {
    pool: Arc<PgPool>,
}

impl SharePgRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    fn map_sqlx_error(err: sqlx::Error) -> DomainError {
        DomainError::internal_error("Share", format!("Error de base de datos: {}", err))
    }

    fn row_to_link(row: &PgRow) -> SharedLink {
        let download_count: i64 = row.get("download_count");
        SharedLink {
            id: row.get("id"),
            file_id: row.get("file_id"),
            token: row.get("token"),
            expires_at: row.get("expires_at"),
            download_count: download_count.max(0) as u64,
            created_at: row.get("created_at"),
        }
    }
}

#[async_trait]
impl ShareRepository for SharePgRepository {
    async fn create_link(&self, link: &SharedLink) -> Result<SharedLink> {
        sqlx::query(
            r#"
            INSERT INTO shared_links (id, file_id, token, expires_at, download_count, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&link.id)
        .bind(&link.file_id)
        .bind(&link.token)
        .bind(link.expires_at)
        .bind(link.download_count as i64)
        .bind(link.created_at)
        .execute(&*self.pool)
        .await
        .map_err(Self::map_sqlx_error)?;

        Ok(link.clone())
    }

    async fn find_by_file(&self, file_id: &str, owner_id: &str) -> Result<Option<SharedLink>> {
        let row = sqlx::query(
            r#"
            SELECT l.id, l.file_id, l.token, l.expires_at, l.download_count, l.created_at
            FROM shared_links l
            JOIN files f ON f.id = l.file_id
            WHERE l.file_id = $1 AND f.user_id = $2
            ORDER BY l.created_at DESC
            LIMIT 1
            "#,
        )
        .bind(file_id)
        .bind(owner_id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(Self::map_sqlx_error)?;

        Ok(row.as_ref().map(Self::row_to_link))
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<(SharedLink, File)>> {
        let row = sqlx::query(
            r#"
            SELECT
                l.id, l.file_id, l.token, l.expires_at, l.download_count, l.created_at,
                f.id AS f_id, f.name AS f_name, f.storage_path AS f_storage_path,
                f.size AS f_size, f.mime_type AS f_mime_type, f.folder_id AS f_folder_id,
                f.user_id AS f_user_id, f.is_trashed AS f_is_trashed,
                f.is_favorite AS f_is_favorite, f.trashed_at AS f_trashed_at,
                f.created_at AS f_created_at, f.updated_at AS f_updated_at
            FROM shared_links l
            JOIN files f ON f.id = l.file_id
            WHERE l.token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&*self.pool)
        .await
        .map_err(Self::map_sqlx_error)?;

        Ok(row
            .as_ref()
            .map(|row| (Self::row_to_link(row), FilePgRepository::row_to_file(row, "f_"))))
    }

    async fn delete_link(&self, id: &str, owner_id: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM shared_links l
            USING files f
            WHERE l.id = $1 AND f.id = l.file_id AND f.user_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .execute(&*self.pool)
        .await
        .map_err(Self::map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn increment_download_count(&self, id: &str) -> Result<()> {
        sqlx::query("UPDATE shared_links SET download_count = download_count + 1 WHERE id = $1")
            .bind(id)
            .execute(&*self.pool)
            .await
            .map_err(Self::map_sqlx_error)?;

        Ok(())
    }
}
