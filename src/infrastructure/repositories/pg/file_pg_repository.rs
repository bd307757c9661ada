use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::sync::Arc;

use crate::domain::entities::file::File;
use crate::domain::repositories::file_repository::{FileRepository, FileRepositoryError, FileRepositoryResult};
use crate::domain::repositories::folder_repository::ListScope;

pub(crate) const FILE_COLUMNS: &str = "id, name, storage_path, size, mime_type, folder_id, user_id, \
     is_trashed, is_favorite, trashed_at, created_at, updated_at";

pub struct FilePgRepository {
    pool: Arc<PgPool>,
}

impl FilePgRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    fn map_sqlx_error(err: sqlx::Error) -> FileRepositoryError {
        match &err {
            sqlx::Error::RowNotFound => FileRepositoryError::NotFound("Archivo no encontrado".to_string()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                FileRepositoryError::AlreadyExists(db_err.message().to_string())
            }
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                FileRepositoryError::NotFound("Carpeta no encontrada".to_string())
            }
            _ => FileRepositoryError::Store(format!("Error de base de datos: {}", err)),
        }
    }

    /// Maps a row selected with `FILE_COLUMNS`, optionally behind a prefix
    pub(crate) fn row_to_file(row: &PgRow, prefix: &str) -> File {
        let col = |name: &str| format!("{}{}", prefix, name);
        let size: i64 = row.get(col("size").as_str());

        File::from_record(
            row.get(col("id").as_str()),
            row.get(col("name").as_str()),
            row.get(col("storage_path").as_str()),
            size.max(0) as u64,
            row.get(col("mime_type").as_str()),
            row.get(col("folder_id").as_str()),
            row.get(col("user_id").as_str()),
            row.get(col("is_trashed").as_str()),
            row.get(col("is_favorite").as_str()),
            row.get(col("trashed_at").as_str()),
            row.get(col("created_at").as_str()),
            row.get(col("updated_at").as_str()),
        )
    }

    fn rows_to_files(rows: &[PgRow]) -> Vec<File> {
        rows.iter().map(|row| Self::row_to_file(row, "")).collect()
    }

    async fn update_returning_ids(
        &self,
        sql: &str,
        flag: bool,
        ids: &[String],
        owner_id: &str,
    ) -> FileRepositoryResult<Vec<String>> {
        let rows = sqlx::query(sql)
            .bind(flag)
            .bind(ids)
            .bind(owner_id)
            .fetch_all(&*self.pool)
            .await
            .map_err(Self::map_sqlx_error)?;

        Ok(rows.iter().map(|row| row.get("id")).collect())
    }
}

#[async_trait]
impl FileRepository for FilePgRepository {
    async fn create_file(&self, file: &File) -> FileRepositoryResult<File> {
        sqlx::query(
            r#"
            INSERT INTO files (
                id, name, storage_path, size, mime_type, folder_id, user_id,
                is_trashed, is_favorite, trashed_at, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(file.id())
        .bind(file.name())
        .bind(file.storage_path())
        .bind(file.size() as i64)
        .bind(file.mime_type())
        .bind(file.folder_id())
        .bind(file.user_id())
        .bind(file.is_trashed())
        .bind(file.is_favorite())
        .bind(file.trashed_at())
        .bind(file.created_at())
        .bind(file.updated_at())
        .execute(&*self.pool)
        .await
        .map_err(Self::map_sqlx_error)?;

        Ok(file.clone())
    }

    async fn get_file(&self, id: &str, owner_id: &str) -> FileRepositoryResult<Option<File>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM files WHERE id = $1 AND user_id = $2",
            FILE_COLUMNS
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(Self::map_sqlx_error)?;

        Ok(row.as_ref().map(|row| Self::row_to_file(row, "")))
    }

    async fn get_files(&self, ids: &[String], owner_id: &str) -> FileRepositoryResult<Vec<File>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM files WHERE id = ANY($1) AND user_id = $2",
            FILE_COLUMNS
        ))
        .bind(ids)
        .bind(owner_id)
        .fetch_all(&*self.pool)
        .await
        .map_err(Self::map_sqlx_error)?;

        Ok(Self::rows_to_files(&rows))
    }

    async fn list_files(
        &self,
        folder_id: Option<&str>,
        owner_id: &str,
        scope: ListScope,
    ) -> FileRepositoryResult<Vec<File>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM files
            WHERE user_id = $1
              AND folder_id IS NOT DISTINCT FROM $2
              AND ($3 OR NOT is_trashed)
            ORDER BY name
            "#,
            FILE_COLUMNS
        ))
        .bind(owner_id)
        .bind(folder_id)
        .bind(scope == ListScope::All)
        .fetch_all(&*self.pool)
        .await
        .map_err(Self::map_sqlx_error)?;

        Ok(Self::rows_to_files(&rows))
    }

    async fn list_trashed(&self, owner_id: &str) -> FileRepositoryResult<Vec<File>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM files WHERE user_id = $1 AND is_trashed ORDER BY trashed_at DESC",
            FILE_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(&*self.pool)
        .await
        .map_err(Self::map_sqlx_error)?;

        Ok(Self::rows_to_files(&rows))
    }

    async fn list_favorites(&self, owner_id: &str) -> FileRepositoryResult<Vec<File>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM files WHERE user_id = $1 AND is_favorite AND NOT is_trashed ORDER BY name",
            FILE_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(&*self.pool)
        .await
        .map_err(Self::map_sqlx_error)?;

        Ok(Self::rows_to_files(&rows))
    }

    async fn move_files(
        &self,
        ids: &[String],
        target_folder_id: Option<&str>,
        owner_id: &str,
    ) -> FileRepositoryResult<Vec<String>> {
        let rows = sqlx::query(
            r#"
            UPDATE files SET folder_id = $1, updated_at = NOW()
            WHERE id = ANY($2) AND user_id = $3
            RETURNING id
            "#,
        )
        .bind(target_folder_id)
        .bind(ids)
        .bind(owner_id)
        .fetch_all(&*self.pool)
        .await
        .map_err(Self::map_sqlx_error)?;

        Ok(rows.iter().map(|row| row.get("id")).collect())
    }

    async fn rename_file(&self, id: &str, new_name: &str, owner_id: &str) -> FileRepositoryResult<File> {
        let row = sqlx::query(&format!(
            "UPDATE files SET name = $1, updated_at = NOW() WHERE id = $2 AND user_id = $3 RETURNING {}",
            FILE_COLUMNS
        ))
        .bind(new_name)
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(Self::map_sqlx_error)?;

        row.as_ref()
            .map(|row| Self::row_to_file(row, ""))
            .ok_or_else(|| FileRepositoryError::NotFound(id.to_string()))
    }

    async fn set_favorite(&self, id: &str, is_favorite: bool, owner_id: &str) -> FileRepositoryResult<()> {
        let updated = self
            .update_returning_ids(
                "UPDATE files SET is_favorite = $1, updated_at = NOW() \
                 WHERE id = ANY($2) AND user_id = $3 RETURNING id",
                is_favorite,
                &[id.to_string()],
                owner_id,
            )
            .await?;

        if updated.is_empty() {
            return Err(FileRepositoryError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn set_trashed(
        &self,
        ids: &[String],
        trashed: bool,
        owner_id: &str,
    ) -> FileRepositoryResult<Vec<String>> {
        self.update_returning_ids(
            r#"
            UPDATE files
            SET is_trashed = $1,
                trashed_at = CASE WHEN $1 THEN NOW() ELSE NULL END,
                updated_at = NOW()
            WHERE id = ANY($2) AND user_id = $3
            RETURNING id
            "#,
            trashed,
            ids,
            owner_id,
        )
        .await
    }

    async fn delete_files(&self, ids: &[String], owner_id: &str) -> FileRepositoryResult<Vec<String>> {
        let rows = sqlx::query("DELETE FROM files WHERE id = ANY($1) AND user_id = $2 RETURNING id")
            .bind(ids)
            .bind(owner_id)
            .fetch_all(&*self.pool)
            .await
            .map_err(Self::map_sqlx_error)?;

        Ok(rows.iter().map(|row| row.get("id")).collect())
    }

    async fn total_size(&self, owner_id: &str) -> FileRepositoryResult<u64> {
        let row = sqlx::query(
            "SELECT COALESCE(SUM(size), 0)::BIGINT AS total FROM files WHERE user_id = $1 AND NOT is_trashed",
        )
        .bind(owner_id)
        .fetch_one(&*self.pool)
        .await
        .map_err(Self::map_sqlx_error)?;

        let total: i64 = row.get("total");
        Ok(total.max(0) as u64)
    }
}
