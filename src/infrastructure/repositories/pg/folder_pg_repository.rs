use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::sync::Arc;

use crate::domain::entities::folder::Folder;
use crate::domain::repositories::folder_repository::{
    FolderRepository, FolderRepositoryError, FolderRepositoryResult, ListScope,
};

const FOLDER_COLUMNS: &str =
    "id, name, parent_id, user_id, is_trashed, is_favorite, trashed_at, created_at, updated_at";

pub struct FolderPgRepository {
    pool: Arc<PgPool>,
}

impl FolderPgRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    // Método auxiliar para mapear errores SQL a errores de dominio
    fn map_sqlx_error(err: sqlx::Error) -> FolderRepositoryError {
        match &err {
            sqlx::Error::RowNotFound => FolderRepositoryError::NotFound("Carpeta no encontrada".to_string()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                FolderRepositoryError::AlreadyExists(db_err.message().to_string())
            }
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                FolderRepositoryError::NotFound("Carpeta padre no encontrada".to_string())
            }
            _ => FolderRepositoryError::Store(format!("Error de base de datos: {}", err)),
        }
    }

    fn row_to_folder(row: &PgRow) -> Folder {
        Folder::from_record(
            row.get("id"),
            row.get("name"),
            row.get("parent_id"),
            row.get("user_id"),
            row.get("is_trashed"),
            row.get("is_favorite"),
            row.get("trashed_at"),
            row.get("created_at"),
            row.get("updated_at"),
        )
    }
}

#[async_trait]
impl FolderRepository for FolderPgRepository {
    async fn create_folder(&self, folder: &Folder) -> FolderRepositoryResult<Folder> {
        sqlx::query(
            r#"
            INSERT INTO folders (
                id, name, parent_id, user_id, is_trashed, is_favorite,
                trashed_at, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(folder.id())
        .bind(folder.name())
        .bind(folder.parent_id())
        .bind(folder.user_id())
        .bind(folder.is_trashed())
        .bind(folder.is_favorite())
        .bind(folder.trashed_at())
        .bind(folder.created_at())
        .bind(folder.updated_at())
        .execute(&*self.pool)
        .await
        .map_err(Self::map_sqlx_error)?;

        Ok(folder.clone())
    }

    async fn get_folder(&self, id: &str, owner_id: &str) -> FolderRepositoryResult<Option<Folder>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM folders WHERE id = $1 AND user_id = $2",
            FOLDER_COLUMNS
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(Self::map_sqlx_error)?;

        Ok(row.as_ref().map(Self::row_to_folder))
    }

    async fn list_children(
        &self,
        parent_id: Option<&str>,
        owner_id: &str,
        scope: ListScope,
    ) -> FolderRepositoryResult<Vec<Folder>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM folders
            WHERE user_id = $1
              AND parent_id IS NOT DISTINCT FROM $2
              AND ($3 OR NOT is_trashed)
            ORDER BY name
            "#,
            FOLDER_COLUMNS
        ))
        .bind(owner_id)
        .bind(parent_id)
        .bind(scope == ListScope::All)
        .fetch_all(&*self.pool)
        .await
        .map_err(Self::map_sqlx_error)?;

        Ok(rows.iter().map(Self::row_to_folder).collect())
    }

    async fn list_trashed(&self, owner_id: &str) -> FolderRepositoryResult<Vec<Folder>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM folders WHERE user_id = $1 AND is_trashed ORDER BY trashed_at DESC",
            FOLDER_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(&*self.pool)
        .await
        .map_err(Self::map_sqlx_error)?;

        Ok(rows.iter().map(Self::row_to_folder).collect())
    }

    async fn list_favorites(&self, owner_id: &str) -> FolderRepositoryResult<Vec<Folder>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM folders WHERE user_id = $1 AND is_favorite AND NOT is_trashed ORDER BY name",
            FOLDER_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(&*self.pool)
        .await
        .map_err(Self::map_sqlx_error)?;

        Ok(rows.iter().map(Self::row_to_folder).collect())
    }

    async fn count_folders(&self, owner_id: &str) -> FolderRepositoryResult<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM folders WHERE user_id = $1")
            .bind(owner_id)
            .fetch_one(&*self.pool)
            .await
            .map_err(Self::map_sqlx_error)?;

        let count: i64 = row.get("count");
        Ok(count.max(0) as u64)
    }

    /// Serialised per owner with an advisory lock; the ancestor check and
    /// the write happen in the same transaction.
    async fn update_parent(
        &self,
        id: &str,
        new_parent_id: Option<&str>,
        owner_id: &str,
    ) -> FolderRepositoryResult<()> {
        let mut tx = self.pool.begin().await.map_err(Self::map_sqlx_error)?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(owner_id)
            .execute(&mut *tx)
            .await
            .map_err(Self::map_sqlx_error)?;

        if let Some(parent_id) = new_parent_id {
            let row = sqlx::query(
                r#"
                WITH RECURSIVE ancestors(id, parent_id) AS (
                    SELECT id, parent_id FROM folders WHERE id = $1 AND user_id = $2
                    UNION
                    SELECT f.id, f.parent_id
                    FROM folders f
                    JOIN ancestors a ON f.id = a.parent_id
                    WHERE f.user_id = $2
                )
                SELECT
                    EXISTS (SELECT 1 FROM ancestors WHERE id = $1) AS parent_found,
                    EXISTS (SELECT 1 FROM ancestors WHERE id = $3) AS would_cycle
                "#,
            )
            .bind(parent_id)
            .bind(owner_id)
            .bind(id)
            .fetch_one(&mut *tx)
            .await
            .map_err(Self::map_sqlx_error)?;

            if !row.get::<bool, _>("parent_found") {
                return Err(FolderRepositoryError::NotFound(parent_id.to_string()));
            }
            if row.get::<bool, _>("would_cycle") {
                return Err(FolderRepositoryError::WouldCycle(id.to_string()));
            }
        }

        let result = sqlx::query(
            "UPDATE folders SET parent_id = $1, updated_at = NOW() WHERE id = $2 AND user_id = $3",
        )
        .bind(new_parent_id)
        .bind(id)
        .bind(owner_id)
        .execute(&mut *tx)
        .await
        .map_err(Self::map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(FolderRepositoryError::NotFound(id.to_string()));
        }

        tx.commit().await.map_err(Self::map_sqlx_error)?;
        Ok(())
    }

    async fn rename_folder(&self, id: &str, new_name: &str, owner_id: &str) -> FolderRepositoryResult<Folder> {
        let row = sqlx::query(&format!(
            "UPDATE folders SET name = $1, updated_at = NOW() WHERE id = $2 AND user_id = $3 RETURNING {}",
            FOLDER_COLUMNS
        ))
        .bind(new_name)
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(Self::map_sqlx_error)?;

        row.as_ref()
            .map(Self::row_to_folder)
            .ok_or_else(|| FolderRepositoryError::NotFound(id.to_string()))
    }

    async fn set_favorite(&self, id: &str, is_favorite: bool, owner_id: &str) -> FolderRepositoryResult<()> {
        let result = sqlx::query(
            "UPDATE folders SET is_favorite = $1, updated_at = NOW() WHERE id = $2 AND user_id = $3",
        )
        .bind(is_favorite)
        .bind(id)
        .bind(owner_id)
        .execute(&*self.pool)
        .await
        .map_err(Self::map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(FolderRepositoryError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn set_trashed(
        &self,
        ids: &[String],
        trashed: bool,
        owner_id: &str,
    ) -> FolderRepositoryResult<Vec<String>> {
        let rows = sqlx::query(
            r#"
            UPDATE folders
            SET is_trashed = $1,
                trashed_at = CASE WHEN $1 THEN NOW() ELSE NULL END,
                updated_at = NOW()
            WHERE id = ANY($2) AND user_id = $3
            RETURNING id
            "#,
        )
        .bind(trashed)
        .bind(ids)
        .bind(owner_id)
        .fetch_all(&*self.pool)
        .await
        .map_err(Self::map_sqlx_error)?;

        Ok(rows.iter().map(|row| row.get("id")).collect())
    }

    async fn delete_folders(&self, ids: &[String], owner_id: &str) -> FolderRepositoryResult<Vec<String>> {
        let rows = sqlx::query("DELETE FROM folders WHERE id = ANY($1) AND user_id = $2 RETURNING id")
            .bind(ids)
            .bind(owner_id)
            .fetch_all(&*self.pool)
            .await
            .map_err(Self::map_sqlx_error)?;

        Ok(rows.iter().map(|row| row.get("id")).collect())
    }
}
