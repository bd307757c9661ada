use sqlx::{postgres::PgPoolOptions, Executor, PgPool};
use anyhow::Result;
use std::time::Duration;
use crate::common::config::AppConfig;

const MAX_ATTEMPTS: usize = 3;

/// Esquema mínimo de la aplicación. Idempotente: se ejecuta en cada arranque.
const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS folders (
        id VARCHAR(36) PRIMARY KEY,
        name TEXT NOT NULL,
        parent_id VARCHAR(36) REFERENCES folders(id) ON DELETE CASCADE,
        user_id VARCHAR(64) NOT NULL,
        is_trashed BOOLEAN NOT NULL DEFAULT FALSE,
        is_favorite BOOLEAN NOT NULL DEFAULT FALSE,
        trashed_at TIMESTAMPTZ,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    );

    CREATE INDEX IF NOT EXISTS idx_folders_user_parent ON folders(user_id, parent_id);

    CREATE TABLE IF NOT EXISTS files (
        id VARCHAR(36) PRIMARY KEY,
        name TEXT NOT NULL,
        storage_path TEXT NOT NULL UNIQUE,
        size BIGINT NOT NULL DEFAULT 0,
        mime_type TEXT,
        folder_id VARCHAR(36) REFERENCES folders(id) ON DELETE CASCADE,
        user_id VARCHAR(64) NOT NULL,
        is_trashed BOOLEAN NOT NULL DEFAULT FALSE,
        is_favorite BOOLEAN NOT NULL DEFAULT FALSE,
        trashed_at TIMESTAMPTZ,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    );

    CREATE INDEX IF NOT EXISTS idx_files_user_folder ON files(user_id, folder_id);

    CREATE TABLE IF NOT EXISTS shared_links (
        id VARCHAR(36) PRIMARY KEY,
        file_id VARCHAR(36) NOT NULL REFERENCES files(id) ON DELETE CASCADE,
        token VARCHAR(64) NOT NULL UNIQUE,
        expires_at TIMESTAMPTZ,
        download_count BIGINT NOT NULL DEFAULT 0,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    );

    CREATE INDEX IF NOT EXISTS idx_shared_links_file ON shared_links(file_id);

    CREATE TABLE IF NOT EXISTS user_preferences (
        user_id VARCHAR(64) PRIMARY KEY,
        view_mode VARCHAR(16) NOT NULL DEFAULT 'grid',
        theme VARCHAR(16) NOT NULL DEFAULT 'system',
        storage_quota_bytes BIGINT NOT NULL DEFAULT 5368709120,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    );
"#;

pub async fn create_database_pool(config: &AppConfig) -> Result<PgPool> {
    tracing::info!("Inicializando conexión a PostgreSQL con URL: {}",
                  redact_connection_string(&config.database.connection_string));

    let mut attempt = 0;

    while attempt < MAX_ATTEMPTS {
        attempt += 1;
        tracing::info!("Intento de conexión a PostgreSQL #{}", attempt);

        match PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .min_connections(config.database.min_connections)
            .acquire_timeout(Duration::from_secs(config.database.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.database.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(config.database.max_lifetime_secs))
            .connect(&config.database.connection_string)
            .await {
                Ok(pool) => {
                    if let Err(e) = sqlx::query("SELECT 1").execute(&pool).await {
                        tracing::error!("Error al verificar conexión: {}", e);
                        if attempt >= MAX_ATTEMPTS {
                            return Err(anyhow::anyhow!("Error en la conexión a PostgreSQL: {}", e));
                        }
                        continue;
                    }

                    // Consulta simple (sin preparar): admite varias sentencias
                    match pool.execute(SCHEMA).await {
                        Ok(_) => {
                            tracing::info!("Conexión a PostgreSQL establecida y esquema verificado");
                            return Ok(pool);
                        },
                        Err(table_err) => {
                            tracing::error!("Error al crear tablas: {}", table_err);
                            if attempt >= MAX_ATTEMPTS {
                                return Err(anyhow::anyhow!("Error creando el esquema: {}", table_err));
                            }
                        }
                    }
                },
                Err(e) => {
                    tracing::error!("Error al conectar a PostgreSQL: {}", e);
                    if attempt >= MAX_ATTEMPTS {
                        return Err(anyhow::anyhow!("Error en la conexión a PostgreSQL: {}", e));
                    }
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
    }

    Err(anyhow::anyhow!("No se pudo establecer la conexión a PostgreSQL después de {} intentos", MAX_ATTEMPTS))
}

/// Oculta las credenciales de una URL de conexión antes de registrarla
fn redact_connection_string(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}[user]:[pass]{}", &url[..scheme_end + 3], &url[at..])
        },
        _ => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_connection_string() {
        assert_eq!(
            redact_connection_string("postgres://alice:secret@db:5432/vault"),
            "postgres://[user]:[pass]@db:5432/vault"
        );
        assert_eq!(redact_connection_string("postgres://db/vault"), "postgres://db/vault");
    }
}
