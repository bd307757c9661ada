use serde::{Deserialize, Serialize};

use crate::application::services::batch_operations::{BatchResult, BatchStats};

/// Files and folders selected in the browser
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItemsRequest {
    #[serde(default)]
    pub file_ids: Vec<String>,
    #[serde(default)]
    pub folder_ids: Vec<String>,
}

/// Move request; a missing target means the root
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveItemsRequest {
    #[serde(default)]
    pub file_ids: Vec<String>,
    #[serde(default)]
    pub folder_ids: Vec<String>,
    #[serde(default)]
    pub target_folder_id: Option<String>,
}

/// Renames a file when `target_file_id` is set, otherwise a folder
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameRequest {
    #[serde(default)]
    pub target_file_id: Option<String>,
    #[serde(default)]
    pub target_folder_id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteRequest {
    #[serde(default)]
    pub file_id: Option<String>,
    #[serde(default)]
    pub folder_id: Option<String>,
    pub is_favorite: bool,
}

/// Operación fallida en un lote
#[derive(Debug, Clone, Serialize)]
pub struct FailedOperation {
    /// Identificador de la entidad que falló
    pub id: String,
    /// Mensaje de error
    pub error: String,
}

/// Estadísticas de una operación por lotes
#[derive(Debug, Clone, Serialize)]
pub struct BatchOperationStats {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    /// Tiempo total de ejecución en milisegundos
    pub execution_time_ms: u128,
}

impl From<BatchStats> for BatchOperationStats {
    fn from(stats: BatchStats) -> Self {
        Self {
            total: stats.total,
            successful: stats.successful,
            failed: stats.failed,
            execution_time_ms: stats.execution_time_ms,
        }
    }
}

/// Body of every batch endpoint
#[derive(Debug, Clone, Serialize)]
pub struct BatchOperationResponse {
    pub success: bool,
    /// One readable line per failed item
    pub errors: Vec<String>,
    pub failed: Vec<FailedOperation>,
    pub stats: BatchOperationStats,
}

impl From<BatchResult> for BatchOperationResponse {
    fn from(result: BatchResult) -> Self {
        let errors = result
            .failed
            .iter()
            .map(|(id, error)| format!("{}: {}", id, error))
            .collect();

        let failed = result
            .failed
            .into_iter()
            .map(|(id, error)| FailedOperation { id, error })
            .collect::<Vec<_>>();

        Self {
            success: failed.is_empty(),
            errors,
            failed,
            stats: result.stats.into(),
        }
    }
}
