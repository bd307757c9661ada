use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, instrument, warn};

use crate::application::dtos::batch_dto::{BatchItemsRequest, MoveItemsRequest};
use crate::common::errors::{DomainError, ErrorKind, Result};
use crate::domain::repositories::blob_repository::BlobRepository;
use crate::domain::repositories::file_repository::FileRepository;
use crate::domain::repositories::folder_repository::{FolderRepository, FolderRepositoryError};
use crate::domain::services::tree_validator::{MoveCheck, MoveRejection, TreeValidator};

const FILE_NOT_FOUND: &str = "File not found";
const FOLDER_NOT_FOUND: &str = "Folder not found";

/// Resultado de una operación por lotes con estadísticas
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    /// IDs procesados con éxito
    pub successful: Vec<String>,
    /// Operaciones fallidas con sus errores
    pub failed: Vec<(String, String)>,
    /// Estadísticas de la operación
    pub stats: BatchStats,
}

/// Estadísticas de una operación por lotes
#[derive(Debug, Clone, Default)]
pub struct BatchStats {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    /// Tiempo total de ejecución en milisegundos
    pub execution_time_ms: u128,
}

impl BatchResult {
    fn with_total(total: usize) -> Self {
        Self {
            stats: BatchStats { total, ..Default::default() },
            ..Default::default()
        }
    }

    fn succeed(&mut self, id: &str) {
        self.successful.push(id.to_string());
        self.stats.successful += 1;
    }

    fn fail<S: Into<String>>(&mut self, id: &str, reason: S) {
        self.failed.push((id.to_string(), reason.into()));
        self.stats.failed += 1;
    }

    fn finish(mut self, started: Instant) -> Self {
        self.stats.execution_time_ms = started.elapsed().as_millis();
        self
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Drops repeated ids, keeping the first occurrence
fn unique_ids(ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.iter().filter(|id| seen.insert(id.as_str())).cloned().collect()
}

/// Servicio de operaciones por lotes sobre la selección del usuario.
///
/// Each item succeeds or fails on its own; only a missing move target
/// fails a whole request.
pub struct BatchOperationService {
    folder_repository: Arc<dyn FolderRepository>,
    file_repository: Arc<dyn FileRepository>,
    blob_repository: Arc<dyn BlobRepository>,
    tree_validator: Arc<TreeValidator>,
}

impl BatchOperationService {
    pub fn new(
        folder_repository: Arc<dyn FolderRepository>,
        file_repository: Arc<dyn FileRepository>,
        blob_repository: Arc<dyn BlobRepository>,
        tree_validator: Arc<TreeValidator>,
    ) -> Self {
        Self {
            folder_repository,
            file_repository,
            blob_repository,
            tree_validator,
        }
    }

    /// Moves files and folders under `target_folder_id` (`None` = root)
    #[instrument(skip(self, request), fields(files = request.file_ids.len(), folders = request.folder_ids.len()))]
    pub async fn move_items(&self, request: &MoveItemsRequest, owner_id: &str) -> Result<BatchResult> {
        let started = Instant::now();
        let file_ids = unique_ids(&request.file_ids);
        let folder_ids = unique_ids(&request.folder_ids);
        let target = request.target_folder_id.as_deref().filter(|id| !id.is_empty());
        let mut result = BatchResult::with_total(file_ids.len() + folder_ids.len());

        if let Some(target_id) = target {
            if self.folder_repository.get_folder(target_id, owner_id).await?.is_none() {
                warn!("Move target {} not found for user {}", target_id, owner_id);
                return Err(DomainError::new(ErrorKind::NotFound, "Folder", "Target folder not found")
                    .with_id(target_id));
            }
        }

        if !file_ids.is_empty() {
            match self.file_repository.move_files(&file_ids, target, owner_id).await {
                Ok(moved) => {
                    let moved: HashSet<String> = moved.into_iter().collect();
                    for id in &file_ids {
                        if moved.contains(id) {
                            result.succeed(id);
                        } else {
                            result.fail(id, FILE_NOT_FOUND);
                        }
                    }
                }
                Err(e) => {
                    error!("Bulk file move failed: {}", e);
                    for id in &file_ids {
                        result.fail(id, e.to_string());
                    }
                }
            }
        }

        // Las carpetas se validan una a una; un rechazo no bloquea al resto
        for folder_id in &folder_ids {
            match self.move_folder(folder_id, target, owner_id).await {
                Ok(()) => result.succeed(folder_id),
                Err(reason) => result.fail(folder_id, reason),
            }
        }

        let result = result.finish(started);
        info!(
            "Movimiento en lote completado: {}/{} exitosas en {}ms",
            result.stats.successful, result.stats.total, result.stats.execution_time_ms
        );
        Ok(result)
    }

    async fn move_folder(&self, folder_id: &str, target: Option<&str>, owner_id: &str) -> std::result::Result<(), String> {
        match self.folder_repository.get_folder(folder_id, owner_id).await {
            Ok(Some(_)) => {}
            Ok(None) => return Err(FOLDER_NOT_FOUND.to_string()),
            Err(e) => return Err(e.to_string()),
        }

        match self.tree_validator.can_move(folder_id, target, owner_id).await {
            Ok(MoveCheck::Allowed) => {}
            Ok(MoveCheck::Rejected(rejection)) => {
                warn!("Move of folder {} rejected: {}", folder_id, rejection);
                return Err(rejection.reason().to_string());
            }
            Err(e) => {
                error!("Tree walk failed while moving folder {}: {}", folder_id, e);
                return Err(e.to_string());
            }
        }

        match self.folder_repository.update_parent(folder_id, target, owner_id).await {
            Ok(()) => {
                debug!("Folder {} moved under {:?}", folder_id, target);
                Ok(())
            }
            Err(FolderRepositoryError::WouldCycle(_)) => {
                warn!("Concurrent move closed a cycle for folder {}", folder_id);
                Err(MoveRejection::CyclicMove.reason().to_string())
            }
            Err(FolderRepositoryError::NotFound(_)) => Err(FOLDER_NOT_FOUND.to_string()),
            Err(e) => Err(e.to_string()),
        }
    }

    /// Soft delete: flags the items as trashed
    #[instrument(skip(self, request))]
    pub async fn trash_items(&self, request: &BatchItemsRequest, owner_id: &str) -> Result<BatchResult> {
        self.set_trashed(request, true, owner_id).await
    }

    /// Clears the trash flag
    #[instrument(skip(self, request))]
    pub async fn restore_items(&self, request: &BatchItemsRequest, owner_id: &str) -> Result<BatchResult> {
        self.set_trashed(request, false, owner_id).await
    }

    async fn set_trashed(&self, request: &BatchItemsRequest, trashed: bool, owner_id: &str) -> Result<BatchResult> {
        let started = Instant::now();
        let file_ids = unique_ids(&request.file_ids);
        let folder_ids = unique_ids(&request.folder_ids);
        let mut result = BatchResult::with_total(file_ids.len() + folder_ids.len());

        if !file_ids.is_empty() {
            let updated = self
                .file_repository
                .set_trashed(&file_ids, trashed, owner_id)
                .await
                .map_err(|e| e.to_string());
            Self::record_bulk(&mut result, &file_ids, updated, FILE_NOT_FOUND);
        }

        if !folder_ids.is_empty() {
            let updated = self
                .folder_repository
                .set_trashed(&folder_ids, trashed, owner_id)
                .await
                .map_err(|e| e.to_string());
            Self::record_bulk(&mut result, &folder_ids, updated, FOLDER_NOT_FOUND);
        }

        let result = result.finish(started);
        info!(
            "{} en lote completado: {}/{} exitosas",
            if trashed { "Papelera" } else { "Restauración" },
            result.stats.successful,
            result.stats.total
        );
        Ok(result)
    }

    fn record_bulk(
        result: &mut BatchResult,
        requested: &[String],
        outcome: std::result::Result<Vec<String>, String>,
        missing_reason: &str,
    ) {
        match outcome {
            Ok(updated) => {
                let updated: HashSet<String> = updated.into_iter().collect();
                for id in requested {
                    if updated.contains(id) {
                        result.succeed(id);
                    } else {
                        result.fail(id, missing_reason);
                    }
                }
            }
            Err(reason) => {
                error!("Bulk update failed: {}", reason);
                for id in requested {
                    result.fail(id, reason.clone());
                }
            }
        }
    }

    /// Removes items for good: blobs first, records only once their blobs
    /// are gone. A partially failed request can be repeated as-is.
    #[instrument(skip(self, request), fields(files = request.file_ids.len(), folders = request.folder_ids.len()))]
    pub async fn delete_permanently(&self, request: &BatchItemsRequest, owner_id: &str) -> Result<BatchResult> {
        let started = Instant::now();
        let file_ids = unique_ids(&request.file_ids);
        let folder_ids = unique_ids(&request.folder_ids);
        let mut result = BatchResult::with_total(file_ids.len() + folder_ids.len());

        if !file_ids.is_empty() {
            self.purge_files(&file_ids, owner_id, &mut result).await;
        }

        let mut removed_folders: HashSet<String> = HashSet::new();
        for folder_id in &folder_ids {
            if removed_folders.contains(folder_id) {
                debug!("Folder {} already removed with an earlier subtree", folder_id);
                result.succeed(folder_id);
                continue;
            }

            match self.purge_folder(folder_id, owner_id).await {
                Ok(removed) => {
                    removed_folders.extend(removed);
                    result.succeed(folder_id);
                }
                Err(reason) => result.fail(folder_id, reason),
            }
        }

        let result = result.finish(started);
        info!(
            "Eliminación permanente completada: {}/{} exitosas en {}ms",
            result.stats.successful, result.stats.total, result.stats.execution_time_ms
        );
        Ok(result)
    }

    async fn purge_files(&self, file_ids: &[String], owner_id: &str, result: &mut BatchResult) {
        let files = match self.file_repository.get_files(file_ids, owner_id).await {
            Ok(files) => files,
            Err(e) => {
                error!("Could not load files for permanent delete: {}", e);
                for id in file_ids {
                    result.fail(id, e.to_string());
                }
                return;
            }
        };

        let paths: Vec<String> = files.iter().map(|f| f.storage_path().to_string()).collect();
        let removal = self.blob_repository.remove(&paths).await;
        let blob_failures: HashMap<&str, &str> = removal
            .failed
            .iter()
            .map(|(path, reason)| (path.as_str(), reason.as_str()))
            .collect();

        let mut deletable = Vec::new();
        let mut found = HashSet::new();
        for file in &files {
            found.insert(file.id().to_string());
            match blob_failures.get(file.storage_path()) {
                Some(reason) => {
                    warn!("Keeping record of file {}: blob removal failed", file.id());
                    result.fail(file.id(), format!("Blob removal failed: {}", reason));
                }
                None => deletable.push(file.id().to_string()),
            }
        }

        for id in file_ids.iter().filter(|id| !found.contains(*id)) {
            result.fail(id, FILE_NOT_FOUND);
        }

        if deletable.is_empty() {
            return;
        }

        let outcome = self
            .file_repository
            .delete_files(&deletable, owner_id)
            .await
            .map_err(|e| e.to_string());
        Self::record_bulk(result, &deletable, outcome, FILE_NOT_FOUND);
    }

    /// Deletes one folder subtree. Returns every folder id that was removed.
    async fn purge_folder(&self, root_id: &str, owner_id: &str) -> std::result::Result<Vec<String>, String> {
        match self.folder_repository.get_folder(root_id, owner_id).await {
            Ok(Some(_)) => {}
            Ok(None) => return Err(FOLDER_NOT_FOUND.to_string()),
            Err(e) => return Err(e.to_string()),
        }

        let subtree = self
            .tree_validator
            .collect_subtree(&[root_id.to_string()], owner_id)
            .await
            .map_err(|e| {
                error!("Subtree collection of folder {} failed: {}", root_id, e);
                e.to_string()
            })?;

        let removal = self.blob_repository.remove(&subtree.storage_paths).await;
        if !removal.is_complete() {
            warn!(
                "Folder {}: {} of {} blobs could not be removed, records kept",
                root_id,
                removal.failed.len(),
                subtree.storage_paths.len()
            );
            return Err(format!(
                "Could not remove {} stored file(s); the folder was kept and can be deleted again",
                removal.failed.len()
            ));
        }

        if !subtree.file_ids.is_empty() {
            self.file_repository
                .delete_files(&subtree.file_ids, owner_id)
                .await
                .map_err(|e| e.to_string())?;
        }

        let children_first: Vec<String> = subtree.folder_ids.iter().rev().cloned().collect();
        self.folder_repository
            .delete_folders(&children_first, owner_id)
            .await
            .map_err(|e| e.to_string())?;

        debug!(
            "Folder {} purged with {} folders and {} files",
            root_id,
            subtree.folder_ids.len(),
            subtree.file_ids.len()
        );
        Ok(subtree.folder_ids)
    }
}
