use std::sync::Arc;

use sqlx::PgPool;

use crate::application::services::batch_operations::BatchOperationService;
use crate::application::services::file_service::FileService;
use crate::application::services::folder_service::FolderService;
use crate::application::services::preferences_service::PreferencesService;
use crate::application::services::share_service::ShareService;
use crate::application::services::storage_usage_service::StorageUsageService;
use crate::common::config::AppConfig;
use crate::common::errors::DomainError;
use crate::domain::repositories::blob_repository::BlobRepository;
use crate::domain::repositories::file_repository::FileRepository;
use crate::domain::repositories::folder_repository::FolderRepository;
use crate::domain::repositories::preferences_repository::PreferencesRepository;
use crate::domain::repositories::share_repository::ShareRepository;
use crate::domain::services::auth_service::AuthService;
use crate::domain::services::tree_validator::TreeValidator;
use crate::infrastructure::repositories::{
    BlobFsRepository, FilePgRepository, FolderPgRepository, PreferencesPgRepository, SharePgRepository,
};

/// Fábrica para los diferentes componentes de la aplicación
pub struct AppServiceFactory {
    config: AppConfig,
}

impl AppServiceFactory {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Inicializa los repositorios PostgreSQL y el almacén de blobs en disco
    pub async fn create_repository_services(&self, pool: Arc<PgPool>) -> Result<RepositoryServices, DomainError> {
        let blob_store = BlobFsRepository::new(self.config.storage.root_path.clone());
        blob_store
            .init()
            .await
            .map_err(|e| DomainError::internal_error("Storage", e.to_string()))?;

        Ok(RepositoryServices {
            folder_repository: Arc::new(FolderPgRepository::new(pool.clone())),
            file_repository: Arc::new(FilePgRepository::new(pool.clone())),
            share_repository: Arc::new(SharePgRepository::new(pool.clone())),
            preferences_repository: Arc::new(PreferencesPgRepository::new(pool)),
            blob_repository: Arc::new(blob_store),
        })
    }

    /// Construye los servicios de aplicación sobre los repositorios dados
    pub fn create_application_services(&self, repos: &RepositoryServices) -> ApplicationServices {
        let default_quota = self.config.storage.default_quota_bytes;

        let tree_validator = Arc::new(TreeValidator::new(
            repos.folder_repository.clone(),
            repos.file_repository.clone(),
            self.config.concurrency.max_parallel_listings,
        ));

        ApplicationServices {
            file_service: Arc::new(FileService::new(
                repos.file_repository.clone(),
                repos.folder_repository.clone(),
                repos.blob_repository.clone(),
                repos.preferences_repository.clone(),
                default_quota,
            )),
            folder_service: Arc::new(FolderService::new(
                repos.folder_repository.clone(),
                tree_validator.clone(),
            )),
            batch_service: Arc::new(BatchOperationService::new(
                repos.folder_repository.clone(),
                repos.file_repository.clone(),
                repos.blob_repository.clone(),
                tree_validator,
            )),
            share_service: Arc::new(ShareService::new(
                repos.share_repository.clone(),
                repos.file_repository.clone(),
                repos.blob_repository.clone(),
            )),
            storage_usage_service: Arc::new(StorageUsageService::new(
                repos.file_repository.clone(),
                repos.preferences_repository.clone(),
                default_quota,
            )),
            preferences_service: Arc::new(PreferencesService::new(
                repos.preferences_repository.clone(),
                default_quota,
            )),
        }
    }

    pub fn create_auth_service(&self) -> Arc<AuthService> {
        Arc::new(AuthService::new(
            self.config.auth.jwt_secret.clone(),
            self.config.auth.audience.clone(),
        ))
    }
}

/// Contenedor para servicios de repositorio
#[derive(Clone)]
pub struct RepositoryServices {
    pub folder_repository: Arc<dyn FolderRepository>,
    pub file_repository: Arc<dyn FileRepository>,
    pub blob_repository: Arc<dyn BlobRepository>,
    pub share_repository: Arc<dyn ShareRepository>,
    pub preferences_repository: Arc<dyn PreferencesRepository>,
}

/// Contenedor para servicios de aplicación
#[derive(Clone)]
pub struct ApplicationServices {
    pub file_service: Arc<FileService>,
    pub folder_service: Arc<FolderService>,
    pub batch_service: Arc<BatchOperationService>,
    pub share_service: Arc<ShareService>,
    pub storage_usage_service: Arc<StorageUsageService>,
    pub preferences_service: Arc<PreferencesService>,
}

/// Estado global de la aplicación para dependency injection
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub applications: ApplicationServices,
    pub auth_service: Arc<AuthService>,
    pub db_pool: Option<Arc<PgPool>>,
}

impl AppState {
    pub fn new(config: AppConfig, applications: ApplicationServices, auth_service: Arc<AuthService>) -> Self {
        Self {
            config,
            applications,
            auth_service,
            db_pool: None,
        }
    }

    pub fn with_database(mut self, pool: Arc<PgPool>) -> Self {
        self.db_pool = Some(pool);
        self
    }
}
