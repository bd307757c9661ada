pub mod blob_fs_repository;

// Repositorios PostgreSQL
pub mod pg;

pub use blob_fs_repository::BlobFsRepository;
pub use pg::{FilePgRepository, FolderPgRepository, PreferencesPgRepository, SharePgRepository};
