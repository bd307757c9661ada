pub mod file_pg_repository;
pub mod folder_pg_repository;
pub mod preferences_pg_repository;
pub mod share_pg_repository;

pub use file_pg_repository::FilePgRepository;
pub use folder_pg_repository::FolderPgRepository;
pub use preferences_pg_repository::PreferencesPgRepository;
pub use share_pg_repository::SharePgRepository;
