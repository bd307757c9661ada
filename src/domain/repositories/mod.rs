pub mod blob_repository;
pub mod file_repository;
pub mod folder_repository;
pub mod preferences_repository;
pub mod share_repository;
