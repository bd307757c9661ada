pub mod batch_operations;
pub mod file_service;
pub mod folder_service;
pub mod preferences_service;
pub mod share_service;
pub mod storage_usage_service;
