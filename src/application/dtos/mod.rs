pub mod batch_dto;
pub mod file_dto;
pub mod folder_dto;
pub mod preferences_dto;
pub mod share_dto;
pub mod storage_dto;
