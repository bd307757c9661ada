use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::application::dtos::folder_dto::FolderDto;
use crate::domain::entities::file::{format_file_size, File, FileCategory};

/// DTO for file responses
#[derive(Debug, Clone, Serialize)]
pub struct FileDto {
    pub id: String,
    pub name: String,

    /// Key of the blob holding the content
    pub storage_path: String,

    /// Size in bytes
    pub size: u64,

    /// Human readable size (`1.5 MB`)
    pub formatted_size: String,

    pub mime_type: Option<String>,

    /// Icon family derived from the MIME type
    pub category: FileCategory,

    /// Parent folder ID
    pub folder_id: Option<String>,

    pub user_id: String,
    pub is_trashed: bool,
    pub is_favorite: bool,
    pub trashed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<File> for FileDto {
    fn from(file: File) -> Self {
        Self {
            id: file.id().to_string(),
            name: file.name().to_string(),
            storage_path: file.storage_path().to_string(),
            size: file.size(),
            formatted_size: format_file_size(file.size()),
            mime_type: file.mime_type().map(String::from),
            category: file.category(),
            folder_id: file.folder_id().map(String::from),
            user_id: file.user_id().to_string(),
            is_trashed: file.is_trashed(),
            is_favorite: file.is_favorite(),
            trashed_at: file.trashed_at(),
            created_at: file.created_at(),
            updated_at: file.updated_at(),
        }
    }
}

/// Files and folders shown together in one view (a folder, the trash,
/// the favorites)
#[derive(Debug, Clone, Serialize)]
pub struct FolderContentsDto {
    pub files: Vec<FileDto>,
    pub folders: Vec<FolderDto>,
}

impl FolderContentsDto {
    pub fn new(files: Vec<File>, folders: Vec<crate::domain::entities::folder::Folder>) -> Self {
        Self {
            files: files.into_iter().map(FileDto::from).collect(),
            folders: folders.into_iter().map(FolderDto::from).collect(),
        }
    }
}

/// What the public share page may learn about a file
#[derive(Debug, Clone, Serialize)]
pub struct PublicFileDto {
    pub name: String,
    pub size: u64,
    pub formatted_size: String,
    pub mime_type: Option<String>,
    pub category: FileCategory,
}

impl From<&File> for PublicFileDto {
    fn from(file: &File) -> Self {
        Self {
            name: file.name().to_string(),
            size: file.size(),
            formatted_size: format_file_size(file.size()),
            mime_type: file.mime_type().map(String::from),
            category: file.category(),
        }
    }
}
