use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::folder::Folder;

/// DTO for folder creation requests
#[derive(Debug, Deserialize)]
pub struct CreateFolderDto {
    /// Name of the folder to create
    pub name: String,

    /// Parent folder ID (None for root level)
    #[serde(default)]
    pub parent_id: Option<String>,
}

/// DTO for folder responses
#[derive(Debug, Clone, Serialize)]
pub struct FolderDto {
    pub id: String,
    pub name: String,

    /// Parent folder ID
    pub parent_id: Option<String>,

    pub user_id: String,
    pub is_trashed: bool,
    pub is_favorite: bool,
    pub trashed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Folder> for FolderDto {
    fn from(folder: Folder) -> Self {
        Self {
            id: folder.id().to_string(),
            name: folder.name().to_string(),
            parent_id: folder.parent_id().map(String::from),
            user_id: folder.user_id().to_string(),
            is_trashed: folder.is_trashed(),
            is_favorite: folder.is_favorite(),
            trashed_at: folder.trashed_at(),
            created_at: folder.created_at(),
            updated_at: folder.updated_at(),
        }
    }
}

/// One step of the path shown above a folder listing. The root entry has
/// no id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreadcrumbDto {
    pub id: Option<String>,
    pub name: String,
}

impl BreadcrumbDto {
    pub const ROOT_NAME: &'static str = "My Files";

    pub fn root() -> Self {
        Self { id: None, name: Self::ROOT_NAME.to_string() }
    }
}

impl From<&Folder> for BreadcrumbDto {
    fn from(folder: &Folder) -> Self {
        Self {
            id: Some(folder.id().to_string()),
            name: folder.name().to_string(),
        }
    }
}
