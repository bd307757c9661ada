use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use uuid::Uuid;

/// Maximum length accepted for folder and file names
pub const MAX_NAME_LENGTH: usize = 255;

/// Error in the creation or manipulation of folder entities
#[derive(Debug, thiserror::Error)]
pub enum FolderError {
    #[error("Invalid folder name: {0}")]
    InvalidFolderName(String),
}

/// Result type for folder entity operations
pub type FolderResult<T> = Result<T, FolderError>;

/// Validates a display name shared by folders and files
pub fn is_valid_name(name: &str) -> bool {
    let trimmed = name.trim();
    !trimmed.is_empty()
        && trimmed.chars().count() <= MAX_NAME_LENGTH
        && !trimmed.contains('/')
        && !trimmed.contains('\\')
}

/// Represents a folder owned by a single user.
///
/// Folders form a forest per owner through `parent_id`; the acyclicity of
/// that forest is enforced by the tree validator before every move, never
/// by the entity itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Folder {
    id: String,
    name: String,
    parent_id: Option<String>,
    user_id: String,
    is_trashed: bool,
    is_favorite: bool,
    trashed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Folder {
    /// Creates a new folder with validation
    pub fn new(name: String, parent_id: Option<String>, user_id: String) -> FolderResult<Self> {
        if !is_valid_name(&name) {
            return Err(FolderError::InvalidFolderName(name));
        }

        let now = Utc::now();

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            parent_id,
            user_id,
            is_trashed: false,
            is_favorite: false,
            trashed_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuilds a folder from a stored record (no validation)
    #[allow(clippy::too_many_arguments)]
    pub fn from_record(
        id: String,
        name: String,
        parent_id: Option<String>,
        user_id: String,
        is_trashed: bool,
        is_favorite: bool,
        trashed_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            parent_id,
            user_id,
            is_trashed,
            is_favorite,
            trashed_at,
            created_at,
            updated_at,
        }
    }

    // Getters
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn is_trashed(&self) -> bool {
        self.is_trashed
    }

    pub fn is_favorite(&self) -> bool {
        self.is_favorite
    }

    pub fn trashed_at(&self) -> Option<DateTime<Utc>> {
        self.trashed_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    // Methods to create new versions of the folder (immutable)

    /// Creates a new version of the folder with updated name
    pub fn with_name(&self, new_name: String) -> FolderResult<Self> {
        if !is_valid_name(&new_name) {
            return Err(FolderError::InvalidFolderName(new_name));
        }

        Ok(Self {
            name: new_name.trim().to_string(),
            updated_at: Utc::now(),
            ..self.clone()
        })
    }

    /// Creates a new version of the folder under a different parent
    pub fn with_parent(&self, parent_id: Option<String>) -> Self {
        Self {
            parent_id,
            updated_at: Utc::now(),
            ..self.clone()
        }
    }

    pub fn with_favorite(&self, is_favorite: bool) -> Self {
        Self {
            is_favorite,
            updated_at: Utc::now(),
            ..self.clone()
        }
    }

    /// Soft delete: flags the folder and stamps `trashed_at`
    pub fn trashed(&self) -> Self {
        let now = Utc::now();
        Self {
            is_trashed: true,
            trashed_at: Some(now),
            updated_at: now,
            ..self.clone()
        }
    }

    /// Undo of [`Folder::trashed`]
    pub fn restored(&self) -> Self {
        Self {
            is_trashed: false,
            trashed_at: None,
            updated_at: Utc::now(),
            ..self.clone()
        }
    }
}
