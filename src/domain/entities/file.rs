use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use uuid::Uuid;

use crate::domain::entities::folder::is_valid_name;

/// Error en la creación o manipulación de entidades de archivo
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("Nombre de archivo inválido: {0}")]
    InvalidFileName(String),
}

/// Tipo de resultado para operaciones con entidades de archivo
pub type FileResult<T> = Result<T, FileError>;

/// Coarse classification of a file used by the browser to pick an icon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Image,
    Video,
    Audio,
    Pdf,
    Archive,
    Doc,
    Spreadsheet,
    Presentation,
    Text,
    File,
}

impl FileCategory {
    pub fn from_mime(mime_type: Option<&str>) -> Self {
        let Some(mime) = mime_type else {
            return FileCategory::File;
        };

        if mime.starts_with("image/") {
            FileCategory::Image
        } else if mime.starts_with("video/") {
            FileCategory::Video
        } else if mime.starts_with("audio/") {
            FileCategory::Audio
        } else if mime.contains("pdf") {
            FileCategory::Pdf
        } else if mime.contains("zip") || mime.contains("rar") || mime.contains("tar") {
            FileCategory::Archive
        } else if mime.contains("document") || mime.contains("word") {
            FileCategory::Doc
        } else if mime.contains("spreadsheet") || mime.contains("excel") {
            FileCategory::Spreadsheet
        } else if mime.contains("presentation") || mime.contains("powerpoint") {
            FileCategory::Presentation
        } else if mime.contains("text") || mime.contains("json") {
            FileCategory::Text
        } else {
            FileCategory::File
        }
    }
}

/// Formats a byte count using binary units (`1.5 KB`, `2 GB`)
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let exponent = ((bytes as f64).ln() / 1024f64.ln()).floor() as usize;
    let exponent = exponent.min(UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(exponent as i32);

    // Dos decimales, sin ceros sobrantes
    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');

    format!("{} {}", trimmed, UNITS[exponent])
}

/// Represents a file record. The binary content lives in the blob store
/// under `storage_path`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct File {
    id: String,
    name: String,
    /// Unique key into the blob store
    storage_path: String,
    size: u64,
    mime_type: Option<String>,
    folder_id: Option<String>,
    user_id: String,
    is_trashed: bool,
    is_favorite: bool,
    trashed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl File {
    /// Crea un nuevo archivo con validación
    pub fn new(
        name: String,
        storage_path: String,
        size: u64,
        mime_type: Option<String>,
        folder_id: Option<String>,
        user_id: String,
    ) -> FileResult<Self> {
        if !is_valid_name(&name) {
            return Err(FileError::InvalidFileName(name));
        }

        let now = Utc::now();

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            storage_path,
            size,
            mime_type: mime_type.filter(|m| !m.is_empty()),
            folder_id,
            user_id,
            is_trashed: false,
            is_favorite: false,
            trashed_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Reconstruye un archivo desde un registro persistido (sin validación)
    #[allow(clippy::too_many_arguments)]
    pub fn from_record(
        id: String,
        name: String,
        storage_path: String,
        size: u64,
        mime_type: Option<String>,
        folder_id: Option<String>,
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
            storage_path,
            size,
            mime_type,
            folder_id,
            user_id,
            is_trashed,
            is_favorite,
            trashed_at,
            created_at,
            updated_at,
        }
    }

    /// Builds the blob key for a new upload: `{user_id}/{unix_millis}-{name}`
    pub fn build_storage_path(user_id: &str, file_name: &str, at: DateTime<Utc>) -> String {
        format!("{}/{}-{}", user_id, at.timestamp_millis(), file_name)
    }

    // Getters
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn storage_path(&self) -> &str {
        &self.storage_path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    /// MIME type used when serving the content
    pub fn content_type(&self) -> &str {
        self.mime_type.as_deref().unwrap_or("application/octet-stream")
    }

    pub fn folder_id(&self) -> Option<&str> {
        self.folder_id.as_deref()
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

    pub fn category(&self) -> FileCategory {
        FileCategory::from_mime(self.mime_type())
    }

    // Versiones inmutables

    pub fn with_name(&self, new_name: String) -> FileResult<Self> {
        if !is_valid_name(&new_name) {
            return Err(FileError::InvalidFileName(new_name));
        }

        Ok(Self {
            name: new_name.trim().to_string(),
            updated_at: Utc::now(),
            ..self.clone()
        })
    }

    pub fn with_folder(&self, folder_id: Option<String>) -> Self {
        Self {
            folder_id,
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

    pub fn trashed(&self) -> Self {
        let now = Utc::now();
        Self {
            is_trashed: true,
            trashed_at: Some(now),
            updated_at: now,
            ..self.clone()
        }
    }

    pub fn restored(&self) -> Self {
        Self {
            is_trashed: false,
            trashed_at: None,
            updated_at: Utc::now(),
            ..self.clone()
        }
    }
}
