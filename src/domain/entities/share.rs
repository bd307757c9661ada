use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Longest lifetime a share link may be given
pub const MAX_EXPIRATION_DAYS: u32 = 365;

/// Public, token-keyed pointer to a single file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SharedLink {
    pub id: String,
    pub file_id: String,
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub download_count: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum ShareError {
    #[error("Invalid expiration: {0}")]
    InvalidExpiration(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl SharedLink {
    /// Creates a link for `file_id`, optionally expiring after `expires_in_days`
    pub fn new(file_id: String, expires_in_days: Option<u32>) -> Result<Self, ShareError> {
        if file_id.is_empty() {
            return Err(ShareError::ValidationError("File ID cannot be empty".to_string()));
        }

        let now = Utc::now();

        let expires_at = match expires_in_days {
            None => None,
            Some(0) => {
                return Err(ShareError::InvalidExpiration("Expiration must be at least one day".to_string()));
            }
            Some(days) if days > MAX_EXPIRATION_DAYS => {
                return Err(ShareError::InvalidExpiration(format!(
                    "Expiration cannot exceed {} days", MAX_EXPIRATION_DAYS
                )));
            }
            Some(days) => Some(now + Duration::days(days as i64)),
        };

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            file_id,
            token: Uuid::new_v4().to_string(),
            expires_at,
            download_count: 0,
            created_at: now,
        })
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(expires_at) if expires_at < now)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Relative URL the browser turns into a public link
    pub fn public_url(&self) -> String {
        format!("/shared/{}", self.token)
    }
}
