use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::dtos::file_dto::PublicFileDto;
use crate::domain::entities::share::SharedLink;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateShareDto {
    pub file_id: String,
    #[serde(default)]
    pub expires_in_days: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShareLinkDto {
    pub link: SharedLink,
    /// Relative public URL
    pub url: String,
}

impl From<SharedLink> for ShareLinkDto {
    fn from(link: SharedLink) -> Self {
        let url = link.public_url();
        Self { link, url }
    }
}

/// Public view of a shared file, served without authentication
#[derive(Debug, Clone, Serialize)]
pub struct SharedFileDto {
    pub file: PublicFileDto,
    pub expires_at: Option<DateTime<Utc>>,
    pub download_count: u64,
    pub download_url: String,
}
