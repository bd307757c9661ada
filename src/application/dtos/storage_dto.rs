use serde::Serialize;

use crate::domain::entities::file::format_file_size;

/// Storage meter of a user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorageUsageDto {
    pub used: u64,
    pub quota: u64,
    /// Share of the quota in use, capped at 100
    pub percent: f64,
    pub used_formatted: String,
    pub quota_formatted: String,
}

impl StorageUsageDto {
    pub fn new(used: u64, quota: u64) -> Self {
        let percent = if quota == 0 {
            100.0
        } else {
            (used as f64 / quota as f64 * 100.0).min(100.0)
        };

        Self {
            used,
            quota,
            percent,
            used_formatted: format_file_size(used),
            quota_formatted: format_file_size(quota),
        }
    }
}
