use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default quota when a user never saved preferences: 5 GB
pub const DEFAULT_STORAGE_QUOTA_BYTES: u64 = 5_368_709_120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Grid,
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewMode::Grid => write!(f, "grid"),
            ViewMode::List => write!(f, "list"),
        }
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "grid" => Ok(ViewMode::Grid),
            "list" => Ok(ViewMode::List),
            other => Err(format!("Invalid view mode: {}", other)),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
            Theme::System => write!(f, "system"),
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "system" => Ok(Theme::System),
            other => Err(format!("Invalid theme: {}", other)),
        }
    }
}

/// Per-user display settings and storage quota
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserPreferences {
    pub user_id: String,
    pub view_mode: ViewMode,
    pub theme: Theme,
    pub storage_quota_bytes: u64,
    pub updated_at: DateTime<Utc>,
}

impl UserPreferences {
    pub fn defaults_for(user_id: String) -> Self {
        Self {
            user_id,
            view_mode: ViewMode::default(),
            theme: Theme::default(),
            storage_quota_bytes: DEFAULT_STORAGE_QUOTA_BYTES,
            updated_at: Utc::now(),
        }
    }

    pub fn with_display(mut self, view_mode: Option<ViewMode>, theme: Option<Theme>) -> Self {
        if let Some(view_mode) = view_mode {
            self.view_mode = view_mode;
        }
        if let Some(theme) = theme {
            self.theme = theme;
        }
        self.updated_at = Utc::now();
        self
    }

    /// Quota that applies to a user; a missing or zero stored quota falls back to `default_quota`
    pub fn effective_quota(preferences: Option<&Self>, default_quota: u64) -> u64 {
        preferences
            .map(|p| p.storage_quota_bytes)
            .filter(|quota| *quota > 0)
            .unwrap_or(default_quota)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trip() {
        assert_eq!("LIST".parse::<ViewMode>().unwrap(), ViewMode::List);
        assert_eq!(Theme::Dark.to_string().parse::<Theme>().unwrap(), Theme::Dark);
        assert!("sepia".parse::<Theme>().is_err());
    }

    #[test]
    fn test_with_display_keeps_unspecified_fields() {
        let prefs = UserPreferences::defaults_for("user-1".to_string())
            .with_display(Some(ViewMode::List), None);

        assert_eq!(prefs.view_mode, ViewMode::List);
        assert_eq!(prefs.theme, Theme::System);
        assert_eq!(prefs.storage_quota_bytes, DEFAULT_STORAGE_QUOTA_BYTES);
    }

    #[test]
    fn test_zero_or_missing_quota_uses_default() {
        let mut prefs = UserPreferences::defaults_for("user-1".to_string());
        prefs.storage_quota_bytes = 0;
        assert_eq!(UserPreferences::effective_quota(Some(&prefs), 42), 42);
        assert_eq!(UserPreferences::effective_quota(None, 42), 42);

        prefs.storage_quota_bytes = 1024;
        assert_eq!(UserPreferences::effective_quota(Some(&prefs), 42), 1024);
    }
}
