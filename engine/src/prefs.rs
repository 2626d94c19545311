//! Persisted client preferences: selected user, theme flag and activity log.
//!
//! The document is versioned so an older client refuses a file written by a
//! newer one instead of silently dropping fields.

use crate::{error::Result, ActivityLog, Error, User};
use serde::{Deserialize, Serialize};

/// Version of the preferences format.
pub const PREFS_FORMAT_VERSION: u32 = 1;

/// Fixed storage name the preferences are kept under.
pub const PREFS_STORAGE_NAME: &str = "roster-ui";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub format_version: u32,
    /// Last user opened in the detail view.
    #[serde(default)]
    pub current_user: Option<User>,
    #[serde(default)]
    pub dark_mode: bool,
    #[serde(default)]
    pub activity_log: ActivityLog,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            format_version: PREFS_FORMAT_VERSION,
            current_user: None,
            dark_mode: false,
            activity_log: ActivityLog::new(),
        }
    }
}

impl Preferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_current_user(&mut self, user: User) {
        self.current_user = Some(user);
    }

    /// Flip the theme and return the new value.
    pub fn toggle_dark_mode(&mut self) -> bool {
        self.dark_mode = !self.dark_mode;
        self.dark_mode
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::InvalidPreferences(e.to_string()))
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut prefs: Self =
            serde_json::from_str(json).map_err(|e| Error::InvalidPreferences(e.to_string()))?;

        if prefs.format_version > PREFS_FORMAT_VERSION {
            return Err(Error::InvalidPreferences(format!(
                "unsupported preferences format version: {} (max supported: {})",
                prefs.format_version, PREFS_FORMAT_VERSION
            )));
        }

        prefs.activity_log.truncate();
        Ok(prefs)
    }
}
