//! Preferences persisted as a JSON file.

use crate::error::Result;
use roster_engine::Preferences;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefsFile {
    path: PathBuf,
}

impl PrefsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the preferences, or the defaults if the file does not exist yet.
    pub fn load(&self) -> Result<Preferences> {
        match std::fs::read_to_string(&self.path) {
            Ok(json) => Ok(Preferences::from_json(&json)?),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no preferences file, using defaults");
                Ok(Preferences::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write the preferences, replacing the file contents.
    pub fn save(&self, prefs: &Preferences) -> Result<()> {
        let json = prefs.to_json()?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
