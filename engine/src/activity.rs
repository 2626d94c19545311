//! Activity log of confirmed mutations.

use crate::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of entries kept.
pub const ACTIVITY_LOG_CAPACITY: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Add,
    Edit,
    Delete,
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ActivityKind::Add => "add",
            ActivityKind::Edit => "edit",
            ActivityKind::Delete => "delete",
        })
    }
}

/// One log line. Never modified after it is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub message: String,
    /// Milliseconds since epoch.
    pub timestamp: Timestamp,
}

/// Newest-first log capped at [`ACTIVITY_LOG_CAPACITY`] entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityLog {
    entries: Vec<ActivityEntry>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an entry at the front, evicting the oldest past capacity.
    pub fn push(&mut self, kind: ActivityKind, message: impl Into<String>, timestamp: Timestamp) {
        self.entries.insert(
            0,
            ActivityEntry {
                kind,
                message: message.into(),
                timestamp,
            },
        );
        self.entries.truncate(ACTIVITY_LOG_CAPACITY);
    }

    /// Entries, newest first.
    pub fn entries(&self) -> &[ActivityEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Enforce the cap on a log loaded from elsewhere.
    pub(crate) fn truncate(&mut self) {
        self.entries.truncate(ACTIVITY_LOG_CAPACITY);
    }
}
