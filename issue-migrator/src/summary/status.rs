//! Per-issue migration status.

use serde::{Deserialize, Serialize};

/// Outcome of migrating a single issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationStatus {
    /// Issue number on the source platform.
    pub original_id: u64,

    /// Issue number on the destination platform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_id: Option<u64>,

    /// Issue URL on the destination platform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_url: Option<String>,

    /// Why the migration failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MigrationStatus {
    /// A migrated issue.
    #[must_use]
    pub fn migrated(original_id: u64, new_id: u64, new_url: impl Into<String>) -> Self {
        Self {
            original_id,
            new_id: Some(new_id),
            new_url: Some(new_url.into()),
            error: None,
        }
    }

    /// An issue that could not be migrated.
    #[must_use]
    pub fn failed(original_id: u64, error: impl Into<String>) -> Self {
        Self {
            original_id,
            new_id: None,
            new_url: None,
            error: Some(error.into()),
        }
    }

    /// Returns true if the issue was migrated.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}
