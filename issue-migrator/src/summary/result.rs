//! Migration result ledger.

use super::status::MigrationStatus;
use serde::{Deserialize, Serialize};

/// Result of a migration request.
///
/// Every requested issue id ends up in exactly one of the two lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationResult {
    /// Issues that were migrated.
    pub success: Vec<MigrationStatus>,

    /// Issues that could not be migrated.
    pub failed: Vec<MigrationStatus>,
}

impl MigrationResult {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome of one issue.
    pub fn record(&mut self, status: MigrationStatus) {
        if status.is_success() {
            self.success.push(status);
        } else {
            self.failed.push(status);
        }
    }

    /// Number of issues recorded.
    #[must_use]
    pub fn total(&self) -> usize {
        self.success.len() + self.failed.len()
    }

    /// Returns true if any issue failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    /// Returns true if every recorded issue was migrated.
    #[must_use]
    pub fn all_success(&self) -> bool {
        self.failed.is_empty()
    }
}

impl FromIterator<MigrationStatus> for MigrationResult {
    fn from_iter<I: IntoIterator<Item = MigrationStatus>>(iter: I) -> Self {
        let mut result = Self::new();
        for status in iter {
            result.record(status);
        }
        result
    }
}
