//! Migration result ledger.

mod result;
mod status;

pub use result::MigrationResult;
pub use status::MigrationStatus;
