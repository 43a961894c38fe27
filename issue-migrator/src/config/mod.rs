//! Configuration and request models.
//!
//! Server settings come from an optional TOML file. Platform credentials are
//! never configured globally; every request carries its own.

mod error;
mod request;
mod server;

pub use error::ConfigError;
pub use request::{
    Direction, GitHubListRequest, GitLabListRequest, MigrationRequest, PlatformConfig,
};
pub use server::ServerConfig;
