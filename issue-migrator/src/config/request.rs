//! Migration and listing request models.

use super::ConfigError;
use crate::trackers::Platform;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Which way issues are migrated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "github-to-gitlab")]
    GitHubToGitLab,
    #[serde(rename = "gitlab-to-github")]
    GitLabToGitHub,
}

impl Direction {
    /// Platform issues are read from.
    #[must_use]
    pub fn source(self) -> Platform {
        match self {
            Self::GitHubToGitLab => Platform::GitHub,
            Self::GitLabToGitHub => Platform::GitLab,
        }
    }

    /// Platform issues are written to.
    #[must_use]
    pub fn target(self) -> Platform {
        match self {
            Self::GitHubToGitLab => Platform::GitLab,
            Self::GitLabToGitHub => Platform::GitHub,
        }
    }

    /// Returns the wire name of the direction.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GitHubToGitLab => "github-to-gitlab",
            Self::GitLabToGitHub => "gitlab-to-github",
        }
    }
}

impl FromStr for Direction {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "github-to-gitlab" => Ok(Self::GitHubToGitLab),
            "gitlab-to-github" => Ok(Self::GitLabToGitHub),
            other => Err(ConfigError::InvalidDirection(other.to_string())),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection details for one side of a migration.
///
/// GitHub sides use `owner`, `repo` and optionally `base_url` for the REST
/// API root. GitLab sides use `base_url` and `project_id`. `session` is the
/// browser session cookie value (`user_session` on GitHub, `_gitlab_session`
/// on GitLab).
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct PlatformConfig {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub repo: String,
    #[serde(default, deserialize_with = "project_id")]
    pub project_id: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default, skip_serializing)]
    pub token: String,
    #[serde(default, skip_serializing)]
    pub session: Option<String>,
}

impl fmt::Debug for PlatformConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformConfig")
            .field("platform", &self.platform)
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("project_id", &self.project_id)
            .field("base_url", &self.base_url)
            .field("has_token", &!self.token.is_empty())
            .field("has_session", &self.session().is_some())
            .finish()
    }
}

impl PlatformConfig {
    /// Returns the session cookie, treating an empty value as absent.
    #[must_use]
    pub fn session(&self) -> Option<&str> {
        self.session.as_deref().filter(|s| !s.trim().is_empty())
    }

    /// Returns the GitHub API base URL override, if any.
    #[must_use]
    pub fn github_api_url(&self) -> Option<&str> {
        Some(self.base_url.trim()).filter(|url| !url.is_empty())
    }

    /// Checks the fields needed to reach `platform`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPlatform`] naming the missing field.
    pub fn validate_for(&self, platform: Platform, side: &'static str) -> Result<(), ConfigError> {
        let missing = |field: &str| ConfigError::InvalidPlatform {
            side,
            message: format!("{field} is required for {platform}"),
        };

        if let Some(declared) = self.platform {
            if declared != platform {
                return Err(ConfigError::InvalidPlatform {
                    side,
                    message: format!("expected a {platform} configuration, got {declared}"),
                });
            }
        }

        match platform {
            Platform::GitHub => {
                if self.owner.trim().is_empty() {
                    return Err(missing("owner"));
                }
                if self.repo.trim().is_empty() {
                    return Err(missing("repo"));
                }
            }
            Platform::GitLab => {
                if self.base_url.trim().is_empty() {
                    return Err(missing("base_url"));
                }
                if url::Url::parse(&self.base_url).is_err() {
                    return Err(ConfigError::InvalidPlatform {
                        side,
                        message: format!("base_url '{}' is not an absolute URL", self.base_url),
                    });
                }
                if self.project_id.trim().is_empty() {
                    return Err(missing("project_id"));
                }
            }
        }
        Ok(())
    }
}

/// Body of `POST /api/migrate`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MigrationRequest {
    /// `github-to-gitlab` or `gitlab-to-github`, parsed by the runner.
    pub direction: String,
    pub source: PlatformConfig,
    pub target: PlatformConfig,
    pub issue_ids: Vec<u64>,
}

impl MigrationRequest {
    /// Reads a request from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(|e| ConfigError::JsonError {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Parses the direction and validates both sides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for an unknown direction or missing fields.
    pub fn validate(&self) -> Result<Direction, ConfigError> {
        let direction: Direction = self.direction.parse()?;
        self.source.validate_for(direction.source(), "source")?;
        self.target.validate_for(direction.target(), "target")?;
        Ok(direction)
    }
}

/// Body of `POST /api/github/issues`.
#[derive(Clone, Deserialize)]
pub struct GitHubListRequest {
    pub owner: String,
    pub repo: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub base_url: String,
}

/// Body of `POST /api/gitlab/issues`.
#[derive(Clone, Deserialize)]
pub struct GitLabListRequest {
    pub base_url: String,
    #[serde(deserialize_with = "project_id")]
    pub project_id: String,
    #[serde(default)]
    pub token: String,
}

impl From<GitHubListRequest> for PlatformConfig {
    fn from(request: GitHubListRequest) -> Self {
        Self {
            platform: Some(Platform::GitHub),
            owner: request.owner,
            repo: request.repo,
            base_url: request.base_url,
            token: request.token,
            ..Default::default()
        }
    }
}

impl From<GitLabListRequest> for PlatformConfig {
    fn from(request: GitLabListRequest) -> Self {
        Self {
            platform: Some(Platform::GitLab),
            project_id: request.project_id,
            base_url: request.base_url,
            token: request.token,
            ..Default::default()
        }
    }
}

/// Accepts numeric ids and `group/project` paths.
fn project_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(0)) | None => String::new(),
        Some(Raw::Number(n)) => n.to_string(),
        Some(Raw::Text(s)) => s.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(direction: &str) -> MigrationRequest {
        serde_json::from_value(json!({
            "direction": direction,
            "source": { "type": "github", "owner": "o", "repo": "r", "token": "gh" },
            "target": { "type": "gitlab", "base_url": "https://gitlab.test", "project_id": 42, "token": "gl" },
            "issue_ids": [1, 2]
        }))
        .unwrap()
    }

    #[test]
    fn can_parse_migration_request() {
        let req = request("github-to-gitlab");

        assert_eq!(req.validate().unwrap(), Direction::GitHubToGitLab);
        assert_eq!(req.target.project_id, "42");
        assert_eq!(req.issue_ids, vec![1, 2]);
        assert_eq!(req.source.session(), None);
    }

    #[test]
    fn invalid_direction_is_rejected() {
        let result = request("sideways").validate();
        assert!(matches!(result, Err(ConfigError::InvalidDirection(d)) if d == "sideways"));
    }

    #[test]
    fn mismatched_sides_are_rejected() {
        let result = request("gitlab-to-github").validate();
        assert!(matches!(result, Err(ConfigError::InvalidPlatform { side: "source", .. })));
    }

    #[test]
    fn gitlab_side_requires_project() {
        let config = PlatformConfig {
            base_url: "https://gitlab.test".to_string(),
            ..Default::default()
        };
        let err = config.validate_for(Platform::GitLab, "target").unwrap_err();
        assert!(err.to_string().contains("project_id"));
    }

    #[test]
    fn project_paths_are_accepted() {
        let config: PlatformConfig =
            serde_json::from_value(json!({ "project_id": "group/app" })).unwrap();
        assert_eq!(config.project_id, "group/app");
    }

    #[test]
    fn debug_output_hides_credentials() {
        let config = PlatformConfig {
            token: "secret".to_string(),
            session: Some("cookie".to_string()),
            ..Default::default()
        };
        let printed = format!("{config:?}");
        assert!(!printed.contains("secret"));
        assert!(!printed.contains("cookie"));
    }

    #[test]
    fn direction_round_trips_through_strings() {
        for direction in [Direction::GitHubToGitLab, Direction::GitLabToGitHub] {
            assert_eq!(direction.as_str().parse::<Direction>().unwrap(), direction);
        }
    }

    #[test]
    fn can_load_request_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("request.json");
        std::fs::write(
            &path,
            json!({
                "direction": "gitlab-to-github",
                "source": { "type": "gitlab", "base_url": "https://gitlab.test", "project_id": "group/app", "token": "gl" },
                "target": { "type": "github", "owner": "o", "repo": "r", "token": "gh", "session": "s" },
                "issue_ids": [7]
            })
            .to_string(),
        )
        .unwrap();

        let request = MigrationRequest::load(&path).unwrap();
        assert_eq!(request.validate().unwrap(), Direction::GitLabToGitHub);
        assert_eq!(request.issue_ids, vec![7]);
        assert_eq!(request.target.session(), Some("s"));
    }

    #[test]
    fn malformed_request_file_is_reported() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("request.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = MigrationRequest::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::JsonError { .. }));
    }
}
