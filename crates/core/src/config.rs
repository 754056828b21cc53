//! Typed configuration shared by every provider backend.

use reqwest::Url;
use secrecy::{ExposeSecret, SecretString};
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Default GitHub REST API root.
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Default GitLab instance.
pub const DEFAULT_GITLAB_URL: &str = "https://gitlab.com";

/// Settings for the GitHub backend.
#[derive(Debug, Clone)]
pub struct GitHubSettings {
    /// API root, e.g. `https://api.github.com` or a GitHub Enterprise `/api/v3` URL.
    pub base_url: String,
    /// Optional token sent as a bearer credential.
    pub token: Option<SecretString>,
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GITHUB_API_URL.to_string(),
            token: None,
        }
    }
}

/// Settings for the GitLab backend.
#[derive(Debug, Clone)]
pub struct GitLabSettings {
    /// Instance root; `/api/v4` is appended by the backend.
    pub base_url: String,
    /// Optional token sent as a bearer credential.
    pub token: Option<SecretString>,
}

impl Default for GitLabSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GITLAB_URL.to_string(),
            token: None,
        }
    }
}

/// Options for one resolution run.
#[derive(Debug, Clone)]
pub struct SourceOptions {
    /// Root for per-release download directories.
    pub downloads_dir: PathBuf,
    /// Root for metadata such as the HTTP response cache.
    pub metadata_dir: PathBuf,
    /// Whether the newest pre-release may satisfy a request.
    pub include_pre_releases: bool,
    /// GitHub backend settings.
    pub github: GitHubSettings,
    /// GitLab backend settings.
    pub gitlab: GitLabSettings,
}

impl SourceOptions {
    /// Create options rooted at the given directories.
    #[must_use]
    pub fn new(downloads_dir: impl Into<PathBuf>, metadata_dir: impl Into<PathBuf>) -> Self {
        Self {
            downloads_dir: downloads_dir.into(),
            metadata_dir: metadata_dir.into(),
            include_pre_releases: false,
            github: GitHubSettings::default(),
            gitlab: GitLabSettings::default(),
        }
    }

    /// Build options from the environment.
    ///
    /// Reads `GITHUB_TOKEN` (falling back to `GH_TOKEN`), `GITLAB_TOKEN` and
    /// `BINFETCH_INCLUDE_PRE_RELEASES`. Directories default to
    /// `~/.cache/binfetch/{downloads,metadata}`.
    #[must_use]
    pub fn from_env() -> Self {
        let root = default_root();
        let mut options = Self::new(root.join("downloads"), root.join("metadata"));

        if let Some(token) = env_token("GITHUB_TOKEN").or_else(|| env_token("GH_TOKEN")) {
            options.github.token = Some(token);
        }
        if let Some(token) = env_token("GITLAB_TOKEN") {
            options.gitlab.token = Some(token);
        }
        options.include_pre_releases = std::env::var("BINFETCH_INCLUDE_PRE_RELEASES")
            .is_ok_and(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"));

        options
    }

    /// Sets the pre-release flag.
    #[must_use]
    pub const fn with_pre_releases(mut self, include: bool) -> Self {
        self.include_pre_releases = include;
        self
    }

    /// Sets the GitHub token.
    #[must_use]
    pub fn with_github_token(mut self, token: impl Into<String>) -> Self {
        self.github.token = Some(SecretString::from(token.into()));
        self
    }

    /// Sets the GitHub API root.
    #[must_use]
    pub fn with_github_url(mut self, url: impl Into<String>) -> Self {
        self.github.base_url = url.into();
        self
    }

    /// Sets the GitLab token.
    #[must_use]
    pub fn with_gitlab_token(mut self, token: impl Into<String>) -> Self {
        self.gitlab.token = Some(SecretString::from(token.into()));
        self
    }

    /// Sets the GitLab instance root.
    #[must_use]
    pub fn with_gitlab_url(mut self, url: impl Into<String>) -> Self {
        self.gitlab.base_url = url.into();
        self
    }

    /// Check the options before any provider is built from them.
    pub fn validate(&self) -> Result<()> {
        check_dir("downloads", &self.downloads_dir)?;
        check_dir("metadata", &self.metadata_dir)?;
        check_url("GitHub", &self.github.base_url)?;
        check_url("GitLab", &self.gitlab.base_url)?;
        check_token("GitHub", self.github.token.as_ref())?;
        check_token("GitLab", self.gitlab.token.as_ref())?;
        Ok(())
    }
}

fn default_root() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("binfetch")
}

fn env_token(name: &str) -> Option<SecretString> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(SecretString::from)
}

fn check_dir(label: &str, path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(Error::config(
            format!("{label} directory is empty"),
            format!("Set the {label} directory to an absolute path"),
        ));
    }
    Ok(())
}

fn check_url(label: &str, url: &str) -> Result<()> {
    let parsed = Url::parse(url).map_err(|e| {
        Error::config(
            format!("invalid {label} URL '{url}': {e}"),
            "Use a full URL such as https://example.com",
        )
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::config(
            format!("unsupported {label} URL scheme '{}'", parsed.scheme()),
            "Only http and https URLs are supported",
        ));
    }
    Ok(())
}

fn check_token(label: &str, token: Option<&SecretString>) -> Result<()> {
    if token.is_some_and(|t| t.expose_secret().trim().is_empty()) {
        return Err(Error::config(
            format!("{label} token is empty"),
            format!("Unset the {label} token or provide a non-empty value"),
        ));
    }
    Ok(())
}
