//! Source strings and the provider they select.

use async_trait::async_trait;
use binfetch_core::{
    Asset, CancellationToken, Error, Platform, Provider, Release, Result, SourceOptions,
    VERSION_LATEST,
};
use binfetch_github::GitHubProvider;
use binfetch_gitlab::GitLabProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Hosting service a [`SourceSpec`] points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// GitHub or GitHub Enterprise.
    GitHub,
    /// GitLab.com or self-managed GitLab.
    GitLab,
}

impl SourceKind {
    /// Slug used in source strings and directory layouts.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GitHub => binfetch_github::SOURCE,
            Self::GitLab => binfetch_gitlab::SOURCE,
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "github" | "github.com" => Some(Self::GitHub),
            "gitlab" | "gitlab.com" => Some(Self::GitLab),
            _ => None,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed `[service/]owner/repo[@version]` string.
///
/// ```ignore
/// let spec: SourceSpec = "gitlab/group/sub/tool@v1.2.0".parse()?;
/// assert_eq!(spec.owner, "group/sub");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpec {
    /// Hosting service.
    pub kind: SourceKind,
    /// Owner, or the group path on GitLab.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Requested version, `latest` when omitted.
    pub version: String,
}

impl SourceSpec {
    /// Parse a source string.
    ///
    /// A bare `owner/repo` means GitHub. GitLab accepts nested groups; the
    /// last segment is the project.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSource`] for empty segments, an empty version
    /// or the wrong number of segments.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let (path, version) = match trimmed.split_once('@') {
            Some((_, "")) => return Err(Error::invalid_source(input, "version after '@' is empty")),
            Some((path, version)) => (path, version),
            None => (trimmed, VERSION_LATEST),
        };

        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(Error::invalid_source(input, "empty path segment"));
        }

        let (kind, rest) = match SourceKind::from_prefix(segments[0]) {
            Some(kind) => (kind, &segments[1..]),
            None => (SourceKind::GitHub, &segments[..]),
        };

        let (owner, repo) = match (kind, rest) {
            (SourceKind::GitHub, [owner, repo]) => ((*owner).to_string(), (*repo).to_string()),
            (SourceKind::GitLab, [groups @ .., repo]) if !groups.is_empty() => {
                (groups.join("/"), (*repo).to_string())
            }
            (SourceKind::GitHub, _) => {
                return Err(Error::invalid_source(input, "expected owner/repo"));
            }
            (SourceKind::GitLab, _) => {
                return Err(Error::invalid_source(input, "expected group/project"));
            }
        };

        Ok(Self {
            kind,
            owner,
            repo,
            version: version.to_string(),
        })
    }

    /// `owner/repo`.
    #[must_use]
    pub fn app(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

impl FromStr for SourceSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for SourceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}@{}", self.kind, self.owner, self.repo, self.version)
    }
}

/// A configured provider for either hosting service.
#[derive(Debug)]
pub enum Source {
    /// GitHub Releases.
    GitHub(GitHubProvider),
    /// GitLab Releases.
    GitLab(GitLabProvider),
}

impl Source {
    /// Build the provider `spec` selects.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when `options` fail validation.
    pub fn new(spec: &SourceSpec, platform: Platform, options: SourceOptions) -> Result<Self> {
        let SourceSpec {
            kind,
            owner,
            repo,
            version,
        } = spec.clone();
        Ok(match kind {
            SourceKind::GitHub => {
                Self::GitHub(GitHubProvider::new(owner, repo, version, platform, options)?)
            }
            SourceKind::GitLab => {
                Self::GitLab(GitLabProvider::new(owner, repo, version, platform, options)?)
            }
        })
    }

    fn inner(&self) -> &dyn Provider {
        match self {
            Self::GitHub(p) => p,
            Self::GitLab(p) => p,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Provider {
        match self {
            Self::GitHub(p) => p,
            Self::GitLab(p) => p,
        }
    }
}

#[async_trait]
impl Provider for Source {
    fn source(&self) -> &'static str {
        self.inner().source()
    }

    fn owner(&self) -> &str {
        self.inner().owner()
    }

    fn repo(&self) -> &str {
        self.inner().repo()
    }

    fn platform(&self) -> Platform {
        self.inner().platform()
    }

    fn version(&self) -> &str {
        self.inner().version()
    }

    fn downloads_dir(&self) -> PathBuf {
        self.inner().downloads_dir()
    }

    async fn resolve_release(&mut self, cancel: &CancellationToken) -> Result<Release> {
        self.inner_mut().resolve_release(cancel).await
    }

    async fn enumerate_assets(
        &self,
        cancel: &CancellationToken,
        release: &Release,
    ) -> Result<Vec<Asset>> {
        self.inner().enumerate_assets(cancel, release).await
    }
}
