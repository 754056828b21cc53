//! Provider contract shared by every hosting backend.
//!
//! A provider turns a version request into a concrete [`Release`] and lists
//! the [`Asset`]s attached to it. Backends differ in pagination and in
//! whether they can look a release up by tag; those quirks stay behind this
//! trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

use crate::Result;
use crate::platform::Platform;

/// Version sentinel requesting the newest release.
pub const VERSION_LATEST: &str = "latest";

/// Strip one leading `v` from a tag (`v1.2.3` -> `1.2.3`).
#[must_use]
pub fn canonical_version(tag: &str) -> &str {
    tag.strip_prefix('v').unwrap_or(tag)
}

/// Whether `version` is the [`VERSION_LATEST`] sentinel.
#[must_use]
pub fn is_latest(version: &str) -> bool {
    version == VERSION_LATEST
}

/// A release discovered by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// Provider identifier used to fetch the release's assets.
    pub id: String,
    /// Git tag the release points at.
    pub tag_name: String,
    /// Display name, when the provider has one.
    pub name: Option<String>,
    /// Whether the release is marked as a pre-release.
    pub prerelease: bool,
    /// Asset links embedded in the release payload; empty for providers
    /// that list assets separately.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<ReleaseLink>,
}

impl Release {
    /// The tag with any leading `v` removed.
    #[must_use]
    pub fn version(&self) -> &str {
        canonical_version(&self.tag_name)
    }

    /// Whether this release satisfies an explicit `version` request.
    ///
    /// The tag must equal the version, or the display name must be
    /// `v{version}`.
    #[must_use]
    pub fn matches_version(&self, version: &str) -> bool {
        self.tag_name == version || self.name.as_deref() == Some(format!("v{version}").as_str())
    }
}

/// A link to a file embedded in a release payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseLink {
    /// Link name as shown by the provider.
    pub name: String,
    /// Where the file is served from.
    pub url: String,
}

/// Where an asset's bytes can be fetched from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AssetLocation {
    /// An API-addressed asset (e.g. a GitHub release asset id).
    Api {
        /// Provider asset id.
        id: u64,
        /// API URL for the asset.
        url: String,
        /// Browser download URL.
        download_url: String,
    },
    /// A direct link.
    Link {
        /// Download URL.
        url: String,
    },
}

impl AssetLocation {
    /// URL the bytes are downloaded from.
    #[must_use]
    pub fn download_url(&self) -> &str {
        match self {
            Self::Api { download_url, .. } => download_url,
            Self::Link { url } => url,
        }
    }
}

/// A candidate file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Filename used for scoring.
    pub name: String,
    /// Source slug of the owning provider (e.g. "github").
    pub source: String,
    /// `owner/repo` of the owning provider.
    pub app: String,
    /// Canonical version of the release the asset belongs to.
    pub version: String,
    /// Provider-specific retrieval metadata.
    pub location: AssetLocation,
}

/// Basename of a URL-shaped identifier, ignoring any query or fragment.
///
/// Empty when an absolute URL has no path.
#[must_use]
pub fn file_name_from_url(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let path = path
        .split_once("://")
        .map_or(path, |(_, rest)| rest.split_once('/').map_or("", |(_, p)| p));
    path.trim_end_matches('/').rsplit('/').next().unwrap_or(path)
}

/// Cache/partition key for a provider and target platform.
#[must_use]
pub fn provider_id(source: &str, owner: &str, repo: &str, platform: Platform) -> String {
    format!(
        "{}-{}-{}-{}-{}",
        source,
        owner.replace('/', "-"),
        repo,
        platform.os,
        platform.arch
    )
}

/// Local directory for one release's downloads.
#[must_use]
pub fn downloads_dir(root: &Path, source: &str, owner: &str, repo: &str, version: &str) -> PathBuf {
    root.join(source).join(owner).join(repo).join(version)
}

/// Trait for hosting backends (GitHub, GitLab).
///
/// Callers drive a provider in order: [`Provider::resolve_release`], then
/// [`Provider::enumerate_assets`] with the release it returned.
///
/// # Example
///
/// ```ignore
/// let cancel = CancellationToken::new();
/// let release = provider.resolve_release(&cancel).await?;
/// let assets = provider.enumerate_assets(&cancel, &release).await?;
/// let names: Vec<_> = assets.iter().map(|a| a.name.as_str()).collect();
/// let scores = score(&names, &ScoreOptions::for_platform(platform, [provider.repo()]));
/// ```
#[async_trait]
pub trait Provider: Send + Sync {
    /// Backend identifier (e.g., "github", "gitlab").
    fn source(&self) -> &'static str;

    /// Owner (user, organization or group path) of the project.
    fn owner(&self) -> &str;

    /// Repository name.
    fn repo(&self) -> &str;

    /// `owner/repo`.
    fn app(&self) -> String {
        format!("{}/{}", self.owner(), self.repo())
    }

    /// Target platform.
    fn platform(&self) -> Platform;

    /// Key unique per source, owner, repo and target platform.
    fn id(&self) -> String {
        provider_id(self.source(), self.owner(), self.repo(), self.platform())
    }

    /// Requested version before resolution, canonical version after.
    fn version(&self) -> &str;

    /// Directory downloads for the current version go to.
    fn downloads_dir(&self) -> PathBuf;

    /// Find the release matching the requested version.
    ///
    /// On success the provider's [`Provider::version`] becomes the release's
    /// canonical version.
    ///
    /// # Errors
    ///
    /// [`crate::Error::ReleaseNotFound`] when nothing matches,
    /// [`crate::Error::Transport`] on API failures and
    /// [`crate::Error::Cancelled`] when `cancel` fires.
    async fn resolve_release(&mut self, cancel: &CancellationToken) -> Result<Release>;

    /// List every file attached to `release`, in provider order.
    ///
    /// # Errors
    ///
    /// [`crate::Error::NoAssetsFound`] when the release has no files.
    async fn enumerate_assets(
        &self,
        cancel: &CancellationToken,
        release: &Release,
    ) -> Result<Vec<Asset>>;
}
