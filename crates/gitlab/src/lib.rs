//! GitLab Releases backend for binfetch.
//!
//! GitLab can look a release up by tag, so there is no listing walk: a
//! request resolves with one call to `releases/permalink/latest` or
//! `releases/{tag}`, and the asset links come embedded in that payload.
//! Projects in nested groups are addressed by their URL-encoded full path.

use async_trait::async_trait;
use binfetch_core::{
    ApiClient, Asset, AssetLocation, CancellationToken, Error, Fetched, Platform, Provider,
    Release, ReleaseLink, ReqwestTransport, Result, SourceOptions, Transport, canonical_version,
    is_latest, join_url,
    provider::{downloads_dir, file_name_from_url, provider_id},
};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::{debug, info};

/// Source slug for GitLab.
pub const SOURCE: &str = "gitlab";

#[derive(Debug, Deserialize)]
struct GitLabRelease {
    tag_name: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    upcoming_release: bool,
    #[serde(default)]
    assets: GitLabAssets,
}

#[derive(Debug, Default, Deserialize)]
struct GitLabAssets {
    #[serde(default)]
    links: Vec<GitLabLink>,
}

#[derive(Debug, Deserialize)]
struct GitLabLink {
    name: String,
    url: String,
}

impl From<GitLabRelease> for Release {
    fn from(r: GitLabRelease) -> Self {
        Self {
            id: r.tag_name.clone(),
            tag_name: r.tag_name,
            name: r.name,
            prerelease: r.upcoming_release,
            links: r
                .assets
                .links
                .into_iter()
                .map(|l| ReleaseLink {
                    name: l.name,
                    url: l.url,
                })
                .collect(),
        }
    }
}

/// [`Provider`] for a GitLab project.
#[derive(Debug)]
pub struct GitLabProvider {
    owner: String,
    repo: String,
    version: String,
    platform: Platform,
    options: SourceOptions,
    client: ApiClient,
}

impl GitLabProvider {
    /// Create a provider backed by the network and the response cache.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when `options` fail validation or the
    /// HTTP client cannot be built.
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        version: impl Into<String>,
        platform: Platform,
        options: SourceOptions,
    ) -> Result<Self> {
        Self::with_transport(owner, repo, version, platform, options, ReqwestTransport::new()?)
    }

    /// Create a provider over a caller-supplied transport.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when `options` fail validation.
    pub fn with_transport<T: Transport + 'static>(
        owner: impl Into<String>,
        repo: impl Into<String>,
        version: impl Into<String>,
        platform: Platform,
        options: SourceOptions,
        transport: T,
    ) -> Result<Self> {
        options.validate()?;
        let owner = owner.into();
        let repo = repo.into();
        let id = provider_id(SOURCE, &owner, &repo, platform);
        let client = ApiClient::cached(
            transport,
            &options.metadata_dir,
            &id,
            options.gitlab.token.clone(),
        );

        Ok(Self {
            owner,
            repo,
            version: version.into(),
            platform,
            options,
            client,
        })
    }

    fn release_url(&self) -> Result<String> {
        let project = self.app();
        let mut segments = vec!["api", "v4", "projects", project.as_str(), "releases"];
        if is_latest(&self.version) {
            segments.extend(["permalink", "latest"]);
        } else {
            segments.push(&self.version);
        }
        join_url(&self.options.gitlab.base_url, &segments, &[])
    }
}

#[async_trait]
impl Provider for GitLabProvider {
    fn source(&self) -> &'static str {
        SOURCE
    }

    fn owner(&self) -> &str {
        &self.owner
    }

    fn repo(&self) -> &str {
        &self.repo
    }

    fn platform(&self) -> Platform {
        self.platform
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn downloads_dir(&self) -> PathBuf {
        downloads_dir(
            &self.options.downloads_dir,
            SOURCE,
            &self.owner,
            &self.repo,
            &self.version,
        )
    }

    async fn resolve_release(&mut self, cancel: &CancellationToken) -> Result<Release> {
        let url = self.release_url()?;
        let release: Release = match self.client.get_json::<GitLabRelease>(&url, cancel).await? {
            Fetched::Found(page) => page.value.into(),
            Fetched::NotFound => return Err(Error::release_not_found(self.app(), &self.version)),
        };

        self.version = canonical_version(&release.tag_name).to_string();
        info!(app = %self.app(), version = %self.version, "Installing version");
        Ok(release)
    }

    async fn enumerate_assets(
        &self,
        cancel: &CancellationToken,
        release: &Release,
    ) -> Result<Vec<Asset>> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let app = self.app();
        let version = release.version();
        if release.links.is_empty() {
            return Err(Error::no_assets_found(app, version));
        }

        let assets: Vec<Asset> = release
            .links
            .iter()
            .map(|link| {
                let from_url = file_name_from_url(&link.url);
                let name = if from_url.is_empty() {
                    link.name.clone()
                } else {
                    from_url.to_string()
                };
                Asset {
                    name,
                    source: SOURCE.to_string(),
                    app: app.clone(),
                    version: version.to_string(),
                    location: AssetLocation::Link {
                        url: link.url.clone(),
                    },
                }
            })
            .collect();

        debug!(%app, count = assets.len(), "Listed assets");
        Ok(assets)
    }
}
