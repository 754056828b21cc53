//! GitHub Releases backend for binfetch.
//!
//! Resolves a version request against the GitHub REST API:
//! - `latest` asks `/releases/latest` first and falls back to walking the
//!   release listing when GitHub answers 404
//! - explicit versions walk the listing, newest first, one page at a time
//! - assets are listed from `/releases/{id}/assets`, following pagination
//!
//! Works against github.com and GitHub Enterprise (`api/v3`) base URLs.

mod api;

use async_trait::async_trait;
use binfetch_core::{
    ApiClient, Asset, CancellationToken, Error, Fetched, Platform, Provider, Release, Result,
    ReqwestTransport, SourceOptions, Transport, canonical_version, is_latest, join_url,
    provider::{downloads_dir, provider_id},
};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::api::{GitHubAsset, GitHubRelease};

/// Source slug for GitHub.
pub const SOURCE: &str = "github";

const PER_PAGE: &str = "100";
const API_VERSION: &str = "2022-11-28";

/// [`Provider`] for a GitHub repository.
///
/// # Example
///
/// ```ignore
/// let options = SourceOptions::from_env();
/// let mut provider = GitHubProvider::new("cli", "cli", "latest", Platform::current(), options)?;
/// let cancel = CancellationToken::new();
/// let release = provider.resolve_release(&cancel).await?;
/// let assets = provider.enumerate_assets(&cancel, &release).await?;
/// ```
#[derive(Debug)]
pub struct GitHubProvider {
    owner: String,
    repo: String,
    version: String,
    platform: Platform,
    options: SourceOptions,
    client: ApiClient,
}

impl GitHubProvider {
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
    /// The transport is still wrapped in the response cache under
    /// `options.metadata_dir`.
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
            options.github.token.clone(),
        )
        .with_header("X-GitHub-Api-Version", API_VERSION);

        Ok(Self {
            owner,
            repo,
            version: version.into(),
            platform,
            options,
            client,
        })
    }

    fn url(&self, tail: &[&str], query: &[(&str, &str)]) -> Result<String> {
        let mut segments = vec!["repos", self.owner.as_str(), self.repo.as_str()];
        segments.extend_from_slice(tail);
        join_url(&self.options.github.base_url, &segments, query)
    }

    /// Walk the release listing until a release satisfies the request.
    async fn find_in_listing(&self, cancel: &CancellationToken) -> Result<Option<Release>> {
        let mut next = Some(self.url(&["releases"], &[("per_page", PER_PAGE)])?);
        let mut page_count = 0usize;

        while let Some(url) = next {
            let page = match self.client.get_json::<Vec<GitHubRelease>>(&url, cancel).await? {
                Fetched::Found(page) => page,
                Fetched::NotFound if page_count == 0 => {
                    debug!(app = %self.app(), "Release listing not found");
                    return Ok(None);
                }
                Fetched::NotFound => return Err(missing_page(&url)),
            };
            page_count += 1;
            debug!(page = page_count, releases = page.value.len(), "Scanning releases");

            let wanted = page.value.into_iter().map(Release::from).find(|r| {
                (self.options.include_pre_releases && r.prerelease)
                    || r.matches_version(&self.version)
            });
            if wanted.is_some() {
                return Ok(wanted);
            }
            next = page.next;
        }

        Ok(None)
    }
}

/// A `next` link that answers 404 mid-walk.
fn missing_page(url: &str) -> Error {
    Error::status(url, 404, "HTTP 404: pagination link no longer exists")
}

#[async_trait]
impl Provider for GitHubProvider {
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
        let mut release = None;

        if is_latest(&self.version) {
            let url = self.url(&["releases", "latest"], &[])?;
            match self.client.get_json::<GitHubRelease>(&url, cancel).await? {
                Fetched::Found(page) => release = Some(Release::from(page.value)),
                Fetched::NotFound => {
                    debug!(app = %self.app(), "No latest release, scanning listing");
                }
            }
        }

        if release.is_none() {
            release = self.find_in_listing(cancel).await?;
        }

        let release = release.ok_or_else(|| Error::release_not_found(self.app(), &self.version))?;
        self.version = canonical_version(&release.tag_name).to_string();
        info!(app = %self.app(), version = %self.version, "Installing version");
        Ok(release)
    }

    async fn enumerate_assets(
        &self,
        cancel: &CancellationToken,
        release: &Release,
    ) -> Result<Vec<Asset>> {
        let app = self.app();
        let version = release.version();
        let mut next = Some(self.url(
            &["releases", release.id.as_str(), "assets"],
            &[("per_page", PER_PAGE)],
        )?);
        let mut assets = Vec::new();
        let mut first = true;

        while let Some(url) = next {
            match self.client.get_json::<Vec<GitHubAsset>>(&url, cancel).await? {
                Fetched::Found(page) => {
                    assets.extend(page.value.into_iter().map(|a| a.into_asset(&app, version)));
                    next = page.next;
                }
                Fetched::NotFound if first => next = None,
                Fetched::NotFound => return Err(missing_page(&url)),
            }
            first = false;
        }

        if assets.is_empty() {
            return Err(Error::no_assets_found(app, version));
        }
        debug!(%app, count = assets.len(), "Listed assets");
        Ok(assets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use binfetch_core::{Arch, HttpRequest, HttpResponse, Os};
    use std::path::Path;

    /// Serves canned bodies by URL.
    #[derive(Default)]
    struct Routes {
        routes: Vec<(String, HttpResponse)>,
    }

    impl Routes {
        fn with(mut self, url: &str, status: u16, body: &str) -> Self {
            self.routes.push((url.to_string(), HttpResponse::new(status, body)));
            self
        }
    }

    #[async_trait]
    impl Transport for Routes {
        async fn get(&self, request: &HttpRequest) -> Result<HttpResponse> {
            Ok(self
                .routes
                .iter()
                .find(|(url, _)| *url == request.url)
                .map_or_else(|| HttpResponse::new(404, "{}"), |(_, r)| r.clone()))
        }
    }

    fn provider(dir: &Path, version: &str, routes: Routes) -> GitHubProvider {
        let options = SourceOptions::new(dir.join("dl"), dir.join("meta"));
        GitHubProvider::with_transport(
            "cli",
            "cli",
            version,
            Platform::new(Os::Linux, Arch::X86_64),
            options,
            routes,
        )
        .unwrap()
    }

    #[test]
    fn test_identity() {
        let dir = tempfile::tempdir().unwrap();
        let p = provider(dir.path(), "latest", Routes::default());
        assert_eq!(p.source(), "github");
        assert_eq!(p.app(), "cli/cli");
        assert_eq!(p.id(), "github-cli-cli-linux-x86_64");
        assert_eq!(p.version(), "latest");
        assert_eq!(
            p.downloads_dir(),
            dir.path().join("dl").join("github").join("cli").join("cli").join("latest")
        );
    }

    #[test]
    fn test_invalid_options_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let options = SourceOptions::new(dir.path(), dir.path()).with_github_url("ftp://nope");
        let err = GitHubProvider::with_transport(
            "cli",
            "cli",
            "latest",
            Platform::new(Os::Linux, Arch::X86_64),
            options,
            Routes::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[tokio::test]
    async fn test_latest_direct() {
        let dir = tempfile::tempdir().unwrap();
        let routes = Routes::default().with(
            "https://api.github.com/repos/cli/cli/releases/latest",
            200,
            r#"{"id": 1, "tag_name": "v2.40.0", "name": "GitHub CLI 2.40.0", "prerelease": false}"#,
        );
        let mut p = provider(dir.path(), "latest", routes);

        let release = p.resolve_release(&CancellationToken::new()).await.unwrap();
        assert_eq!(release.tag_name, "v2.40.0");
        assert_eq!(p.version(), "2.40.0");
        assert!(p.downloads_dir().ends_with("github/cli/cli/2.40.0"));
    }

    #[tokio::test]
    async fn test_explicit_version_skips_latest_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let routes = Routes::default().with(
            "https://api.github.com/repos/cli/cli/releases?per_page=100",
            200,
            r#"[{"id": 3, "tag_name": "2.0.0"}, {"id": 2, "tag_name": "1.0.0"}]"#,
        );
        let mut p = provider(dir.path(), "1.0.0", routes);

        let release = p.resolve_release(&CancellationToken::new()).await.unwrap();
        assert_eq!(release.id, "2");
        assert_eq!(p.version(), "1.0.0");
    }

    #[tokio::test]
    async fn test_missing_release() {
        let dir = tempfile::tempdir().unwrap();
        let routes = Routes::default().with(
            "https://api.github.com/repos/cli/cli/releases?per_page=100",
            200,
            r#"[{"id": 3, "tag_name": "2.0.0"}]"#,
        );
        let mut p = provider(dir.path(), "9.9.9", routes);

        let err = p.resolve_release(&CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, Error::ReleaseNotFound { ref version, .. } if version == "9.9.9"));
        assert_eq!(p.version(), "9.9.9");
    }
}
