//! GitHub REST payloads.

use binfetch_core::{Asset, AssetLocation, Release};
use serde::Deserialize;

/// Release object from `/repos/{owner}/{repo}/releases`.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubRelease {
    pub id: u64,
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub prerelease: bool,
}

impl From<GitHubRelease> for Release {
    fn from(r: GitHubRelease) -> Self {
        Self {
            id: r.id.to_string(),
            tag_name: r.tag_name,
            name: r.name,
            prerelease: r.prerelease,
            links: Vec::new(),
        }
    }
}

/// Asset object from `/repos/{owner}/{repo}/releases/{id}/assets`.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubAsset {
    pub id: u64,
    pub name: String,
    pub url: String,
    pub browser_download_url: String,
}

impl GitHubAsset {
    pub fn into_asset(self, app: &str, version: &str) -> Asset {
        Asset {
            name: self.name,
            source: crate::SOURCE.to_string(),
            app: app.to_string(),
            version: version.to_string(),
            location: AssetLocation::Api {
                id: self.id,
                url: self.url,
                download_url: self.browser_download_url,
            },
        }
    }
}
