//! Disk-backed HTTP response cache.
//!
//! Wraps any [`Transport`] and revalidates stored responses with
//! `If-None-Match` / `If-Modified-Since`, so repeated resolutions of the same
//! project cost conditional requests instead of full API calls.
//!
//! Structure:
//! ```text
//! {metadata_dir}/
//! └── cache-github-cli-cli-linux-x86_64/
//!     ├── 3f1a...e9.json   # one entry per URL, keyed by SHA-256 of the URL
//!     └── 7c02...41.json
//! ```
//!
//! Every provider id gets its own directory. Entries are written to a
//! temporary file and renamed into place. Any cache failure degrades to a
//! plain request.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace, warn};

use crate::transport::{HttpRequest, HttpResponse, Transport};
use crate::Result;

/// Response headers worth replaying from the cache.
const STORED_HEADERS: &[&str] = &["etag", "last-modified", "link", "content-type"];

/// Per-process sequence for temporary entry names.
static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// A cached response.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    url: String,
    status: u16,
    headers: BTreeMap<String, String>,
    body: String,
}

impl CacheEntry {
    fn validators(&self) -> Vec<(&'static str, String)> {
        let mut validators = Vec::new();
        if let Some(etag) = self.headers.get("etag") {
            validators.push(("If-None-Match", etag.clone()));
        }
        if let Some(modified) = self.headers.get("last-modified") {
            validators.push(("If-Modified-Since", modified.clone()));
        }
        validators
    }

    fn into_response(self) -> HttpResponse {
        HttpResponse {
            status: self.status,
            headers: self.headers,
            body: self.body.into_bytes(),
        }
    }
}

/// Transport wrapper that stores successful responses on disk.
#[derive(Debug, Clone)]
pub struct DiskCache<T> {
    inner: T,
    dir: PathBuf,
}

impl<T: Transport> DiskCache<T> {
    /// Cache responses for provider `id` under `metadata_dir/cache-{id}`.
    #[must_use]
    pub fn new(inner: T, metadata_dir: &Path, id: &str) -> Self {
        Self {
            inner,
            dir: cache_dir(metadata_dir, id),
        }
    }

    /// Get the cache directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Get the path of the entry for `url`.
    #[must_use]
    pub fn entry_path(&self, url: &str) -> PathBuf {
        let digest = Sha256::digest(url.as_bytes());
        self.dir.join(format!("{}.json", hex::encode(digest)))
    }

    /// Remove every cached entry.
    pub async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_dir_all(&self.dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn load(&self, url: &str) -> Option<CacheEntry> {
        let path = self.entry_path(url);
        let data = tokio::fs::read(&path).await.ok()?;
        match serde_json::from_slice::<CacheEntry>(&data) {
            Ok(entry) if entry.url == url => Some(entry),
            Ok(_) => None,
            Err(e) => {
                warn!(?path, error = %e, "Ignoring corrupt cache entry");
                None
            }
        }
    }

    async fn store(&self, url: &str, response: &HttpResponse) {
        let Ok(body) = String::from_utf8(response.body.clone()) else {
            trace!(url, "Not caching non-UTF-8 response");
            return;
        };
        let headers = STORED_HEADERS
            .iter()
            .filter_map(|name| {
                response
                    .header(name)
                    .map(|v| ((*name).to_string(), v.to_string()))
            })
            .collect();
        let entry = CacheEntry {
            url: url.to_string(),
            status: response.status,
            headers,
            body,
        };

        if let Err(e) = self.write_entry(url, &entry).await {
            warn!(url, error = %e, "Failed to write cache entry");
        }
    }

    async fn write_entry(&self, url: &str, entry: &CacheEntry) -> Result<()> {
        let path = self.entry_path(url);
        let data = serde_json::to_vec(entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        tokio::fs::create_dir_all(&self.dir).await?;
        let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
        let tmp = path.with_extension(format!("{}-{seq}.tmp", std::process::id()));
        tokio::fs::write(&tmp, &data).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            tokio::fs::remove_file(&tmp).await.ok();
            return Err(e.into());
        }
        trace!(url, ?path, "Stored response in cache");
        Ok(())
    }
}

#[async_trait]
impl<T: Transport> Transport for DiskCache<T> {
    async fn get(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let cached = self.load(&request.url).await;

        let mut conditional = request.clone();
        if let Some(entry) = &cached {
            for (name, value) in entry.validators() {
                conditional = conditional.header(name, value);
            }
        }

        let response = self.inner.get(&conditional).await?;

        if response.status == 304 {
            if let Some(entry) = cached {
                debug!(url = %request.url, "Cache revalidated");
                return Ok(entry.into_response());
            }
        }

        if response.is_success()
            && (response.header("etag").is_some() || response.header("last-modified").is_some())
        {
            self.store(&request.url, &response).await;
        } else {
            trace!(url = %request.url, status = response.status, "Cache miss, not stored");
        }

        Ok(response)
    }
}

/// Get the cache directory for provider `id`.
#[must_use]
pub fn cache_dir(metadata_dir: &Path, id: &str) -> PathBuf {
    metadata_dir.join(format!("cache-{id}"))
}
