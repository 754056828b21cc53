//! Core of binfetch: deciding which upstream release to install and which
//! of its files is the right artifact for a target platform.
//!
//! This crate provides:
//! - [`Provider`] - the contract every hosting backend implements
//! - [`score`] / [`rank`] / [`best`] - artifact scoring and selection
//! - [`SourceOptions`] - typed, validated configuration
//! - [`ApiClient`] over a swappable [`Transport`], optionally wrapped in the
//!   [`DiskCache`]
//!
//! # Example
//!
//! ```ignore
//! use binfetch_core::{Platform, ScoreOptions, rank, score};
//!
//! let platform = Platform::current();
//! let names = ["tool-linux-amd64.tar.gz", "tool-darwin-arm64.zip"];
//! let ranked = rank(score(&names, &ScoreOptions::for_platform(platform, ["tool"])));
//! ```

pub mod cache;
pub mod client;
pub mod config;
mod error;
pub mod platform;
pub mod provider;
pub mod score;
pub mod transport;

pub use cache::DiskCache;
pub use client::{ApiClient, Fetched, Page, cancellable, join_url};
pub use config::{GitHubSettings, GitLabSettings, SourceOptions};
pub use error::{Error, Result};
pub use platform::{Arch, Os, Platform};
pub use provider::{
    Asset, AssetLocation, Provider, Release, ReleaseLink, VERSION_LATEST, canonical_version,
    is_latest,
};
pub use score::{ScoreOptions, ScoredCandidate, best, rank, score};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};

/// Re-exported so callers and backends share one cancellation token type.
pub use tokio_util::sync::CancellationToken;
