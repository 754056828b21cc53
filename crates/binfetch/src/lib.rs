//! binfetch - find the right release artifact for your platform.
//!
//! Parse a source such as `cli/cli@v2.40.0` or `gitlab/group/tool`, build
//! the matching [`Source`], and let [`resolve_candidates`] resolve the
//! release and rank its files for the target platform:
//!
//! ```ignore
//! use binfetch::{CancellationToken, Platform, Source, SourceOptions, SourceSpec, resolve_candidates};
//!
//! let spec: SourceSpec = "sharkdp/fd".parse()?;
//! let mut source = Source::new(&spec, Platform::current(), SourceOptions::from_env())?;
//! let resolution = resolve_candidates(&mut source, &CancellationToken::new()).await?;
//! if let Some(best) = resolution.best() {
//!     println!("{} -> {}", best.asset.name, best.asset.location.download_url());
//! }
//! ```
//!
//! Downloading, verification and installation are left to the caller.

mod resolve;
mod source;

pub use resolve::{Candidate, Resolution, resolve_candidates};
pub use source::{Source, SourceKind, SourceSpec};

pub use binfetch_core::{
    Arch, Asset, AssetLocation, CancellationToken, Error, Os, Platform, Provider, Release,
    Result, ScoreOptions, ScoredCandidate, SourceOptions, best, rank, score,
};
pub use binfetch_github::GitHubProvider;
pub use binfetch_gitlab::GitLabProvider;
