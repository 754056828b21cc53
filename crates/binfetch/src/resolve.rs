//! Release resolution end to end: pick the release, list its files, rank them.

use binfetch_core::{
    Asset, CancellationToken, Platform, Provider, Release, Result, ScoreOptions, best, rank,
    score,
};
use serde::Serialize;
use tracing::{debug, info};

/// An asset and its score for the target platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    /// The release file.
    pub asset: Asset,
    /// Score from the platform options.
    pub score: u32,
}

/// The outcome of [`resolve_candidates`].
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    /// The chosen release.
    pub release: Release,
    /// Every asset, best first; equal scores keep provider order.
    pub candidates: Vec<Candidate>,
    #[serde(skip)]
    platform: Platform,
    #[serde(skip)]
    repo: String,
}

impl Resolution {
    /// Highest-ranked asset, if any scored above zero.
    #[must_use]
    pub fn best(&self) -> Option<&Candidate> {
        self.candidates.first().filter(|c| c.score > 0)
    }

    /// Best asset under `opts`, earliest on ties, if any scored above zero.
    #[must_use]
    pub fn select(&self, opts: &ScoreOptions) -> Option<&Asset> {
        let names: Vec<&str> = self.candidates.iter().map(|c| c.asset.name.as_str()).collect();
        let scores = score(&names, opts);
        let winner = best(&scores)?;
        let index = scores.iter().position(|c| std::ptr::eq(c, winner))?;
        self.candidates.get(index).map(|c| &c.asset)
    }

    /// The checksum manifest published with the release.
    #[must_use]
    pub fn checksums(&self) -> Option<&Asset> {
        self.select(&ScoreOptions::for_checksums([self.repo.as_str()]))
    }

    /// The detached signature for the target platform.
    #[must_use]
    pub fn signature(&self) -> Option<&Asset> {
        self.select(&ScoreOptions::for_signatures(self.platform, [self.repo.as_str()]))
    }

    /// The public key or certificate published with the release.
    #[must_use]
    pub fn public_key(&self) -> Option<&Asset> {
        self.select(&ScoreOptions::for_keys([self.repo.as_str()]))
    }
}

/// Resolve the provider's release and rank its assets for the provider's
/// platform.
///
/// # Errors
///
/// Propagates the provider's resolution and enumeration errors unchanged.
pub async fn resolve_candidates<P>(
    provider: &mut P,
    cancel: &CancellationToken,
) -> Result<Resolution>
where
    P: Provider + ?Sized,
{
    let release = provider.resolve_release(cancel).await?;
    let assets = provider.enumerate_assets(cancel, &release).await?;

    let platform = provider.platform();
    let repo = provider.repo().to_string();
    let opts = ScoreOptions::for_platform(platform, [repo.as_str()]);
    let names: Vec<&str> = assets.iter().map(|a| a.name.as_str()).collect();
    let ranked = rank(score(&names, &opts));

    // Same name means same score, so a stable rank keeps duplicates in order.
    let mut pending: Vec<Option<Asset>> = assets.into_iter().map(Some).collect();
    let candidates: Vec<Candidate> = ranked
        .into_iter()
        .filter_map(|s| {
            let slot = pending
                .iter_mut()
                .find(|slot| slot.as_ref().is_some_and(|a| a.name == s.key))?;
            slot.take().map(|asset| Candidate {
                asset,
                score: s.value,
            })
        })
        .collect();

    if let Some(top) = candidates.first() {
        debug!(name = %top.asset.name, score = top.score, "Top candidate");
    }
    info!(
        app = %provider.app(),
        version = %provider.version(),
        %platform,
        candidates = candidates.len(),
        "Resolved release"
    );

    Ok(Resolution {
        release,
        candidates,
        platform,
        repo,
    })
}
