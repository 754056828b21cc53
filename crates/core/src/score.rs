//! Artifact scoring.
//!
//! Every candidate filename earns independent, additive points for matching
//! the target OS, the target architecture, an accepted file extension and a
//! project name. The output keeps the input order; picking the winner is
//! left to [`rank`] and [`best`].

use tracing::trace;

use crate::platform::{Os, Platform};

/// Extension token for files with no (or no recognizable) extension.
pub const UNKNOWN_EXTENSION: &str = "unknown";

/// Extensions of detached public keys and certificates.
pub const KEY_FILE_EXTENSIONS: &[&str] = &["pem", "pub"];

const OS_POINTS: u32 = 35;
const ARCH_POINTS: u32 = 35;
const EXTENSION_POINTS: u32 = 20;
const KEY_FILE_POINTS: u32 = 40;
const NAME_POINTS: u32 = 10;

/// Match criteria for one scoring call.
///
/// All tokens are compared case-insensitively. An empty `os` or `arch` list
/// means no platform filtering was requested, so that criterion awards
/// nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreOptions {
    /// Accepted operating-system tokens.
    pub os: Vec<String>,
    /// Accepted architecture tokens.
    pub arch: Vec<String>,
    /// Accepted file extensions, without the leading dot.
    pub extensions: Vec<String>,
    /// Substrings that tie a filename to the requested project.
    pub names: Vec<String>,
}

impl ScoreOptions {
    /// Create empty options; every candidate scores zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the accepted OS tokens.
    #[must_use]
    pub fn with_os<I, S>(mut self, os: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.os = os.into_iter().map(Into::into).collect();
        self
    }

    /// Set the accepted architecture tokens.
    #[must_use]
    pub fn with_arch<I, S>(mut self, arch: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arch = arch.into_iter().map(Into::into).collect();
        self
    }

    /// Set the accepted extensions.
    #[must_use]
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Set the project name substrings.
    #[must_use]
    pub fn with_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Options for picking the binary or archive for `platform`.
    ///
    /// The extension list always carries [`UNKNOWN_EXTENSION`] so bare
    /// binaries stay eligible on their platform points.
    #[must_use]
    pub fn for_platform<I, S>(platform: Platform, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let extensions: &[&str] = match platform.os {
            Os::Windows => &["zip", "exe", "gz", "tgz", "xz", "tar", "7z"],
            Os::Darwin => &["gz", "tgz", "xz", "bz2", "zst", "tar", "zip"],
            Os::Linux | Os::FreeBsd => &["gz", "tgz", "xz", "txz", "bz2", "zst", "tar", "zip"],
        };

        Self::new()
            .with_os(platform.os.aliases().iter().copied())
            .with_arch(platform.arch.aliases().iter().copied())
            .with_extensions(extensions.iter().copied().chain([UNKNOWN_EXTENSION]))
            .with_names(names)
    }

    /// Options for picking a checksum manifest; platform-independent.
    #[must_use]
    pub fn for_checksums<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut all: Vec<String> = ["checksums", "sha256sums", "shasums"]
            .into_iter()
            .map(String::from)
            .collect();
        all.extend(names.into_iter().map(Into::into));

        Self::new()
            .with_extensions(["txt", "sha256", "sha512", "sha256sum", "sha512sum"])
            .with_names(all)
    }

    /// Options for picking a detached signature for `platform`.
    #[must_use]
    pub fn for_signatures<I, S>(platform: Platform, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::for_platform(platform, names).with_extensions(["sig", "asc"])
    }

    /// Options for picking a public key or certificate; platform-independent.
    #[must_use]
    pub fn for_keys<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new()
            .with_extensions(KEY_FILE_EXTENSIONS.iter().copied())
            .with_names(names)
    }

    fn normalized(&self) -> Self {
        let lower = |v: &[String]| -> Vec<String> { v.iter().map(|s| s.to_lowercase()).collect() };
        Self {
            os: lower(&self.os),
            arch: lower(&self.arch),
            extensions: lower(&self.extensions),
            names: lower(&self.names),
        }
    }
}

/// A filename paired with its score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredCandidate {
    /// The candidate filename.
    pub key: String,
    /// Accumulated points; zero means nothing matched.
    pub value: u32,
}

impl ScoredCandidate {
    /// Create a scored candidate.
    #[must_use]
    pub fn new(key: impl Into<String>, value: u32) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Extension class of a filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind<'a> {
    /// No extension, or one that is really a version or platform fragment.
    Unknown,
    /// `pem` or `pub`.
    KeyFile(&'a str),
    Ordinary(&'a str),
}

/// Classify a lower-cased filename by its final extension.
///
/// `tool-1.2.3` and `tool-1.2-linux` have no extension: a trailing segment
/// that is all digits or contains separators is part of the name.
fn classify(name: &str) -> FileKind<'_> {
    let Some((stem, ext)) = name.rsplit_once('.') else {
        return FileKind::Unknown;
    };

    if stem.is_empty()
        || ext.is_empty()
        || ext == UNKNOWN_EXTENSION
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
        || ext.chars().all(|c| c.is_ascii_digit())
    {
        return FileKind::Unknown;
    }

    if KEY_FILE_EXTENSIONS.contains(&ext) {
        FileKind::KeyFile(ext)
    } else {
        FileKind::Ordinary(ext)
    }
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles.iter().any(|n| !n.is_empty() && haystack.contains(n.as_str()))
}

fn score_one(name: &str, opts: &ScoreOptions) -> u32 {
    let lower = name.to_lowercase();
    let has_ext = |ext: &str| opts.extensions.iter().any(|e| e == ext);

    let os = if contains_any(&lower, &opts.os) { OS_POINTS } else { 0 };
    let arch = if contains_any(&lower, &opts.arch) { ARCH_POINTS } else { 0 };
    let extension = match classify(&lower) {
        FileKind::Unknown => 0,
        FileKind::KeyFile(ext) if has_ext(ext) => KEY_FILE_POINTS,
        FileKind::Ordinary(ext) if has_ext(ext) => EXTENSION_POINTS,
        FileKind::KeyFile(_) | FileKind::Ordinary(_) => 0,
    };
    let names = if contains_any(&lower, &opts.names) { NAME_POINTS } else { 0 };

    let total = os + arch + extension + names;
    trace!(name, os, arch, extension, names, total, "Scored candidate");
    total
}

/// Score every filename against `opts`.
///
/// Returns one entry per input, in input order.
#[must_use]
pub fn score<S: AsRef<str>>(names: &[S], opts: &ScoreOptions) -> Vec<ScoredCandidate> {
    let opts = opts.normalized();
    names
        .iter()
        .map(|name| {
            let name = name.as_ref();
            ScoredCandidate::new(name, score_one(name, &opts))
        })
        .collect()
}

/// Order candidates best first; equal scores keep their input order.
#[must_use]
pub fn rank(mut candidates: Vec<ScoredCandidate>) -> Vec<ScoredCandidate> {
    candidates.sort_by(|a, b| b.value.cmp(&a.value));
    candidates
}

/// The highest-scoring candidate, earliest on ties, if any scored above zero.
#[must_use]
pub fn best(candidates: &[ScoredCandidate]) -> Option<&ScoredCandidate> {
    candidates
        .iter()
        .filter(|c| c.value > 0)
        .fold(None, |best: Option<&ScoredCandidate>, c| match best {
            Some(b) if b.value >= c.value => Some(b),
            _ => Some(c),
        })
}
