//! Target platform identification.
//!
//! Handles mapping between:
//! - platform strings (e.g., "darwin-arm64", "linux-x86_64", "macos-amd64")
//! - the tokens release filenames use for the same platform
//!   (e.g., "macos", "apple", "amd64", "aarch64")

use serde::{Deserialize, Serialize};
use std::fmt;

/// Platform identifier combining OS and architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Platform {
    /// Operating system.
    pub os: Os,
    /// CPU architecture.
    pub arch: Arch,
}

impl Platform {
    /// Create a new platform.
    #[must_use]
    pub const fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// Get the platform this process is running on.
    ///
    /// Falls back to linux/x86_64 on targets binfetch has no artifacts for.
    #[must_use]
    pub fn current() -> Self {
        Self {
            os: Os::parse(std::env::consts::OS).unwrap_or(Os::Linux),
            arch: Arch::parse(std::env::consts::ARCH).unwrap_or(Arch::X86_64),
        }
    }

    /// Parse from string like "darwin-arm64" or "macos-amd64".
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let (os, arch) = s.split_once('-')?;
        Some(Self {
            os: Os::parse(os)?,
            arch: Arch::parse(arch)?,
        })
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}

/// Operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    /// Linux.
    Linux,
    /// macOS.
    Darwin,
    /// Windows.
    Windows,
    /// FreeBSD.
    FreeBsd,
}

impl Os {
    /// Parse from string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "linux" => Some(Self::Linux),
            "darwin" | "macos" | "osx" => Some(Self::Darwin),
            "windows" | "win" => Some(Self::Windows),
            "freebsd" => Some(Self::FreeBsd),
            _ => None,
        }
    }

    /// Tokens release filenames use for this OS, canonical name first.
    ///
    /// Bare `win` is left out since it is a substring of `darwin`.
    #[must_use]
    pub const fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Linux => &["linux"],
            Self::Darwin => &["darwin", "macos", "apple", "osx"],
            Self::Windows => &["windows", "win64", "win32"],
            Self::FreeBsd => &["freebsd"],
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.aliases()[0])
    }
}

/// CPU architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    /// x86-64 / AMD64.
    X86_64,
    /// ARM64 / AArch64.
    Arm64,
    /// 32-bit x86.
    X86,
    /// 32-bit ARM.
    Arm,
}

impl Arch {
    /// Parse from string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "x86_64" | "amd64" | "x64" => Some(Self::X86_64),
            "arm64" | "aarch64" => Some(Self::Arm64),
            "x86" | "386" | "i386" | "i686" => Some(Self::X86),
            "arm" | "armv7" | "armv6" => Some(Self::Arm),
            _ => None,
        }
    }

    /// Tokens release filenames use for this architecture.
    ///
    /// Bare `x86` and `arm` are left out: they are substrings of `x86_64`
    /// and `arm64`.
    #[must_use]
    pub const fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::X86_64 => &["x86_64", "amd64", "x64"],
            Self::Arm64 => &["arm64", "aarch64"],
            Self::X86 => &["386", "i386", "i686"],
            Self::Arm => &["armv7", "armv6", "armhf"],
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.aliases()[0])
    }
}
