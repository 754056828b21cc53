//! Error types for release resolution.

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for binfetch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving a release and its artifacts.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// No release matched the requested version or the listing criteria.
    #[error("Release not found for {app} (version: {version})")]
    #[diagnostic(
        code(binfetch::release_not_found),
        help("Check the version exists, or enable pre-releases if only pre-releases are published")
    )]
    ReleaseNotFound {
        /// The `owner/repo` that was searched.
        app: String,
        /// The requested version.
        version: String,
    },

    /// A release was found but it has no attached files.
    #[error("No assets found for {app} {version}")]
    #[diagnostic(
        code(binfetch::no_assets_found),
        help("The release exists but publishes no downloadable files")
    )]
    NoAssetsFound {
        /// The `owner/repo` of the release.
        app: String,
        /// The resolved version.
        version: String,
    },

    /// Network failure or an unexpected API response.
    #[error("Request to {url} failed: {message}")]
    #[diagnostic(code(binfetch::transport))]
    Transport {
        /// The URL being requested.
        url: String,
        /// HTTP status, when a response was received.
        status: Option<u16>,
        /// Error message.
        message: String,
    },

    /// The cancellation token fired before the operation completed.
    #[error("Operation cancelled")]
    #[diagnostic(code(binfetch::cancelled))]
    Cancelled,

    /// Invalid configuration.
    #[error("Configuration error: {message}")]
    #[diagnostic(code(binfetch::config), help("{help}"))]
    Config {
        /// The error message.
        message: String,
        /// Help text for the user.
        help: String,
    },

    /// A source string could not be parsed.
    #[error("Invalid source '{input}': {message}")]
    #[diagnostic(
        code(binfetch::invalid_source),
        help("Use 'owner/repo', 'github/owner/repo' or 'gitlab/group/repo', optionally with '@version'")
    )]
    InvalidSource {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        message: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    #[diagnostic(code(binfetch::io))]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a release not found error.
    #[must_use]
    pub fn release_not_found(app: impl Into<String>, version: impl Into<String>) -> Self {
        Self::ReleaseNotFound {
            app: app.into(),
            version: version.into(),
        }
    }

    /// Create a no assets found error.
    #[must_use]
    pub fn no_assets_found(app: impl Into<String>, version: impl Into<String>) -> Self {
        Self::NoAssetsFound {
            app: app.into(),
            version: version.into(),
        }
    }

    /// Create a transport error without a response status.
    #[must_use]
    pub fn transport(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            url: url.into(),
            status: None,
            message: message.into(),
        }
    }

    /// Create a transport error for an unexpected response status.
    #[must_use]
    pub fn status(url: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::Transport {
            url: url.into(),
            status: Some(status),
            message: message.into(),
        }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: help.into(),
        }
    }

    /// Create an invalid source error.
    #[must_use]
    pub fn invalid_source(input: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSource {
            input: input.into(),
            message: message.into(),
        }
    }

    /// Whether the operation was cancelled rather than failing.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Whether the error means the release or its assets do not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::ReleaseNotFound { .. } | Self::NoAssetsFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_not_found_display() {
        let err = Error::release_not_found("cli/cli", "2.40.0");
        assert_eq!(
            err.to_string(),
            "Release not found for cli/cli (version: 2.40.0)"
        );
        assert!(err.is_not_found());
        assert!(!err.is_cancelled());
    }

    #[test]
    fn test_no_assets_found_display() {
        let err = Error::no_assets_found("cli/cli", "2.40.0");
        assert_eq!(err.to_string(), "No assets found for cli/cli 2.40.0");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_cancelled_is_distinguishable() {
        let err = Error::Cancelled;
        assert!(err.is_cancelled());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_status_error_keeps_status() {
        let err = Error::status("https://api.github.com/x", 502, "Bad Gateway");
        match err {
            Error::Transport { status, .. } => assert_eq!(status, Some(502)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_transport_error_without_status() {
        let err = Error::transport("https://gitlab.com", "connection refused");
        assert_eq!(
            err.to_string(),
            "Request to https://gitlab.com failed: connection refused"
        );
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
