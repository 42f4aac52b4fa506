//! Error types for s3t-core
//!
//! Provides a unified error type that can be converted to appropriate exit codes.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for s3t-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for s3t-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Address or local path outside the expected scheme or root
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Source and target use the same addressing scheme
    #[error("Unsupported sync direction: {0}")]
    UnsupportedDirection(String),

    /// A required identifier is missing
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// IO error on a specific local file
    #[error("IO error on {}: {source}", path.display())]
    LocalIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Authentication or permission failure reported by the store
    #[error("Access denied: {0}")]
    Auth(String),

    /// Bucket, object or upload not found in the store
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other failed call to the store
    #[error("Store error: {0}")]
    Store(String),

    /// Feature not supported by this client
    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),

    /// The run was cancelled before it finished
    #[error("Operation cancelled")]
    Cancelled,

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Wrap an IO error with the local path it happened on
    pub fn local_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::LocalIo {
            path: path.into(),
            source,
        }
    }

    /// Whether this error was reported by the remote store
    pub const fn is_store_error(&self) -> bool {
        matches!(self, Error::Store(_) | Error::NotFound(_) | Error::Auth(_))
    }

    /// Get the appropriate exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidPath(_)
            | Error::Config(_)
            | Error::UnsupportedDirection(_)
            | Error::InvalidRequest(_)
            | Error::InvalidUrl(_) => 2, // UsageError
            Error::Store(_) => 3,              // StoreError
            Error::Auth(_) => 4,               // AuthError
            Error::NotFound(_) => 5,           // NotFound
            Error::UnsupportedFeature(_) => 7, // UnsupportedFeature
            Error::Cancelled => 130,           // Interrupted
            _ => 1,                            // GeneralError
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_exit_codes() {
        assert_eq!(Error::InvalidPath("test".into()).exit_code(), 2);
        assert_eq!(Error::Config("test".into()).exit_code(), 2);
        assert_eq!(Error::UnsupportedDirection("test".into()).exit_code(), 2);
        assert_eq!(Error::InvalidRequest("test".into()).exit_code(), 2);
        assert_eq!(Error::Store("test".into()).exit_code(), 3);
        assert_eq!(Error::Auth("test".into()).exit_code(), 4);
        assert_eq!(Error::NotFound("test".into()).exit_code(), 5);
        assert_eq!(Error::UnsupportedFeature("test".into()).exit_code(), 7);
        assert_eq!(Error::Cancelled.exit_code(), 130);
        assert_eq!(Error::General("test".into()).exit_code(), 1);
        assert_eq!(
            Error::local_io("/tmp/x", std::io::Error::other("boom")).exit_code(),
            1
        );
    }

    #[test]
    fn test_store_error_family() {
        assert!(Error::Store("x".into()).is_store_error());
        assert!(Error::NotFound("x".into()).is_store_error());
        assert!(Error::Auth("x".into()).is_store_error());
        assert!(!Error::InvalidPath("x".into()).is_store_error());
        assert!(!Error::Io(std::io::Error::other("x")).is_store_error());
    }

    #[test]
    fn test_error_display() {
        let err = Error::InvalidPath("/bad/path".into());
        assert_eq!(err.to_string(), "Invalid path: /bad/path");

        let err = Error::local_io(
            "/data/a.txt",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert_eq!(err.to_string(), "IO error on /data/a.txt: missing");
    }
}
