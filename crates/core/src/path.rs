//! Address parsing and resolution
//!
//! Remote addresses have the format `s3://bucket[/key]`. Any other scheme,
//! or no scheme at all, names a local filesystem path.

use std::path::PathBuf;

use crate::error::{Error, Result};

/// Scheme that identifies the remote store
pub const REMOTE_SCHEME: &str = "s3";

/// A parsed remote path pointing to an S3 location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePath {
    /// Bucket name
    pub bucket: String,
    /// Object key (empty for bucket root, never starts with `/`)
    pub key: String,
    /// Whether the path ends with a slash (directory semantics)
    pub is_dir: bool,
}

impl RemotePath {
    /// Create a new RemotePath, stripping any leading `/` from the key
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        let key = strip_leading_slash(&key.into()).to_string();
        let is_dir = key.ends_with('/') || key.is_empty();
        Self {
            bucket: bucket.into(),
            key,
            is_dir,
        }
    }

    /// Get the full address (s3://bucket/key)
    pub fn to_url(&self) -> String {
        if self.key.is_empty() {
            format!("{REMOTE_SCHEME}://{}", self.bucket)
        } else {
            format!("{REMOTE_SCHEME}://{}/{}", self.bucket, self.key)
        }
    }
}

impl std::fmt::Display for RemotePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_url())
    }
}

/// Parsed path that can be either local or remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedPath {
    /// Local filesystem path
    Local(PathBuf),
    /// Remote S3 path
    Remote(RemotePath),
}

impl std::fmt::Display for ParsedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParsedPath::Local(p) => write!(f, "{}", p.display()),
            ParsedPath::Remote(r) => write!(f, "{r}"),
        }
    }
}

/// Parse an operator-supplied address into a ParsedPath
///
/// - `s3://bucket[/key]` is remote; the scheme is matched case-insensitively
/// - `file:///abs/path` is the local path it names
/// - anything else is taken verbatim as a local path
pub fn parse_path(path: &str) -> Result<ParsedPath> {
    if path.is_empty() {
        return Err(Error::InvalidPath("Path cannot be empty".into()));
    }

    let Some((scheme, rest)) = path.split_once("://") else {
        return Ok(ParsedPath::Local(PathBuf::from(path)));
    };

    if scheme.eq_ignore_ascii_case(REMOTE_SCHEME) {
        let (bucket, key) = rest.split_once('/').unwrap_or((rest, ""));
        if bucket.is_empty() {
            return Err(Error::InvalidPath(format!(
                "Bucket name cannot be empty in '{path}'. Use format: {REMOTE_SCHEME}://bucket[/key]"
            )));
        }
        return Ok(ParsedPath::Remote(RemotePath::new(bucket, key)));
    }

    if scheme.eq_ignore_ascii_case("file") {
        let url = url::Url::parse(path)?;
        let local = url
            .to_file_path()
            .map_err(|_| Error::InvalidPath(format!("Not a local file URL: {path}")))?;
        return Ok(ParsedPath::Local(local));
    }

    Ok(ParsedPath::Local(PathBuf::from(path)))
}

/// Parse an address that must name a remote location
pub fn parse_remote(path: &str) -> Result<RemotePath> {
    match parse_path(path)? {
        ParsedPath::Remote(remote) => Ok(remote),
        ParsedPath::Local(_) => Err(Error::InvalidPath(format!(
            "'{path}' is not a remote address. Use format: {REMOTE_SCHEME}://bucket[/key]"
        ))),
    }
}

fn strip_leading_slash(key: &str) -> &str {
    key.trim_start_matches('/')
}
