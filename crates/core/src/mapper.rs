//! Mapping between local paths and remote keys
//!
//! Both directions are pure string/path manipulation. Nothing here touches
//! the filesystem or the network.

use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Map a local file under `root` to a key under `target_prefix`
///
/// The relative part of `local_path` is joined onto the prefix with `/`
/// separators. When `local_path` is `root` itself (a single file was
/// pushed), the prefix is the key.
pub fn to_remote_key(root: &Path, local_path: &Path, target_prefix: &str) -> Result<String> {
    let relative = local_path.strip_prefix(root).map_err(|_| {
        Error::InvalidPath(format!(
            "{} is not under {}",
            local_path.display(),
            root.display()
        ))
    })?;

    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => segments.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => {
                return Err(Error::InvalidPath(format!(
                    "{} escapes {}",
                    local_path.display(),
                    root.display()
                )));
            }
        }
    }

    let prefix = target_prefix.trim_start_matches('/').trim_end_matches('/');
    let suffix = segments.join("/");

    match (prefix.is_empty(), suffix.is_empty()) {
        (true, true) => Err(Error::InvalidPath(format!(
            "No object key for {}: target has no key",
            local_path.display()
        ))),
        (true, false) => Ok(suffix),
        (false, true) => Ok(prefix.to_string()),
        (false, false) => Ok(format!("{prefix}/{suffix}")),
    }
}

/// Map a listed object key back to a path under `dest_root`
///
/// `remote_root_key` is the prefix the listing was made with. An object whose
/// key equals the prefix maps to `dest_root` itself, so pulling a single
/// object writes it to `dest_root`.
pub fn to_local_path(remote_root_key: &str, object_key: &str, dest_root: &Path) -> Result<PathBuf> {
    let mut path = dest_root.to_path_buf();
    for segment in relative_key(remote_root_key, object_key).split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                return Err(Error::InvalidPath(format!(
                    "Object key '{object_key}' escapes {}",
                    dest_root.display()
                )));
            }
            part => path.push(part),
        }
    }
    Ok(path)
}

/// Whether a listed key is a directory marker rather than file content
pub fn is_directory_marker(object_key: &str) -> bool {
    object_key.ends_with('/')
}

fn relative_key<'a>(remote_root_key: &str, object_key: &'a str) -> &'a str {
    object_key
        .strip_prefix(remote_root_key)
        .unwrap_or(object_key)
        .trim_start_matches('/')
}
