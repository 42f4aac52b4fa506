//! Multipart upload session maintenance
//!
//! Sessions are created implicitly by large uploads. This module only
//! observes them and can abort them to release the space held by their parts.

use crate::error::{Error, Result};
use crate::path::RemotePath;
use crate::traits::{MultipartUpload, ObjectStore, PartInfo};

/// Lists and aborts incomplete multipart uploads
pub struct MultipartManager<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: ObjectStore + ?Sized> MultipartManager<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Incomplete uploads in `bucket`
    pub async fn list_uploads(&self, bucket: &str) -> Result<Vec<MultipartUpload>> {
        if bucket.is_empty() {
            return Err(Error::InvalidRequest("Bucket name must be specified".into()));
        }
        self.store.list_multipart_uploads(bucket).await
    }

    /// Parts committed so far to `upload_id`
    pub async fn list_parts(&self, path: &RemotePath, upload_id: &str) -> Result<Vec<PartInfo>> {
        validate_session(path, upload_id)?;
        self.store.list_parts(path, upload_id).await
    }

    /// Abort `upload_id` and free its parts
    ///
    /// An unknown or already aborted upload is reported by the store as not found.
    pub async fn abort(&self, path: &RemotePath, upload_id: &str) -> Result<()> {
        validate_session(path, upload_id)?;
        self.store.abort_multipart_upload(path, upload_id).await?;
        tracing::info!(key = %path, upload_id, "aborted multipart upload");
        Ok(())
    }
}

/// Check that `path` and `upload_id` can name a multipart session
///
/// Any non-empty key qualifies, including one ending in `/`.
pub fn validate_session(path: &RemotePath, upload_id: &str) -> Result<()> {
    if path.key.is_empty() {
        return Err(Error::InvalidRequest(format!(
            "Object key must be specified for {path}"
        )));
    }
    if upload_id.is_empty() {
        return Err(Error::InvalidRequest("Upload id must be specified".into()));
    }
    Ok(())
}
