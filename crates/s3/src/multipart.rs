//! Multipart upload support
//!
//! Files above the part-size threshold are uploaded in byte ranges read
//! directly from disk, several parts at a time.

use std::path::Path;

use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use aws_smithy_types::byte_stream::Length;
use futures::{StreamExt, TryStreamExt, stream};

use s3t_core::{Error, RemotePath, Result, TransferSettings};

use crate::client::store_error;

/// Default part size: 64 MiB
pub const DEFAULT_PART_SIZE: u64 = 64 * 1024 * 1024;

/// Minimum part size: 5 MiB (S3 requirement)
pub const MIN_PART_SIZE: u64 = 5 * 1024 * 1024;

/// Maximum part size: 5 GiB
pub const MAX_PART_SIZE: u64 = 5 * 1024 * 1024 * 1024;

/// Maximum number of parts: 10,000 (S3 limit)
pub const MAX_PARTS: usize = 10_000;

/// Multipart upload configuration
#[derive(Debug, Clone)]
pub struct MultipartConfig {
    /// Part size in bytes; files larger than this use multipart
    pub part_size: u64,

    /// Number of concurrent part uploads per object
    pub concurrency: usize,
}

impl Default for MultipartConfig {
    fn default() -> Self {
        Self {
            part_size: DEFAULT_PART_SIZE,
            concurrency: 4,
        }
    }
}

impl MultipartConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_settings(settings: &TransferSettings) -> Self {
        Self::new()
            .part_size(settings.part_size)
            .concurrency(settings.part_concurrency)
    }

    pub fn part_size(mut self, size: u64) -> Self {
        self.part_size = size.clamp(MIN_PART_SIZE, MAX_PART_SIZE);
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    /// Whether a file of `file_size` bytes is sent as a multipart upload
    pub fn requires_multipart(&self, file_size: u64) -> bool {
        file_size > self.part_size
    }

    /// Calculate appropriate part size for a file
    pub fn calculate_part_size(&self, file_size: u64) -> u64 {
        if file_size <= MIN_PART_SIZE {
            return MIN_PART_SIZE;
        }

        let parts = file_size.div_ceil(self.part_size);

        if parts <= MAX_PARTS as u64 {
            self.part_size
        } else {
            // Need larger parts to fit within 10,000 limit
            let required_size = file_size.div_ceil(MAX_PARTS as u64);
            required_size.clamp(MIN_PART_SIZE, MAX_PART_SIZE)
        }
    }
}

/// Calculate number of parts for a file
pub fn calculate_parts(file_size: u64, part_size: u64) -> usize {
    file_size.div_ceil(part_size) as usize
}

/// Get byte range for a part
pub fn part_byte_range(part_number: i32, part_size: u64, total_size: u64) -> (u64, u64) {
    let start = (part_number as u64 - 1) * part_size;
    let end = (start + part_size).min(total_size);
    (start, end)
}

/// One part of a file to upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartRange {
    pub part_number: i32,
    pub offset: u64,
    pub length: u64,
}

/// Split a file of `total_size` bytes into contiguous parts
pub fn plan_parts(total_size: u64, part_size: u64) -> Vec<PartRange> {
    (1..=calculate_parts(total_size, part_size) as i32)
        .map(|part_number| {
            let (start, end) = part_byte_range(part_number, part_size, total_size);
            PartRange {
                part_number,
                offset: start,
                length: end - start,
            }
        })
        .collect()
}

/// Upload `source` as a multipart upload, returning the final ETag
///
/// If a part fails the session is left in place so it shows up in the
/// multipart listing and can be aborted.
pub(crate) async fn upload_file(
    client: &aws_sdk_s3::Client,
    path: &RemotePath,
    source: &Path,
    size: u64,
    content_type: Option<String>,
    config: &MultipartConfig,
) -> Result<Option<String>> {
    let created = client
        .create_multipart_upload()
        .bucket(&path.bucket)
        .key(&path.key)
        .set_content_type(content_type)
        .send()
        .await
        .map_err(|e| store_error(e, &path.to_string()))?;
    let upload_id = created
        .upload_id()
        .ok_or_else(|| Error::Store(format!("No upload id returned for {path}")))?
        .to_string();

    let parts = plan_parts(size, config.calculate_part_size(size));
    tracing::debug!(key = %path, upload_id, parts = parts.len(), "multipart upload started");

    let uploaded: Result<Vec<CompletedPart>> = stream::iter(parts)
        .map(|part| upload_part(client, path, source, &upload_id, part))
        .buffer_unordered(config.concurrency)
        .try_collect()
        .await;

    let mut completed = match uploaded {
        Ok(completed) => completed,
        Err(e) => {
            tracing::warn!(key = %path, upload_id, "multipart upload left incomplete: {e}");
            return Err(e);
        }
    };
    completed.sort_by_key(|p| p.part_number());

    let response = client
        .complete_multipart_upload()
        .bucket(&path.bucket)
        .key(&path.key)
        .upload_id(&upload_id)
        .multipart_upload(
            CompletedMultipartUpload::builder()
                .set_parts(Some(completed))
                .build(),
        )
        .send()
        .await
        .map_err(|e| store_error(e, &path.to_string()))?;

    Ok(response.e_tag().map(|etag| etag.trim_matches('"').to_string()))
}

async fn upload_part(
    client: &aws_sdk_s3::Client,
    path: &RemotePath,
    source: &Path,
    upload_id: &str,
    part: PartRange,
) -> Result<CompletedPart> {
    let body = ByteStream::read_from()
        .path(source)
        .offset(part.offset)
        .length(Length::Exact(part.length))
        .build()
        .await
        .map_err(|e| Error::General(format!("Failed to read {}: {e}", source.display())))?;

    let response = client
        .upload_part()
        .bucket(&path.bucket)
        .key(&path.key)
        .upload_id(upload_id)
        .part_number(part.part_number)
        .body(body)
        .send()
        .await
        .map_err(|e| store_error(e, &format!("{path} part {}", part.part_number)))?;

    tracing::trace!(key = %path, part = part.part_number, "part uploaded");
    Ok(CompletedPart::builder()
        .part_number(part.part_number)
        .set_e_tag(response.e_tag().map(str::to_string))
        .build())
}
