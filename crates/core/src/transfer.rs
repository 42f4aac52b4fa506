//! Single-object transfers between the filesystem and the store
//!
//! Both directions stream; neither buffers a whole object in memory.
//! Failures are not cleaned up: an upload relies on the store's atomic
//! object write, a download may leave an empty or truncated file behind.

use std::path::Path;

use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};
use crate::path::RemotePath;
use crate::traits::ObjectStore;

/// Read buffer used when streaming an object body to disk
const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Outcome of one transfer unit, reported to the operator
#[derive(Debug, Clone, Serialize)]
pub struct TransferResult {
    pub source: String,
    pub target: String,
    pub bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TransferResult {
    pub fn success(source: impl Into<String>, target: impl Into<String>, bytes: u64) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            bytes,
            error: None,
        }
    }

    pub fn failure(source: impl Into<String>, target: impl Into<String>, error: &Error) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            bytes: 0,
            error: Some(error.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Upload a local file to `remote`, returning the number of bytes sent
pub async fn upload<S>(store: &S, local_path: &Path, remote: &RemotePath) -> Result<u64>
where
    S: ObjectStore + ?Sized,
{
    let file = tokio::fs::File::open(local_path)
        .await
        .map_err(|e| Error::local_io(local_path, e))?;
    let size = file
        .metadata()
        .await
        .map_err(|e| Error::local_io(local_path, e))?
        .len();
    drop(file);

    let content_type = mime_guess::from_path(local_path)
        .first()
        .map(|m| m.essence_str().to_string());

    tracing::debug!(src = %local_path.display(), dst = %remote, size, "upload");
    store.put_file(remote, local_path, size, content_type).await?;
    tracing::info!(src = %local_path.display(), dst = %remote, bytes = size, "uploaded");

    Ok(size)
}

/// Download `remote` into `local_path`, returning the number of bytes written
///
/// Missing parent directories are created and an existing file is truncated.
pub async fn download<S>(store: &S, remote: &RemotePath, local_path: &Path) -> Result<u64>
where
    S: ObjectStore + ?Sized,
{
    if let Some(parent) = local_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Error::local_io(parent, e))?;
    }

    let mut file = tokio::fs::File::create(local_path)
        .await
        .map_err(|e| Error::local_io(local_path, e))?;

    tracing::debug!(src = %remote, dst = %local_path.display(), "download");
    let mut reader = store.get_object(remote).await?;
    let bytes = copy_body(&mut reader, &mut file, remote, local_path).await?;
    tracing::info!(src = %remote, dst = %local_path.display(), bytes, "downloaded");

    Ok(bytes)
}

/// Stream an object body into a local writer
///
/// Read failures come from the store connection, write failures from the
/// local filesystem; they are reported as such.
async fn copy_body<R, W>(
    reader: &mut R,
    writer: &mut W,
    remote: &RemotePath,
    local_path: &Path,
) -> Result<u64>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut buf = vec![0u8; COPY_BUFFER_SIZE];
    let mut total = 0u64;

    loop {
        let n = reader
            .read(&mut buf)
            .await
            .map_err(|e| Error::Store(format!("Failed to read {remote}: {e}")))?;
        if n == 0 {
            break;
        }
        writer
            .write_all(&buf[..n])
            .await
            .map_err(|e| Error::local_io(local_path, e))?;
        total += n as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| Error::local_io(local_path, e))?;
    Ok(total)
}
