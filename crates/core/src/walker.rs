//! Local tree traversal
//!
//! [`files`] is the lazy sequence of regular files under a root.
//! [`TreeWalker`] runs that sequence on a blocking task and hands the paths
//! to an async consumer through a bounded queue, so transfers can start
//! before the whole tree has been enumerated.

use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Default number of discovered paths buffered ahead of the consumer
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Lazily enumerate every file under `root`, skipping directories
///
/// Symlinks are followed. The first traversal error (permission denied,
/// broken link, loop) is yielded and ends the sequence.
pub fn files(root: impl AsRef<Path>) -> impl Iterator<Item = Result<PathBuf>> {
    let mut entries = WalkDir::new(root.as_ref()).follow_links(true).into_iter();
    let mut failed = false;

    std::iter::from_fn(move || {
        if failed {
            return None;
        }
        loop {
            match entries.next()? {
                Ok(entry) if entry.file_type().is_dir() => continue,
                Ok(entry) => return Some(Ok(entry.into_path())),
                Err(err) => {
                    failed = true;
                    return Some(Err(walk_error(err)));
                }
            }
        }
    })
}

fn walk_error(err: walkdir::Error) -> Error {
    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
    match err.into_io_error() {
        Some(source) => Error::local_io(path, source),
        None => Error::General(format!("Filesystem loop detected at {}", path.display())),
    }
}

/// Background producer of file paths
///
/// The queue closing means the walk completed; a walk failure arrives as a
/// single `Err` item before the close.
#[derive(Debug)]
pub struct TreeWalker {
    receiver: mpsc::Receiver<Result<PathBuf>>,
    handle: JoinHandle<usize>,
}

impl TreeWalker {
    /// Start walking `root` on a blocking task
    ///
    /// The producer stops early when `cancel` fires or the walker is dropped.
    pub fn spawn(root: impl Into<PathBuf>, capacity: usize, cancel: CancellationToken) -> Self {
        let root = root.into();
        let (sender, receiver) = mpsc::channel(capacity.max(1));

        let handle = tokio::task::spawn_blocking(move || {
            let mut sent = 0;
            for item in files(&root) {
                if cancel.is_cancelled() {
                    tracing::debug!(root = %root.display(), "walk cancelled");
                    break;
                }
                let is_err = item.is_err();
                if sender.blocking_send(item).is_err() {
                    // consumer went away
                    break;
                }
                if is_err {
                    break;
                }
                sent += 1;
            }
            tracing::debug!(root = %root.display(), files = sent, "walk finished");
            sent
        });

        Self { receiver, handle }
    }

    /// Next discovered path, or `None` once the walk has ended
    pub async fn next(&mut self) -> Option<Result<PathBuf>> {
        self.receiver.recv().await
    }

    /// Close the queue and wait for the producer, returning how many files it sent
    pub async fn finish(mut self) -> Result<usize> {
        self.receiver.close();
        self.handle
            .await
            .map_err(|e| Error::General(format!("Walker task failed: {e}")))
    }
}
