//! Directional tree synchronization
//!
//! A sync request names one local and one remote side. Push walks the local
//! tree concurrently with uploading; pull pages through a flat listing and
//! downloads each object. Pairs are transferred one at a time.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::mapper;
use crate::path::{ParsedPath, RemotePath};
use crate::traits::{ListOptions, ObjectStore};
use crate::transfer::{self, TransferResult};
use crate::walker::{DEFAULT_QUEUE_CAPACITY, TreeWalker};

/// Keys requested per listing page during pull
const LIST_PAGE_SIZE: i32 = 1000;

/// Resolved direction of a sync request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncDirection {
    /// Local tree to remote prefix
    Push { local: PathBuf, remote: RemotePath },
    /// Remote prefix to local tree
    Pull { remote: RemotePath, local: PathBuf },
}

impl SyncDirection {
    /// Decide the direction from the two sides, rejecting remote/remote and local/local
    pub fn resolve(source: ParsedPath, target: ParsedPath) -> Result<Self> {
        match (source, target) {
            (ParsedPath::Local(local), ParsedPath::Remote(remote)) => {
                Ok(SyncDirection::Push { local, remote })
            }
            (ParsedPath::Remote(remote), ParsedPath::Local(local)) => {
                Ok(SyncDirection::Pull { remote, local })
            }
            (ParsedPath::Remote(_), ParsedPath::Remote(_)) => Err(Error::UnsupportedDirection(
                "both source and target are remote addresses".into(),
            )),
            (ParsedPath::Local(_), ParsedPath::Local(_)) => Err(Error::UnsupportedDirection(
                "neither source nor target is a remote address".into(),
            )),
        }
    }
}

/// Options for a sync run
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Keep going after a failed transfer and report the failures at the end
    pub continue_on_error: bool,
    /// Paths buffered between the walker and the upload loop
    pub queue_capacity: usize,
    /// Cancels the run and the walker
    pub cancel: CancellationToken,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            continue_on_error: false,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            cancel: CancellationToken::new(),
        }
    }
}

/// Aggregate outcome of a sync run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub transferred: usize,
    pub failed: usize,
    /// Directory markers materialised instead of downloaded
    pub skipped: usize,
    pub bytes: u64,
}

impl SyncReport {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    fn record(&mut self, result: &TransferResult) {
        if result.is_success() {
            self.transferred += 1;
            self.bytes += result.bytes;
        } else {
            self.failed += 1;
        }
    }
}

/// Drives one sync run against a store
pub struct TreeSync<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
    options: SyncOptions,
}

impl<'a, S: ObjectStore + ?Sized> TreeSync<'a, S> {
    pub fn new(store: &'a S, options: SyncOptions) -> Self {
        Self { store, options }
    }

    /// Run the sync in the resolved direction
    ///
    /// `on_item` sees every attempted transfer as it completes.
    pub async fn run<F>(&self, direction: SyncDirection, on_item: F) -> Result<SyncReport>
    where
        F: FnMut(&TransferResult),
    {
        match direction {
            SyncDirection::Push { local, remote } => self.push_tree(&local, &remote, on_item).await,
            SyncDirection::Pull { remote, local } => self.pull_tree(&remote, &local, on_item).await,
        }
    }

    /// Upload every file under `local_root` to keys under `remote_target`
    pub async fn push_tree<F>(
        &self,
        local_root: &Path,
        remote_target: &RemotePath,
        mut on_item: F,
    ) -> Result<SyncReport>
    where
        F: FnMut(&TransferResult),
    {
        tracing::debug!(src = %local_root.display(), dst = %remote_target, "push tree");

        let cancel = self.options.cancel.child_token();
        let mut walker = TreeWalker::spawn(local_root, self.options.queue_capacity, cancel.clone());
        let mut report = SyncReport::default();

        let outcome = loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => break Err(Error::Cancelled),
                next = walker.next() => next,
            };
            let Some(item) = next else {
                break Ok(());
            };
            let local_path = match item {
                Ok(path) => path,
                Err(e) => break Err(e),
            };

            let source = local_path.display().to_string();
            let result = match mapper::to_remote_key(local_root, &local_path, &remote_target.key) {
                Ok(key) => {
                    let remote = RemotePath::new(&remote_target.bucket, key);
                    let target = remote.to_string();
                    until_cancelled(&cancel, transfer::upload(self.store, &local_path, &remote))
                        .await
                        .map(|bytes| TransferResult::success(&source, &target, bytes))
                        .map_err(|e| (target, e))
                }
                Err(e) => Err((remote_target.to_string(), e)),
            };

            if let Err(e) = self.settle(result, &source, &mut report, &mut on_item) {
                break Err(e);
            }
        };

        // stop the producer before waiting on it
        cancel.cancel();
        walker.finish().await?;
        outcome.map(|()| report)
    }

    /// Download every object under `remote_source` into `local_root`
    pub async fn pull_tree<F>(
        &self,
        remote_source: &RemotePath,
        local_root: &Path,
        mut on_item: F,
    ) -> Result<SyncReport>
    where
        F: FnMut(&TransferResult),
    {
        tracing::debug!(src = %remote_source, dst = %local_root.display(), "pull tree");

        let mut report = SyncReport::default();
        let mut continuation_token: Option<String> = None;

        loop {
            let options = ListOptions {
                recursive: true,
                max_keys: Some(LIST_PAGE_SIZE),
                continuation_token: continuation_token.take(),
                ..Default::default()
            };
            let page = self.store.list_objects(remote_source, options).await?;

            for item in page.items.iter().filter(|i| !i.is_dir) {
                if self.options.cancel.is_cancelled() {
                    return Err(Error::Cancelled);
                }

                let remote = RemotePath::new(&remote_source.bucket, &item.key);
                let source = remote.to_string();

                if mapper::is_directory_marker(&item.key) {
                    let dir = mapper::to_local_path(&remote_source.key, &item.key, local_root)?;
                    tokio::fs::create_dir_all(&dir)
                        .await
                        .map_err(|e| Error::local_io(&dir, e))?;
                    tracing::debug!(key = %item.key, "directory marker");
                    report.skipped += 1;
                    continue;
                }

                let result = match mapper::to_local_path(&remote_source.key, &item.key, local_root) {
                    Ok(local_path) => {
                        let target = local_path.display().to_string();
                        until_cancelled(
                            &self.options.cancel,
                            transfer::download(self.store, &remote, &local_path),
                        )
                        .await
                        .map(|bytes| TransferResult::success(&source, &target, bytes))
                            .map_err(|e| (target, e))
                    }
                    Err(e) => Err((local_root.display().to_string(), e)),
                };

                self.settle(result, &source, &mut report, &mut on_item)?;
            }

            if !page.truncated {
                break;
            }
            continuation_token = page.continuation_token;
            if continuation_token.is_none() {
                tracing::warn!(src = %remote_source, "truncated listing without continuation token");
                break;
            }
        }

        Ok(report)
    }

    /// Report one finished unit and decide whether the run goes on
    fn settle<F>(
        &self,
        result: std::result::Result<TransferResult, (String, Error)>,
        source: &str,
        report: &mut SyncReport,
        on_item: &mut F,
    ) -> Result<()>
    where
        F: FnMut(&TransferResult),
    {
        match result {
            Ok(done) => {
                report.record(&done);
                on_item(&done);
                Ok(())
            }
            Err((_, Error::Cancelled)) => Err(Error::Cancelled),
            Err((target, e)) => {
                let failed = TransferResult::failure(source, target, &e);
                report.record(&failed);
                on_item(&failed);
                if self.options.continue_on_error {
                    tracing::warn!(src = source, error = %e, "transfer failed, continuing");
                    Ok(())
                } else {
                    Err(e)
                }
            }
        }
    }
}

/// Drive one transfer, dropping it as soon as the run is cancelled
///
/// A multipart upload dropped this way leaves its session behind for `mp abort`.
async fn until_cancelled<F>(cancel: &CancellationToken, transfer: F) -> Result<u64>
where
    F: Future<Output = Result<u64>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        result = transfer => result,
    }
}
