//! In-memory ObjectStore used by the unit tests

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::Cursor;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::path::RemotePath;
use crate::traits::{
    CannedAcl, Grant, ListOptions, ListResult, MultipartUpload, ObjectInfo, ObjectReader,
    ObjectStore, PartInfo,
};

#[derive(Default)]
pub(crate) struct MemoryStore {
    objects: Mutex<BTreeMap<(String, String), Vec<u8>>>,
    uploads: Mutex<HashMap<String, Vec<(MultipartUpload, Vec<PartInfo>)>>>,
    failing_keys: Mutex<HashSet<String>>,
    stalled_keys: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
    page_size: Option<usize>,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Paginate listings with this many keys per page
    pub(crate) fn with_page_size(page_size: usize) -> Self {
        Self {
            page_size: Some(page_size),
            ..Self::default()
        }
    }

    pub(crate) fn insert(&self, bucket: &str, key: &str, data: &[u8]) {
        self.objects
            .lock()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()), data.to_vec());
    }

    pub(crate) fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub(crate) fn keys(&self, bucket: &str) -> Vec<String> {
        self.objects
            .lock()
            .unwrap()
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect()
    }

    /// Make every put/get of `key` fail with a store error
    pub(crate) fn fail_on(&self, key: &str) {
        self.failing_keys.lock().unwrap().insert(key.to_string());
    }

    /// Make every put/get of `key` hang until the caller gives up
    pub(crate) fn stall_on(&self, key: &str) {
        self.stalled_keys.lock().unwrap().insert(key.to_string());
    }

    pub(crate) fn add_upload(&self, bucket: &str, upload: MultipartUpload, parts: Vec<PartInfo>) {
        self.uploads
            .lock()
            .unwrap()
            .entry(bucket.to_string())
            .or_default()
            .push((upload, parts));
    }

    /// Names of the calls made so far, in order
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }

    async fn check_stalled(&self, path: &RemotePath) {
        let stalled = self.stalled_keys.lock().unwrap().contains(&path.key);
        if stalled {
            std::future::pending::<()>().await;
        }
    }

    fn check_failing(&self, path: &RemotePath) -> Result<()> {
        if self.failing_keys.lock().unwrap().contains(&path.key) {
            return Err(Error::Store(format!("injected failure for {path}")));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_buckets(&self) -> Result<Vec<ObjectInfo>> {
        self.record("list_buckets");
        let objects = self.objects.lock().unwrap();
        let buckets: std::collections::BTreeSet<&String> = objects.keys().map(|(b, _)| b).collect();
        Ok(buckets.into_iter().map(ObjectInfo::bucket).collect())
    }

    async fn list_objects(&self, path: &RemotePath, options: ListOptions) -> Result<ListResult> {
        self.record("list_objects");
        let objects = self.objects.lock().unwrap();
        let start = options
            .continuation_token
            .as_deref()
            .and_then(|t| t.parse::<usize>().ok())
            .unwrap_or(0);

        let matching: Vec<ObjectInfo> = objects
            .iter()
            .filter(|((b, k), _)| b == &path.bucket && k.starts_with(&path.key))
            .map(|((_, k), data)| ObjectInfo::file(k, data.len() as i64))
            .collect();

        let end = self
            .page_size
            .map_or(matching.len(), |size| (start + size).min(matching.len()));
        let truncated = end < matching.len();

        Ok(ListResult {
            items: matching[start.min(end)..end].to_vec(),
            truncated,
            continuation_token: truncated.then(|| end.to_string()),
        })
    }

    async fn head_object(&self, path: &RemotePath) -> Result<ObjectInfo> {
        self.record("head_object");
        self.object(&path.bucket, &path.key)
            .map(|data| ObjectInfo::file(&path.key, data.len() as i64))
            .ok_or_else(|| Error::NotFound(path.to_string()))
    }

    async fn get_object(&self, path: &RemotePath) -> Result<ObjectReader> {
        self.record("get_object");
        self.check_stalled(path).await;
        self.check_failing(path)?;
        let data = self
            .object(&path.bucket, &path.key)
            .ok_or_else(|| Error::NotFound(path.to_string()))?;
        Ok(Box::pin(Cursor::new(data)))
    }

    async fn put_file(
        &self,
        path: &RemotePath,
        source: &Path,
        size: u64,
        _content_type: Option<String>,
    ) -> Result<ObjectInfo> {
        self.record("put_file");
        self.check_stalled(path).await;
        self.check_failing(path)?;
        let data = tokio::fs::read(source)
            .await
            .map_err(|e| Error::local_io(source, e))?;
        assert_eq!(data.len() as u64, size, "size passed to put_file");
        self.insert(&path.bucket, &path.key, &data);
        Ok(ObjectInfo::file(&path.key, size as i64))
    }

    async fn delete_object(&self, path: &RemotePath) -> Result<()> {
        self.record("delete_object");
        self.objects
            .lock()
            .unwrap()
            .remove(&(path.bucket.clone(), path.key.clone()))
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(path.to_string()))
    }

    async fn copy_object(&self, src: &RemotePath, dst: &RemotePath) -> Result<ObjectInfo> {
        self.record("copy_object");
        let data = self
            .object(&src.bucket, &src.key)
            .ok_or_else(|| Error::NotFound(src.to_string()))?;
        self.insert(&dst.bucket, &dst.key, &data);
        Ok(ObjectInfo::file(&dst.key, data.len() as i64))
    }

    async fn get_object_acl(&self, path: &RemotePath) -> Result<Vec<Grant>> {
        self.record("get_object_acl");
        self.head_object(path).await?;
        Ok(vec![Grant {
            grantee: "owner".into(),
            permission: "FULL_CONTROL".into(),
        }])
    }

    async fn put_object_acl(&self, path: &RemotePath, _acl: CannedAcl) -> Result<()> {
        self.record("put_object_acl");
        self.head_object(path).await.map(|_| ())
    }

    async fn list_multipart_uploads(&self, bucket: &str) -> Result<Vec<MultipartUpload>> {
        self.record("list_multipart_uploads");
        Ok(self
            .uploads
            .lock()
            .unwrap()
            .get(bucket)
            .map(|sessions| sessions.iter().map(|(u, _)| u.clone()).collect())
            .unwrap_or_default())
    }

    async fn list_parts(&self, path: &RemotePath, upload_id: &str) -> Result<Vec<PartInfo>> {
        self.record("list_parts");
        self.uploads
            .lock()
            .unwrap()
            .get(&path.bucket)
            .and_then(|sessions| {
                sessions
                    .iter()
                    .find(|(u, _)| u.key == path.key && u.upload_id == upload_id)
            })
            .map(|(_, parts)| parts.clone())
            .ok_or_else(|| Error::NotFound(format!("upload {upload_id} for {path}")))
    }

    async fn abort_multipart_upload(&self, path: &RemotePath, upload_id: &str) -> Result<()> {
        self.record("abort_multipart_upload");
        let mut uploads = self.uploads.lock().unwrap();
        let sessions = uploads.entry(path.bucket.clone()).or_default();
        let before = sessions.len();
        sessions.retain(|(u, _)| !(u.key == path.key && u.upload_id == upload_id));
        if sessions.len() == before {
            return Err(Error::NotFound(format!("upload {upload_id} for {path}")));
        }
        Ok(())
    }
}
