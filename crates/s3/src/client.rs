//! S3 client implementation
//!
//! Wraps aws-sdk-s3 and implements the ObjectStore trait from s3t-core.

use std::path::Path;

use async_trait::async_trait;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::{ByteStream, DateTime};
use aws_sdk_s3::types::ObjectCannedAcl;

use s3t_core::{
    CannedAcl, Error, Grant, ListOptions, ListResult, MultipartUpload, ObjectInfo, ObjectReader,
    ObjectStore, PartInfo, RemotePath, Result, StoreSettings,
};

use crate::multipart::{self, MultipartConfig};

/// S3 client wrapper
pub struct S3Client {
    inner: aws_sdk_s3::Client,
    multipart: MultipartConfig,
}

impl S3Client {
    /// Create a new S3 client
    ///
    /// Credentials and, unless overridden, the region come from the
    /// standard AWS provider chain.
    pub async fn new(settings: &StoreSettings, multipart: MultipartConfig) -> Result<Self> {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = &settings.region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }
        if let Some(endpoint) = &settings.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let config = loader.load().await;

        // Custom endpoints are usually S3-compatible servers without virtual hosts
        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .force_path_style(settings.path_style())
            .build();

        tracing::debug!(
            endpoint = settings.endpoint.as_deref().unwrap_or("default"),
            region = ?config.region(),
            "S3 client configured"
        );

        Ok(Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
            multipart,
        })
    }
}

/// Map an error code or HTTP status reported by the store to an error kind
pub(crate) fn classify_code(code: Option<&str>, status: Option<u16>, message: String) -> Error {
    match code {
        Some("NoSuchKey" | "NotFound" | "NoSuchBucket" | "NoSuchUpload") => Error::NotFound(message),
        Some(
            "AccessDenied" | "InvalidAccessKeyId" | "SignatureDoesNotMatch" | "ExpiredToken"
            | "InvalidToken",
        ) => Error::Auth(message),
        _ => match status {
            Some(404) => Error::NotFound(message),
            Some(401 | 403) => Error::Auth(message),
            _ => Error::Store(message),
        },
    }
}

/// Convert an SDK failure on `context` into a store error
pub(crate) fn store_error<E>(err: SdkError<E, HttpResponse>, context: &str) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let status = err.raw_response().map(|r| r.status().as_u16());
    let code = err.code().map(str::to_string);
    let message = format!("{context}: {}", DisplayErrorContext(&err));
    classify_code(code.as_deref(), status, message)
}

fn timestamp(value: Option<&DateTime>) -> Option<jiff::Timestamp> {
    value.and_then(|dt| jiff::Timestamp::from_second(dt.secs()).ok())
}

fn trim_etag(etag: Option<&str>) -> Option<String> {
    etag.map(|e| e.trim_matches('"').to_string())
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn list_buckets(&self) -> Result<Vec<ObjectInfo>> {
        let response = self
            .inner
            .list_buckets()
            .send()
            .await
            .map_err(|e| store_error(e, "list buckets"))?;

        let buckets = response
            .buckets()
            .iter()
            .map(|b| {
                let mut info = ObjectInfo::bucket(b.name().unwrap_or_default());
                info.last_modified = timestamp(b.creation_date());
                info
            })
            .collect();

        Ok(buckets)
    }

    async fn list_objects(&self, path: &RemotePath, options: ListOptions) -> Result<ListResult> {
        let mut request = self.inner.list_objects_v2().bucket(&path.bucket);

        if !path.key.is_empty() {
            request = request.prefix(&path.key);
        }

        // Set delimiter (for non-recursive listing)
        if !options.recursive {
            request = request.delimiter(options.delimiter.as_deref().unwrap_or("/"));
        }

        if let Some(max) = options.max_keys {
            request = request.max_keys(max);
        }

        if let Some(token) = &options.continuation_token {
            request = request.continuation_token(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| store_error(e, &path.to_string()))?;

        let mut items = Vec::new();

        // Common prefixes (directories)
        for prefix in response.common_prefixes() {
            if let Some(p) = prefix.prefix() {
                items.push(ObjectInfo::dir(p));
            }
        }

        for object in response.contents() {
            let key = object.key().unwrap_or_default();
            let mut info = ObjectInfo::file(key, object.size().unwrap_or(0));
            info.last_modified = timestamp(object.last_modified());
            info.etag = trim_etag(object.e_tag());
            info.storage_class = object.storage_class().map(|sc| sc.as_str().to_string());
            items.push(info);
        }

        Ok(ListResult {
            items,
            truncated: response.is_truncated().unwrap_or(false),
            continuation_token: response.next_continuation_token().map(|s| s.to_string()),
        })
    }

    async fn head_object(&self, path: &RemotePath) -> Result<ObjectInfo> {
        let response = self
            .inner
            .head_object()
            .bucket(&path.bucket)
            .key(&path.key)
            .send()
            .await
            .map_err(|e| store_error(e, &path.to_string()))?;

        let mut info = ObjectInfo::file(&path.key, response.content_length().unwrap_or(0));
        info.last_modified = timestamp(response.last_modified());
        info.etag = trim_etag(response.e_tag());
        info.content_type = response.content_type().map(str::to_string);
        info.storage_class = response.storage_class().map(|sc| sc.as_str().to_string());

        Ok(info)
    }

    async fn get_object(&self, path: &RemotePath) -> Result<ObjectReader> {
        let response = self
            .inner
            .get_object()
            .bucket(&path.bucket)
            .key(&path.key)
            .send()
            .await
            .map_err(|e| store_error(e, &path.to_string()))?;

        Ok(Box::pin(response.body.into_async_read()))
    }

    async fn put_file(
        &self,
        path: &RemotePath,
        source: &Path,
        size: u64,
        content_type: Option<String>,
    ) -> Result<ObjectInfo> {
        let etag = if self.multipart.requires_multipart(size) {
            multipart::upload_file(&self.inner, path, source, size, content_type, &self.multipart)
                .await?
        } else {
            let body = ByteStream::from_path(source)
                .await
                .map_err(|e| Error::General(format!("Failed to read {}: {e}", source.display())))?;

            let response = self
                .inner
                .put_object()
                .bucket(&path.bucket)
                .key(&path.key)
                .set_content_type(content_type)
                .body(body)
                .send()
                .await
                .map_err(|e| store_error(e, &path.to_string()))?;
            trim_etag(response.e_tag())
        };

        let mut info = ObjectInfo::file(&path.key, size as i64);
        info.etag = etag;
        info.last_modified = Some(jiff::Timestamp::now());

        Ok(info)
    }

    async fn delete_object(&self, path: &RemotePath) -> Result<()> {
        self.inner
            .delete_object()
            .bucket(&path.bucket)
            .key(&path.key)
            .send()
            .await
            .map_err(|e| store_error(e, &path.to_string()))?;

        Ok(())
    }

    async fn copy_object(&self, src: &RemotePath, dst: &RemotePath) -> Result<ObjectInfo> {
        let copy_source = format!("{}/{}", src.bucket, src.key);

        let response = self
            .inner
            .copy_object()
            .copy_source(&copy_source)
            .bucket(&dst.bucket)
            .key(&dst.key)
            .send()
            .await
            .map_err(|e| store_error(e, &src.to_string()))?;

        // Copy does not report the size
        let mut info = self.head_object(dst).await?;
        if let Some(etag) = response.copy_object_result().and_then(|r| r.e_tag()) {
            info.etag = Some(etag.trim_matches('"').to_string());
        }

        Ok(info)
    }

    async fn get_object_acl(&self, path: &RemotePath) -> Result<Vec<Grant>> {
        let response = self
            .inner
            .get_object_acl()
            .bucket(&path.bucket)
            .key(&path.key)
            .send()
            .await
            .map_err(|e| store_error(e, &path.to_string()))?;

        let grants = response
            .grants()
            .iter()
            .map(|g| {
                let grantee = g
                    .grantee()
                    .and_then(|who| who.id().or(who.uri()).or(who.display_name()))
                    .unwrap_or_default();
                Grant {
                    grantee: grantee.to_string(),
                    permission: g
                        .permission()
                        .map(|p| p.as_str().to_string())
                        .unwrap_or_default(),
                }
            })
            .collect();

        Ok(grants)
    }

    async fn put_object_acl(&self, path: &RemotePath, acl: CannedAcl) -> Result<()> {
        let canned = match acl {
            CannedAcl::Private => ObjectCannedAcl::Private,
            CannedAcl::PublicRead => ObjectCannedAcl::PublicRead,
        };

        self.inner
            .put_object_acl()
            .bucket(&path.bucket)
            .key(&path.key)
            .acl(canned)
            .send()
            .await
            .map_err(|e| store_error(e, &path.to_string()))?;

        Ok(())
    }

    async fn list_multipart_uploads(&self, bucket: &str) -> Result<Vec<MultipartUpload>> {
        let mut uploads = Vec::new();
        let mut key_marker: Option<String> = None;
        let mut upload_id_marker: Option<String> = None;

        loop {
            let response = self
                .inner
                .list_multipart_uploads()
                .bucket(bucket)
                .set_key_marker(key_marker.take())
                .set_upload_id_marker(upload_id_marker.take())
                .send()
                .await
                .map_err(|e| store_error(e, bucket))?;

            uploads.extend(response.uploads().iter().map(|u| MultipartUpload {
                key: u.key().unwrap_or_default().to_string(),
                upload_id: u.upload_id().unwrap_or_default().to_string(),
                initiated: timestamp(u.initiated()),
            }));

            if !response.is_truncated().unwrap_or(false) {
                break;
            }
            key_marker = response.next_key_marker().map(str::to_string);
            upload_id_marker = response.next_upload_id_marker().map(str::to_string);
            if key_marker.is_none() && upload_id_marker.is_none() {
                break;
            }
        }

        Ok(uploads)
    }

    async fn list_parts(&self, path: &RemotePath, upload_id: &str) -> Result<Vec<PartInfo>> {
        let mut parts = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let response = self
                .inner
                .list_parts()
                .bucket(&path.bucket)
                .key(&path.key)
                .upload_id(upload_id)
                .set_part_number_marker(marker.take())
                .send()
                .await
                .map_err(|e| store_error(e, &format!("upload {upload_id} for {path}")))?;

            parts.extend(response.parts().iter().map(|p| PartInfo {
                part_number: p.part_number().unwrap_or_default(),
                etag: trim_etag(p.e_tag()).unwrap_or_default(),
                size: p.size().unwrap_or_default(),
                last_modified: timestamp(p.last_modified()),
            }));

            marker = response.next_part_number_marker().map(str::to_string);
            if !response.is_truncated().unwrap_or(false) || marker.is_none() {
                break;
            }
        }

        Ok(parts)
    }

    async fn abort_multipart_upload(&self, path: &RemotePath, upload_id: &str) -> Result<()> {
        self.inner
            .abort_multipart_upload()
            .bucket(&path.bucket)
            .key(&path.key)
            .upload_id(upload_id)
            .send()
            .await
            .map_err(|e| store_error(e, &format!("upload {upload_id} for {path}")))?;

        Ok(())
    }
}
