//! S3 client implementation
//!
//! Wraps aws-sdk-s3 and implements the ObjectStore trait from pick-core.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use tokio::io::AsyncWriteExt;

use pick_core::{
    Error, Listing, Metadata, ObjectInfo, ObjectStore, Preferences, RemotePath, Result,
};

/// Bytes fetched for a content preview
pub const HEAD_BYTES: u64 = 8 * 1024;

/// Connection settings, all optional on top of the default AWS chain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientOptions {
    /// Shared-config profile
    pub profile: Option<String>,
    pub region: Option<String>,
    /// Custom endpoint for S3-compatible services; enables path-style addressing
    pub endpoint: Option<String>,
}

impl From<&Preferences> for ClientOptions {
    fn from(prefs: &Preferences) -> Self {
        Self {
            profile: prefs.default_profile.clone(),
            region: prefs.region.clone(),
            endpoint: prefs.endpoint.clone(),
        }
    }
}

/// S3 client wrapper
pub struct S3Client {
    inner: aws_sdk_s3::Client,
}

impl S3Client {
    /// Create a new S3 client from the default credential chain and `options`
    pub async fn new(options: &ClientOptions) -> Result<Self> {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(profile) = &options.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(region) = &options.region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }
        if let Some(endpoint) = &options.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let config = loader.load().await;

        // Path-style addressing for S3-compatible endpoints
        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .force_path_style(options.endpoint.is_some())
            .build();

        Ok(Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
        })
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        match self.inner.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(e) => match classify(e, bucket) {
                Error::NotFound(_) => Ok(false),
                other => Err(other),
            },
        }
    }

    /// Every key under a prefix, following pagination
    async fn list_all(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let mut request = self.inner.list_objects_v2().bucket(bucket).prefix(prefix);
            if let Some(t) = &token {
                request = request.continuation_token(t);
            }
            let response = request.send().await.map_err(|e| classify(e, bucket))?;
            keys.extend(
                response
                    .contents()
                    .iter()
                    .filter_map(|o| o.key().map(str::to_string)),
            );
            match response.next_continuation_token() {
                Some(next) if response.is_truncated().unwrap_or(false) => {
                    token = Some(next.to_string());
                }
                _ => return Ok(keys),
            }
        }
    }

    async fn download_object(&self, bucket: &str, key: &str, target: &Path) -> Result<()> {
        let path = RemotePath::new(bucket, key);
        let response = self
            .inner
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| classify(e, &path.to_full_path()))?;

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::File::create(target).await?;
        let mut body = response.body;
        while let Some(chunk) = body
            .try_next()
            .await
            .map_err(|e| Error::Network(e.to_string()))?
        {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        tracing::debug!(%path, target = %target.display(), "downloaded");
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn list_buckets(&self) -> Result<Vec<ObjectInfo>> {
        let response = self
            .inner
            .list_buckets()
            .send()
            .await
            .map_err(|e| classify(e, "bucket list"))?;

        let buckets = response
            .buckets()
            .iter()
            .filter_map(|b| {
                let mut info = ObjectInfo::bucket(b.name()?);
                info.last_modified = b.creation_date().and_then(timestamp);
                Some(info)
            })
            .collect();

        Ok(buckets)
    }

    async fn list(&self, path: &RemotePath) -> Result<Listing> {
        let prefix = path.list_prefix();
        let mut listing = Listing::default();
        let mut token: Option<String> = None;

        loop {
            let mut request = self
                .inner
                .list_objects_v2()
                .bucket(&path.bucket)
                .delimiter("/");
            if !prefix.is_empty() {
                request = request.prefix(&prefix);
            }
            if let Some(t) = &token {
                request = request.continuation_token(t);
            }

            let response = request
                .send()
                .await
                .map_err(|e| classify(e, &path.to_full_path()))?;

            listing.dirs.extend(
                response
                    .common_prefixes()
                    .iter()
                    .filter_map(|p| p.prefix().map(str::to_string)),
            );
            for object in response.contents() {
                let Some(key) = object.key() else {
                    continue;
                };
                let mut info = ObjectInfo::file(key, object.size().unwrap_or(0));
                info.last_modified = object.last_modified().and_then(timestamp);
                listing.files.push(info);
            }

            match response.next_continuation_token() {
                Some(next) if response.is_truncated().unwrap_or(false) => {
                    token = Some(next.to_string());
                }
                _ => break,
            }
        }

        tracing::debug!(
            %path,
            dirs = listing.dirs.len(),
            files = listing.files.len(),
            "listed"
        );
        Ok(listing)
    }

    async fn stat(&self, path: &RemotePath) -> Result<Metadata> {
        let response = self
            .inner
            .head_object()
            .bucket(&path.bucket)
            .key(&path.key)
            .send()
            .await
            .map_err(|e| classify(e, &path.to_full_path()))?;

        // S3 keeps no creation time separate from the last write
        let modified = response.last_modified().and_then(timestamp);
        Ok(Metadata {
            created: modified,
            updated: modified,
            size: response
                .content_length()
                .and_then(|len| u64::try_from(len).ok()),
        })
    }

    async fn read_head(&self, path: &RemotePath, lines: usize) -> Result<Vec<u8>> {
        if lines == 0 {
            return Ok(Vec::new());
        }
        let result = self
            .inner
            .get_object()
            .bucket(&path.bucket)
            .key(&path.key)
            .range(format!("bytes=0-{}", HEAD_BYTES - 1))
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            // ranged read of an empty object
            Err(e) if e.code() == Some("InvalidRange") => return Ok(Vec::new()),
            Err(e) => return Err(classify(e, &path.to_full_path())),
        };

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| Error::Network(e.to_string()))?
            .into_bytes()
            .to_vec();

        Ok(head_lines(data, lines))
    }

    async fn exists(&self, path: &RemotePath) -> Result<bool> {
        if path.key.is_empty() || path.is_dir {
            return self.is_container(path).await;
        }
        match self
            .inner
            .head_object()
            .bucket(&path.bucket)
            .key(&path.key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => match classify(e, &path.to_full_path()) {
                // `bucket/logs` may name a prefix
                Error::NotFound(_) => self.is_container(path).await,
                other => Err(other),
            },
        }
    }

    async fn is_container(&self, path: &RemotePath) -> Result<bool> {
        if path.key.is_empty() {
            return self.bucket_exists(&path.bucket).await;
        }
        let response = self
            .inner
            .list_objects_v2()
            .bucket(&path.bucket)
            .prefix(path.list_prefix())
            .max_keys(1)
            .send()
            .await
            .map_err(|e| classify(e, &path.to_full_path()))?;
        Ok(!response.contents().is_empty() || !response.common_prefixes().is_empty())
    }

    async fn copy(&self, path: &RemotePath, dest: &Path, recursive: bool) -> Result<()> {
        if !recursive {
            return self
                .download_object(&path.bucket, &path.key, &dest.join(path.name()))
                .await;
        }

        let prefix = path.list_prefix();
        let root = dest.join(path.name());
        let keys = self.list_all(&path.bucket, &prefix).await?;
        tracing::debug!(%path, objects = keys.len(), "downloading recursively");

        for key in keys {
            let relative = key.strip_prefix(&prefix).unwrap_or(&key);
            if relative.is_empty() || relative.ends_with('/') {
                continue;
            }
            let Some(target) = relative_target(&root, relative) else {
                tracing::warn!(key, "skipping key that escapes the download directory");
                continue;
            };
            self.download_object(&path.bucket, &key, &target).await?;
        }
        Ok(())
    }
}

fn classify<E>(err: SdkError<E, HttpResponse>, what: &str) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let status = err.raw_response().map(|r| r.status().as_u16());
    let code = err.code().map(str::to_string);
    classify_code(code.as_deref(), status, what, DisplayErrorContext(&err).to_string())
}

/// Map an S3 error code or HTTP status to the core error kinds
fn classify_code(code: Option<&str>, status: Option<u16>, what: &str, message: String) -> Error {
    match (code, status) {
        (Some("NoSuchKey" | "NoSuchBucket" | "NotFound"), _) | (_, Some(404)) => {
            Error::NotFound(what.to_string())
        }
        (
            Some(
                "AccessDenied" | "Forbidden" | "InvalidAccessKeyId" | "SignatureDoesNotMatch"
                | "ExpiredToken",
            ),
            _,
        )
        | (_, Some(401 | 403)) => Error::Auth(message),
        _ => Error::Network(message),
    }
}

fn timestamp(dt: &aws_smithy_types::DateTime) -> Option<jiff::Timestamp> {
    let nanos = i32::try_from(dt.subsec_nanos()).ok()?;
    jiff::Timestamp::new(dt.secs(), nanos).ok()
}

/// First `lines` lines of `data`, without the final line break
fn head_lines(mut data: Vec<u8>, lines: usize) -> Vec<u8> {
    if let Some(pos) = data
        .iter()
        .enumerate()
        .filter(|(_, b)| **b == b'\n')
        .map(|(i, _)| i)
        .nth(lines.saturating_sub(1))
    {
        data.truncate(pos);
    }
    data
}

/// Local path of a downloaded key, `None` if it would leave `root`
fn relative_target(root: &Path, relative: &str) -> Option<PathBuf> {
    let relative = Path::new(relative);
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return None;
    }
    Some(root.join(relative))
}
