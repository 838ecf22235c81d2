//! Path parsing and resolution
//!
//! Handles remote paths in the format `s3://bucket[/key]`. The `s3://`
//! scheme is optional on input and always present on output.

use crate::error::{Error, Result};

/// URL scheme prefix shown for every remote path
pub const SCHEME: &str = "s3://";

/// A parsed remote path pointing to an S3 location
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemotePath {
    /// Bucket name
    pub bucket: String,
    /// Object key or prefix (empty for bucket root)
    pub key: String,
    /// Whether the path ends with a slash (directory semantics)
    pub is_dir: bool,
}

impl RemotePath {
    /// Create a new RemotePath
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        let key = key.into();
        let is_dir = key.ends_with('/') || key.is_empty();
        Self {
            bucket: bucket.into(),
            key,
            is_dir,
        }
    }

    /// Path of a bucket root
    pub fn bucket(bucket: impl Into<String>) -> Self {
        Self::new(bucket, "")
    }

    /// Get the full path as a string (s3://bucket/key)
    pub fn to_full_path(&self) -> String {
        if self.key.is_empty() {
            format!("{SCHEME}{}", self.bucket)
        } else {
            format!("{SCHEME}{}/{}", self.bucket, self.key.trim_end_matches('/'))
        }
    }

    /// Key prefix used to list the contents of this path
    ///
    /// Empty for a bucket root, otherwise the key with exactly one trailing slash.
    pub fn list_prefix(&self) -> String {
        let key = self.key.trim_end_matches('/');
        if key.is_empty() {
            String::new()
        } else {
            format!("{key}/")
        }
    }

    /// Last path segment: the object or directory name, or the bucket name at the root
    pub fn name(&self) -> &str {
        let key = self.key.trim_end_matches('/');
        if key.is_empty() {
            return &self.bucket;
        }
        match key.rfind('/') {
            Some(pos) => &key[pos + 1..],
            None => key,
        }
    }

    /// Get the parent path (one level up)
    pub fn parent(&self) -> Option<Self> {
        if self.key.is_empty() {
            // At bucket level, no parent within the remote context
            None
        } else {
            let key = self.key.trim_end_matches('/');
            match key.rfind('/') {
                Some(pos) => Some(Self {
                    bucket: self.bucket.clone(),
                    key: format!("{}/", &key[..pos]),
                    is_dir: true,
                }),
                None => Some(Self::bucket(self.bucket.clone())),
            }
        }
    }

    /// Same location with directory semantics
    pub fn into_dir(mut self) -> Self {
        if !self.key.is_empty() && !self.key.ends_with('/') {
            self.key.push('/');
        }
        self.is_dir = true;
        self
    }
}

impl std::fmt::Display for RemotePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_full_path())
    }
}

/// Parse a path string into a RemotePath
///
/// Accepted forms: `s3://bucket`, `s3://bucket/key`, `bucket`, `bucket/key`.
/// A trailing slash marks a directory.
pub fn parse_path(path: &str) -> Result<RemotePath> {
    let rest = path.strip_prefix(SCHEME).unwrap_or(path);

    if rest.is_empty() {
        return Err(Error::InvalidPath("Path cannot be empty".into()));
    }

    let (bucket, key) = match rest.split_once('/') {
        Some((bucket, key)) => (bucket, key),
        None => (rest, ""),
    };

    if bucket.is_empty() {
        return Err(Error::InvalidPath(format!(
            "Bucket name cannot be empty in '{path}'. Use format: s3://bucket[/key]"
        )));
    }

    if !is_valid_bucket_name(bucket) {
        return Err(Error::InvalidPath(format!("Invalid bucket name: '{bucket}'")));
    }

    if key.contains("//") {
        return Err(Error::InvalidPath(format!(
            "Empty path segment in '{path}'"
        )));
    }

    Ok(RemotePath::new(bucket, key))
}

/// The one segment a listed key adds below the listing `prefix`
///
/// A directory prefix loses exactly one trailing slash. Returns `None` when
/// the key lies outside `prefix`, or the rest is empty or spans more than one
/// segment (as for `a//` or `/`).
pub fn child_segment<'a>(prefix: &str, key: &'a str) -> Option<&'a str> {
    let rest = key.strip_prefix(prefix)?;
    let segment = rest.strip_suffix('/').unwrap_or(rest);
    if segment.is_empty() || segment.contains('/') {
        None
    } else {
        Some(segment)
    }
}

/// Check if a string is a plausible bucket name
fn is_valid_bucket_name(name: &str) -> bool {
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
