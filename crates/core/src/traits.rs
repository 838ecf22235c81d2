//! ObjectStore trait definition
//!
//! This trait defines the remote capabilities the browser consumes.
//! It allows the core to be decoupled from the specific S3 SDK implementation.

use std::path::Path;

use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::path::RemotePath;

/// Metadata for an object or bucket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectInfo {
    /// Object key or bucket name
    pub key: String,

    /// Size in bytes (None for buckets and prefixes)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<i64>,

    /// Last modified timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<Timestamp>,

    /// Whether this is a directory/prefix
    pub is_dir: bool,
}

impl ObjectInfo {
    /// Create a new ObjectInfo for a file
    pub fn file(key: impl Into<String>, size: i64) -> Self {
        Self {
            key: key.into(),
            size_bytes: Some(size),
            last_modified: None,
            is_dir: false,
        }
    }

    /// Create a new ObjectInfo for a directory/prefix
    pub fn dir(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            size_bytes: None,
            last_modified: None,
            is_dir: true,
        }
    }

    /// Create a new ObjectInfo for a bucket
    pub fn bucket(name: impl Into<String>) -> Self {
        Self::dir(name)
    }
}

/// Timestamps and size of a leaf, as reported by `stat`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<Timestamp>,

    /// Last modification time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<Timestamp>,

    /// Size in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// Result of a shallow (depth 1) listing
#[derive(Debug, Clone, Default)]
pub struct Listing {
    /// Sub-prefixes, as full keys ending with `/`
    pub dirs: Vec<String>,

    /// Objects directly under the listed prefix
    pub files: Vec<ObjectInfo>,
}

/// Trait for the remote storage capabilities used by the browser
///
/// This trait is implemented by the S3 adapter and can be mocked for testing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List buckets
    async fn list_buckets(&self) -> Result<Vec<ObjectInfo>>;

    /// List the direct children of a bucket or prefix, following pagination
    async fn list(&self, path: &RemotePath) -> Result<Listing>;

    /// Get object timestamps and size
    async fn stat(&self, path: &RemotePath) -> Result<Metadata>;

    /// Get up to the first `lines` lines of an object
    async fn read_head(&self, path: &RemotePath, lines: usize) -> Result<Vec<u8>>;

    /// Check if an object, prefix or bucket exists
    async fn exists(&self, path: &RemotePath) -> Result<bool>;

    /// Check if the path is a bucket or a non-empty prefix
    async fn is_container(&self, path: &RemotePath) -> Result<bool>;

    /// Download an object, or everything under a prefix when `recursive`, into `dest`
    async fn copy(&self, path: &RemotePath, dest: &Path, recursive: bool) -> Result<()>;
}
