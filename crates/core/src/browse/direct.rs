//! Browsing remote paths without a tree

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use super::Browser;
use crate::error::Result;
use crate::path::{child_segment, RemotePath};
use crate::preview;
use crate::traits::ObjectStore;

/// [`Browser`] over raw remote paths; every visit lists the store again
pub struct DirectBrowser {
    store: Arc<dyn ObjectStore>,
    preview_lines: usize,
}

impl DirectBrowser {
    pub fn new(store: Arc<dyn ObjectStore>, preview_lines: usize) -> Self {
        Self {
            store,
            preview_lines,
        }
    }

    async fn list(&self, path: &RemotePath) -> Result<Vec<RemotePath>> {
        let listing = self.store.list(path).await?;
        let prefix = path.list_prefix();
        let named = |key: &String| child_segment(&prefix, key).is_some();
        let dirs = listing
            .dirs
            .into_iter()
            .filter(named)
            .map(|dir| RemotePath::new(&path.bucket, dir).into_dir());
        let files = listing
            .files
            .into_iter()
            .filter(|file| !file.key.ends_with('/') && named(&file.key))
            .map(|file| RemotePath::new(&path.bucket, file.key));
        Ok(dirs.chain(files).collect())
    }
}

#[async_trait]
impl Browser for DirectBrowser {
    type Node = RemotePath;

    fn label(&self, node: &RemotePath) -> String {
        node.name().to_string()
    }

    fn path(&self, node: &RemotePath) -> String {
        node.to_full_path()
    }

    fn is_container(&self, node: &RemotePath) -> bool {
        node.is_dir
    }

    fn parent(&self, node: &RemotePath) -> Option<RemotePath> {
        node.parent()
    }

    async fn roots(&mut self) -> Result<Vec<RemotePath>> {
        Ok(self
            .store
            .list_buckets()
            .await?
            .into_iter()
            .map(|bucket| RemotePath::bucket(bucket.key))
            .collect())
    }

    async fn children(&mut self, node: &RemotePath, _force: bool) -> Result<Vec<RemotePath>> {
        self.list(node).await
    }

    async fn preview(&mut self, node: &RemotePath) -> Result<String> {
        if node.is_dir {
            let children = self.list(node).await?;
            return Ok(preview::container(children.iter().map(RemotePath::name)));
        }
        let meta = self.store.stat(node).await?;
        let head = self.store.read_head(node, self.preview_lines).await?;
        Ok(preview::leaf(node.name(), &meta, &head, self.preview_lines))
    }

    async fn download(&mut self, node: &RemotePath, dest: &Path) -> Result<()> {
        tracing::debug!(path = %node, dest = %dest.display(), "downloading");
        self.store.copy(node, dest, node.is_dir).await
    }
}
