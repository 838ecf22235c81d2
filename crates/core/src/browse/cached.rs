//! Browsing the memoized tree

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use super::Browser;
use crate::error::Result;
use crate::preview;
use crate::traits::ObjectStore;
use crate::tree::{NodeId, RemoteTree};

/// [`Browser`] over a [`RemoteTree`], loading containers lazily
pub struct TreeBrowser {
    tree: RemoteTree,
    store: Arc<dyn ObjectStore>,
    preview_lines: usize,
}

impl TreeBrowser {
    /// Browse an existing tree
    pub fn new(store: Arc<dyn ObjectStore>, tree: RemoteTree, preview_lines: usize) -> Self {
        Self {
            tree,
            store,
            preview_lines,
        }
    }

    /// Register every remote bucket, restoring cached subtrees from `cache_dir`
    pub async fn open(
        store: Arc<dyn ObjectStore>,
        cache_dir: Option<&Path>,
        preview_lines: usize,
    ) -> Result<Self> {
        let mut tree = RemoteTree::new();
        for bucket in store.list_buckets().await? {
            tree.add_bucket(bucket.key.as_str());
            if let Some(dir) = cache_dir {
                if tree.restore(dir, &bucket.key)? {
                    tracing::debug!(bucket = %bucket.key, "using cached tree");
                }
            }
        }
        Ok(Self::new(store, tree, preview_lines))
    }

    /// The underlying tree
    pub fn tree(&self) -> &RemoteTree {
        &self.tree
    }

    /// Force-save every bucket into `dir`, returning how many were written
    pub fn save_all(&self, dir: &Path) -> Result<usize> {
        let mut written = 0;
        for &bucket in self.tree.buckets() {
            if self.tree.save(bucket, dir, true)? {
                written += 1;
            }
        }
        Ok(written)
    }
}

#[async_trait]
impl Browser for TreeBrowser {
    type Node = NodeId;

    fn label(&self, node: &NodeId) -> String {
        self.tree.name(*node).to_string()
    }

    fn path(&self, node: &NodeId) -> String {
        self.tree.path(*node)
    }

    fn is_container(&self, node: &NodeId) -> bool {
        self.tree.is_container(*node)
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.tree.parent(*node)
    }

    async fn roots(&mut self) -> Result<Vec<NodeId>> {
        Ok(self.tree.buckets().to_vec())
    }

    async fn children(&mut self, node: &NodeId, force: bool) -> Result<Vec<NodeId>> {
        self.tree.load(self.store.as_ref(), *node, force).await?;
        Ok(self.tree.children(*node).to_vec())
    }

    async fn preview(&mut self, node: &NodeId) -> Result<String> {
        let node = *node;
        if self.tree.is_container(node) {
            self.tree.load(self.store.as_ref(), node, false).await?;
            let tree = &self.tree;
            return Ok(preview::container(
                tree.children(node).iter().map(|&c| tree.name(c)),
            ));
        }

        let meta = self.tree.stat(self.store.as_ref(), node).await?;
        let head = self
            .store
            .read_head(&self.tree.remote_path(node), self.preview_lines)
            .await?;
        Ok(preview::leaf(
            self.tree.name(node),
            &meta,
            &head,
            self.preview_lines,
        ))
    }

    async fn download(&mut self, node: &NodeId, dest: &Path) -> Result<()> {
        let path = self.tree.remote_path(*node);
        tracing::debug!(%path, dest = %dest.display(), "downloading");
        self.store
            .copy(&path, dest, self.tree.is_container(*node))
            .await
    }
}
