//! Browsable nodes
//!
//! The selector and traversal loop are written once against [`Browser`].
//! [`TreeBrowser`] walks the memoized [`RemoteTree`](crate::tree::RemoteTree);
//! [`DirectBrowser`] lists remote paths on every visit.

mod cached;
mod direct;

pub use cached::TreeBrowser;
pub use direct::DirectBrowser;

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;

/// Capabilities the selector and traversal loop need from a hierarchy
#[async_trait]
pub trait Browser: Send {
    /// Handle to one entry of the hierarchy
    type Node: Clone + Send + Sync;

    /// Text shown and filtered for the node
    fn label(&self, node: &Self::Node) -> String;

    /// Absolute `s3://` path of the node
    fn path(&self, node: &Self::Node) -> String;

    /// Whether the node can be drilled into
    fn is_container(&self, node: &Self::Node) -> bool;

    /// Logical parent, `None` for top-level buckets
    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Top-level containers
    async fn roots(&mut self) -> Result<Vec<Self::Node>>;

    /// Children of a container; `force` discards anything memoized first
    async fn children(&mut self, node: &Self::Node, force: bool) -> Result<Vec<Self::Node>>;

    /// Short description of the node for the preview pane
    async fn preview(&mut self, node: &Self::Node) -> Result<String>;

    /// Download the node into `dest`, recursively for containers
    async fn download(&mut self, node: &Self::Node, dest: &Path) -> Result<()>;
}
