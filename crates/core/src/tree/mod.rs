//! Lazy remote tree
//!
//! A memoized mirror of the remote hierarchy. Nodes live in an arena owned by
//! [`RemoteTree`], which is also the registry of top-level buckets. Containers
//! own their children through id lists; the `parent` id is the only
//! back-reference and is used for path reconstruction and upward navigation.

mod cache;

pub use cache::CACHE_VERSION;

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::path::{child_segment, RemotePath, SCHEME};
use crate::traits::{Metadata, ObjectStore};

/// Handle on a node of a [`RemoteTree`]
///
/// Released slots are reused; the generation makes a handle to a released
/// node read as missing instead of aliasing whatever took its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

/// Which of the three entry types a node is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Top-level container
    Bucket,
    /// Nested container
    Directory,
    /// Leaf object
    File,
}

/// Container or leaf payload of a node
#[derive(Debug, Clone)]
pub enum NodeKind {
    Container {
        /// Children in insertion order
        children: Vec<NodeId>,
        /// Name lookup for `children`
        index: HashMap<String, NodeId>,
        /// Whether a listing has populated this container
        loaded: bool,
    },
    Leaf {
        /// Metadata, filled by the first `stat`
        meta: Option<Metadata>,
    },
}

impl NodeKind {
    fn container() -> Self {
        NodeKind::Container {
            children: Vec::new(),
            index: HashMap::new(),
            loaded: false,
        }
    }
}

/// A node of the tree
#[derive(Debug, Clone)]
pub struct Node {
    name: String,
    parent: Option<NodeId>,
    kind: NodeKind,
}

impl Node {
    /// Node name (bucket name, directory name or object name)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent node, `None` for buckets
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Container or leaf payload
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }
}

/// A detached entry waiting to be inserted with [`RemoteTree::add`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Entry name
    pub name: String,
    /// Node the entry's path is computed from
    pub parent: NodeId,
    /// Container (directory) or leaf (file)
    pub container: bool,
}

impl Entry {
    /// A directory entry
    pub fn directory(name: impl Into<String>, parent: NodeId) -> Self {
        Self {
            name: name.into(),
            parent,
            container: true,
        }
    }

    /// A file entry
    pub fn file(name: impl Into<String>, parent: NodeId) -> Self {
        Self {
            name: name.into(),
            parent,
            container: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Arena of remote entries and registry of buckets
#[derive(Debug, Clone, Default)]
pub struct RemoteTree {
    slots: Vec<Slot>,
    /// Indices of released slots
    free: Vec<usize>,
    buckets: Vec<NodeId>,
    bucket_index: HashMap<String, NodeId>,
}

impl RemoteTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.node = Some(node);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId {
            index: self.slots.len() - 1,
            generation: 0,
        }
    }

    fn release(&mut self, id: NodeId) -> Option<Node> {
        let slot = self
            .slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)?;
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        Some(node)
    }

    /// Number of allocated slots, live or free
    #[cfg(test)]
    fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Register a bucket placeholder, or return the existing one
    pub fn add_bucket(&mut self, name: impl Into<String>) -> NodeId {
        let name = name.into();
        if let Some(&id) = self.bucket_index.get(&name) {
            return id;
        }
        let id = self.alloc(Node {
            name: name.clone(),
            parent: None,
            kind: NodeKind::container(),
        });
        self.buckets.push(id);
        self.bucket_index.insert(name, id);
        id
    }

    /// Look up a bucket by name
    pub fn bucket(&self, name: &str) -> Option<NodeId> {
        self.bucket_index.get(name).copied()
    }

    /// Registered buckets in registration order
    pub fn buckets(&self) -> &[NodeId] {
        &self.buckets
    }

    /// Get a live node
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    fn live(&self, id: NodeId) -> Result<&Node> {
        self.node(id)
            .ok_or_else(|| Error::General(format!("stale tree node {}", id.index)))
    }

    /// Node name, empty for a released node
    pub fn name(&self, id: NodeId) -> &str {
        self.node(id).map(Node::name).unwrap_or_default()
    }

    /// Parent of a node
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(Node::parent)
    }

    /// Entry type of a node
    pub fn entry_kind(&self, id: NodeId) -> Option<EntryKind> {
        let node = self.node(id)?;
        Some(match (&node.kind, node.parent) {
            (NodeKind::Leaf { .. }, _) => EntryKind::File,
            (NodeKind::Container { .. }, None) => EntryKind::Bucket,
            (NodeKind::Container { .. }, Some(_)) => EntryKind::Directory,
        })
    }

    /// Whether the node is a bucket or directory
    pub fn is_container(&self, id: NodeId) -> bool {
        matches!(
            self.node(id).map(Node::kind),
            Some(NodeKind::Container { .. })
        )
    }

    /// Whether a listing has populated this container
    pub fn is_loaded(&self, id: NodeId) -> bool {
        matches!(
            self.node(id).map(Node::kind),
            Some(NodeKind::Container { loaded: true, .. })
        )
    }

    /// Names from the bucket down to `id`
    fn segments(&self, id: NodeId) -> Vec<&str> {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current.and_then(|id| self.node(id)) {
            segments.push(node.name.as_str());
            current = node.parent;
        }
        segments.reverse();
        segments
    }

    /// Absolute path: `s3://bucket` for buckets, parent path + "/" + name otherwise
    pub fn path(&self, id: NodeId) -> String {
        format!("{SCHEME}{}", self.segments(id).join("/"))
    }

    /// Remote location of a node, with directory semantics for containers
    pub fn remote_path(&self, id: NodeId) -> RemotePath {
        let segments = self.segments(id);
        let bucket = segments.first().copied().unwrap_or_default();
        let key = segments.get(1..).unwrap_or_default().join("/");
        let path = RemotePath::new(bucket, key);
        if self.is_container(id) {
            path.into_dir()
        } else {
            path
        }
    }

    /// Children of a container in insertion order (empty for leaves)
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.node(id).map(Node::kind) {
            Some(NodeKind::Container { children, .. }) => children,
            _ => &[],
        }
    }

    /// Look up a child by name
    pub fn get(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        match self.node(parent).map(Node::kind) {
            Some(NodeKind::Container { index, .. }) => index.get(name).copied(),
            _ => None,
        }
    }

    /// Absolute paths of a container's children
    pub fn ls(&self, id: NodeId) -> Vec<String> {
        self.children(id).iter().map(|&c| self.path(c)).collect()
    }

    /// Insert an entry under `parent`
    ///
    /// The entry's path (its own parent's path + "/" + name) must lie inside
    /// `parent`, the name must be non-empty, and an existing name is kept.
    /// Returns the new node id, or `None` when the entry was not inserted.
    pub fn add(&mut self, parent: NodeId, entry: Entry) -> Option<NodeId> {
        if entry.name.is_empty() || !self.is_container(parent) {
            return None;
        }
        self.node(entry.parent)?;

        let parent_path = self.path(parent);
        let entry_path = format!("{}/{}", self.path(entry.parent), entry.name);
        if !entry_path.starts_with(&format!("{parent_path}/")) {
            tracing::debug!(%entry_path, %parent_path, "rejected entry outside parent");
            return None;
        }
        if self.get(parent, &entry.name).is_some() {
            return None;
        }

        let kind = if entry.container {
            NodeKind::container()
        } else {
            NodeKind::Leaf { meta: None }
        };
        let name = entry.name;
        let id = self.alloc(Node {
            name: name.clone(),
            parent: Some(parent),
            kind,
        });
        if let Some(Node {
            kind: NodeKind::Container {
                children, index, ..
            },
            ..
        }) = self.node_mut(parent)
        {
            children.push(id);
            index.insert(name, id);
        }
        Some(id)
    }

    /// Release every descendant of a container and mark it unlisted
    fn clear_children(&mut self, id: NodeId) {
        let mut pending = match self.node_mut(id) {
            Some(Node {
                kind:
                    NodeKind::Container {
                        children,
                        index,
                        loaded,
                    },
                ..
            }) => {
                index.clear();
                *loaded = false;
                std::mem::take(children)
            }
            _ => return,
        };
        while let Some(child) = pending.pop() {
            if let Some(node) = self.release(child) {
                if let NodeKind::Container { children, .. } = node.kind {
                    pending.extend(children);
                }
            }
        }
    }

    fn set_loaded(&mut self, id: NodeId) {
        if let Some(Node {
            kind: NodeKind::Container { loaded, .. },
            ..
        }) = self.node_mut(id)
        {
            *loaded = true;
        }
    }

    /// Populate a container's children from one shallow listing
    ///
    /// Without `force` this is a no-op when the container already has
    /// children or was listed before. With `force` the listing is fetched
    /// first and the previous children are replaced only once it succeeds.
    pub async fn load(&mut self, store: &dyn ObjectStore, id: NodeId, force: bool) -> Result<()> {
        let node = self.live(id)?;
        let NodeKind::Container {
            children, loaded, ..
        } = &node.kind
        else {
            return Ok(());
        };
        if !force && (*loaded || !children.is_empty()) {
            return Ok(());
        }

        let path = self.remote_path(id);
        tracing::debug!(%path, force, "listing container");
        let listing = store.list(&path).await?;

        if force {
            self.clear_children(id);
        }
        let prefix = path.list_prefix();
        for dir in &listing.dirs {
            let name = child_name(&prefix, dir);
            self.add(id, Entry::directory(name, id));
        }
        for file in &listing.files {
            // zero-byte "folder" markers
            if file.key.ends_with('/') {
                continue;
            }
            let name = child_name(&prefix, &file.key);
            self.add(id, Entry::file(name, id));
        }
        self.set_loaded(id);
        Ok(())
    }

    /// Leaf metadata, fetched on first access and memoized
    pub async fn stat(&mut self, store: &dyn ObjectStore, id: NodeId) -> Result<Metadata> {
        match &self.live(id)?.kind {
            NodeKind::Leaf { meta: Some(meta) } => return Ok(meta.clone()),
            NodeKind::Leaf { meta: None } => {}
            NodeKind::Container { .. } => {
                return Err(Error::General(format!("{} is not an object", self.path(id))));
            }
        }

        let path = self.remote_path(id);
        tracing::debug!(%path, "fetching metadata");
        let fetched = store.stat(&path).await?;
        if let Some(Node {
            kind: NodeKind::Leaf { meta },
            ..
        }) = self.node_mut(id)
        {
            *meta = Some(fetched.clone());
        }
        Ok(fetched)
    }

    /// Memoized leaf metadata, without any remote call
    pub fn cached_meta(&self, id: NodeId) -> Option<&Metadata> {
        match self.node(id).map(Node::kind) {
            Some(NodeKind::Leaf { meta }) => meta.as_ref(),
            _ => None,
        }
    }
}

/// Name of a listed key, empty (and so rejected by `add`) when it has no single segment
fn child_name(prefix: &str, key: &str) -> String {
    match child_segment(prefix, key) {
        Some(segment) => segment.to_string(),
        None => {
            tracing::debug!(%key, %prefix, "skipping key without a usable name");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{Listing, MockObjectStore, ObjectInfo};

    fn sample_tree() -> (RemoteTree, NodeId, NodeId, NodeId) {
        let mut tree = RemoteTree::new();
        let bucket = tree.add_bucket("test_bucket");
        let parent = tree.add(bucket, Entry::directory("test_parent", bucket)).unwrap();
        let directory = tree
            .add(parent, Entry::directory("test_directory", parent))
            .unwrap();
        (tree, bucket, parent, directory)
    }

    fn listing(dirs: &[&str], files: &[&str]) -> Listing {
        Listing {
            dirs: dirs.iter().map(|d| d.to_string()).collect(),
            files: files.iter().map(|f| ObjectInfo::file(*f, 1)).collect(),
        }
    }

    #[test]
    fn test_bucket_registry() {
        let mut tree = RemoteTree::new();
        let a = tree.add_bucket("a");
        let b = tree.add_bucket("b");
        assert_eq!(tree.add_bucket("a"), a);
        assert_eq!(tree.buckets(), &[a, b]);
        assert_eq!(tree.bucket("b"), Some(b));
        assert_eq!(tree.entry_kind(a), Some(EntryKind::Bucket));
        assert!(tree.children(a).is_empty());
    }

    #[test]
    fn test_paths() {
        let (mut tree, bucket, parent, directory) = sample_tree();
        let file = tree.add(directory, Entry::file("f.txt", directory)).unwrap();

        assert_eq!(tree.path(bucket), "s3://test_bucket");
        assert_eq!(
            tree.path(directory),
            "s3://test_bucket/test_parent/test_directory"
        );
        assert_eq!(tree.remote_path(parent).key, "test_parent/");
        assert_eq!(
            tree.remote_path(file),
            RemotePath::new("test_bucket", "test_parent/test_directory/f.txt")
        );
        assert_eq!(tree.entry_kind(directory), Some(EntryKind::Directory));
        assert_eq!(tree.entry_kind(file), Some(EntryKind::File));
    }

    #[test]
    fn test_get() {
        let (tree, bucket, parent, _directory) = sample_tree();
        assert_eq!(tree.get(bucket, "test_parent"), Some(parent));
        assert_eq!(tree.get(bucket, "nonexistent_entry"), None);
        assert_eq!(
            tree.get(bucket, "nonexistent_entry").unwrap_or(bucket),
            bucket
        );
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut tree = RemoteTree::new();
        let bucket = tree.add_bucket("test_bucket");
        let first = tree.add(bucket, Entry::directory("test_entry", bucket)).unwrap();

        assert_eq!(tree.add(bucket, Entry::directory("test_entry", bucket)), None);
        assert_eq!(tree.add(bucket, Entry::file("test_entry", bucket)), None);
        assert_eq!(tree.children(bucket), &[first]);
        assert!(tree.is_container(first));
    }

    #[test]
    fn test_add_rejects_outside_parent() {
        let (mut tree, _bucket, parent, directory) = sample_tree();

        let other = Entry::directory("other_directory/test_entry", parent);
        assert_eq!(tree.add(directory, other), None);
        assert!(tree.children(directory).is_empty());

        // a sibling whose name merely extends the parent's is still outside it
        let lookalike = Entry::directory("test_directory_2", parent);
        assert_eq!(tree.add(directory, lookalike), None);
    }

    #[test]
    fn test_add_rejects_empty_name_and_leaf_parent() {
        let (mut tree, bucket, _parent, directory) = sample_tree();
        assert_eq!(tree.add(bucket, Entry::file("", bucket)), None);

        let file = tree.add(directory, Entry::file("f", directory)).unwrap();
        assert_eq!(tree.add(file, Entry::file("g", file)), None);
    }

    #[test]
    fn test_ls() {
        let (mut tree, _bucket, _parent, directory) = sample_tree();
        tree.add(directory, Entry::directory("test_entry1", directory));
        tree.add(directory, Entry::directory("test_entry2", directory));
        assert_eq!(
            tree.ls(directory),
            vec![
                "s3://test_bucket/test_parent/test_directory/test_entry1",
                "s3://test_bucket/test_parent/test_directory/test_entry2",
            ]
        );
    }

    #[tokio::test]
    async fn test_load_lists_once() {
        let mut store = MockObjectStore::new();
        store
            .expect_list()
            .withf(|path| path.bucket == "bucket" && path.key.is_empty())
            .times(1)
            .returning(|_| Ok(listing(&["logs/"], &["readme.md"])));

        let mut tree = RemoteTree::new();
        let bucket = tree.add_bucket("bucket");
        tree.load(&store, bucket, false).await.unwrap();
        tree.load(&store, bucket, false).await.unwrap();

        let names: Vec<&str> = tree.children(bucket).iter().map(|&c| tree.name(c)).collect();
        assert_eq!(names, vec!["logs", "readme.md"]);
        let logs = tree.get(bucket, "logs").unwrap();
        assert!(tree.is_container(logs));
        assert!(!tree.is_container(tree.get(bucket, "readme.md").unwrap()));
        assert!(tree.is_loaded(bucket));
        assert!(!tree.is_loaded(logs));
    }

    #[tokio::test]
    async fn test_load_skips_populated_container() {
        // no expectations: any remote call panics
        let store = MockObjectStore::new();
        let (mut tree, _bucket, parent, _directory) = sample_tree();
        tree.load(&store, parent, false).await.unwrap();
        assert_eq!(tree.children(parent).len(), 1);
    }

    #[tokio::test]
    async fn test_load_empty_listing_is_memoized() {
        let mut store = MockObjectStore::new();
        store
            .expect_list()
            .times(1)
            .returning(|_| Ok(Listing::default()));

        let mut tree = RemoteTree::new();
        let bucket = tree.add_bucket("empty");
        tree.load(&store, bucket, false).await.unwrap();
        tree.load(&store, bucket, false).await.unwrap();
        assert!(tree.children(bucket).is_empty());
    }

    #[tokio::test]
    async fn test_force_load_replaces_children() {
        let mut store = MockObjectStore::new();
        store
            .expect_list()
            .withf(|path| path.key == "test_parent/")
            .times(1)
            .returning(|_| Ok(listing(&["test_parent/fresh/"], &["test_parent/new.txt"])));

        let (mut tree, _bucket, parent, directory) = sample_tree();
        tree.load(&store, parent, true).await.unwrap();

        let names: Vec<&str> = tree.children(parent).iter().map(|&c| tree.name(c)).collect();
        assert_eq!(names, vec!["fresh", "new.txt"]);
        assert!(tree.node(directory).is_none());
        assert_eq!(tree.get(parent, "test_directory"), None);
    }

    #[tokio::test]
    async fn test_failed_force_load_keeps_children() {
        let mut store = MockObjectStore::new();
        store
            .expect_list()
            .times(1)
            .returning(|_| Err(Error::Network("connection reset".into())));

        let (mut tree, _bucket, parent, directory) = sample_tree();
        let result = tree.load(&store, parent, true).await;

        assert!(matches!(result, Err(Error::Network(_))));
        assert_eq!(tree.children(parent), &[directory]);
    }

    #[tokio::test]
    async fn test_load_skips_directory_marker() {
        let mut store = MockObjectStore::new();
        store
            .expect_list()
            .returning(|_| Ok(listing(&[], &["test_parent/", "test_parent/a.txt"])));

        let mut tree = RemoteTree::new();
        let bucket = tree.add_bucket("test_bucket");
        let parent = tree.add(bucket, Entry::directory("test_parent", bucket)).unwrap();
        tree.load(&store, parent, false).await.unwrap();

        let names: Vec<&str> = tree.children(parent).iter().map(|&c| tree.name(c)).collect();
        assert_eq!(names, vec!["a.txt"]);
    }

    #[tokio::test]
    async fn test_load_skips_keys_without_a_segment() {
        let mut store = MockObjectStore::new();
        store
            .expect_list()
            .times(1)
            .returning(|_| Ok(listing(&["/", "a//", "b/"], &["x"])));

        let mut tree = RemoteTree::new();
        let bucket = tree.add_bucket("photos");
        tree.load(&store, bucket, false).await.unwrap();

        let names: Vec<&str> = tree.children(bucket).iter().map(|&c| tree.name(c)).collect();
        assert_eq!(names, vec!["b", "x"]);
        assert_eq!(tree.get(bucket, "photos"), None);
        assert_eq!(tree.get(bucket, "a"), None);
        let b = tree.get(bucket, "b").unwrap();
        assert_eq!(tree.remote_path(b).key, "b/");
    }

    #[tokio::test]
    async fn test_reload_reuses_released_slots() {
        let mut store = MockObjectStore::new();
        store
            .expect_list()
            .times(3)
            .returning(|_| Ok(listing(&["logs/"], &["a.txt", "b.txt"])));

        let mut tree = RemoteTree::new();
        let bucket = tree.add_bucket("bucket");
        tree.load(&store, bucket, false).await.unwrap();
        let stale = tree.get(bucket, "a.txt").unwrap();
        let capacity = tree.capacity();

        tree.load(&store, bucket, true).await.unwrap();
        tree.load(&store, bucket, true).await.unwrap();

        assert_eq!(tree.capacity(), capacity);
        assert!(tree.node(stale).is_none());
        assert_eq!(tree.name(stale), "");
        let fresh = tree.get(bucket, "a.txt").unwrap();
        assert_ne!(fresh, stale);
        assert_eq!(tree.path(fresh), "s3://bucket/a.txt");
    }

    #[tokio::test]
    async fn test_load_on_leaf_is_noop() {
        let store = MockObjectStore::new();
        let (mut tree, bucket, _parent, _directory) = sample_tree();
        let file = tree.add(bucket, Entry::file("f", bucket)).unwrap();
        tree.load(&store, file, true).await.unwrap();
    }

    #[tokio::test]
    async fn test_stat_is_memoized() {
        let mut store = MockObjectStore::new();
        store.expect_stat().times(1).returning(|_| {
            Ok(Metadata {
                created: Some(jiff::Timestamp::from_second(1_700_000_000).unwrap()),
                updated: Some(jiff::Timestamp::from_second(1_700_000_100).unwrap()),
                size: Some(42),
            })
        });

        let (mut tree, bucket, _parent, _directory) = sample_tree();
        let file = tree.add(bucket, Entry::file("f", bucket)).unwrap();
        assert!(tree.cached_meta(file).is_none());

        let first = tree.stat(&store, file).await.unwrap();
        let second = tree.stat(&store, file).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(tree.cached_meta(file).and_then(|m| m.size), Some(42));
    }

    #[tokio::test]
    async fn test_stat_on_container_fails() {
        let store = MockObjectStore::new();
        let (mut tree, bucket, _parent, _directory) = sample_tree();
        assert!(tree.stat(&store, bucket).await.is_err());
    }
}
