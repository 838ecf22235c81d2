//! On-disk snapshots of bucket subtrees
//!
//! One JSON file per bucket, named after the bucket. Records are stored flat
//! in breadth-first order, each pointing at its parent record, so neither
//! writing nor reading recurses over the hierarchy.

use std::collections::VecDeque;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{Entry, EntryKind, Node, NodeId, NodeKind, RemoteTree};
use crate::error::{Error, Result};
use crate::traits::Metadata;

/// Snapshot format version; snapshots with another version are ignored
pub const CACHE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    bucket: String,
    records: Vec<Record>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Record {
    /// Index of the parent record; `None` only for the bucket itself
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent: Option<usize>,
    name: String,
    #[serde(flatten)]
    kind: RecordKind,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum RecordKind {
    Container {
        loaded: bool,
    },
    Leaf {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        meta: Option<Metadata>,
    },
}

impl RecordKind {
    fn of(kind: &NodeKind) -> Self {
        match kind {
            NodeKind::Container { loaded, .. } => RecordKind::Container { loaded: *loaded },
            NodeKind::Leaf { meta } => RecordKind::Leaf { meta: meta.clone() },
        }
    }
}

impl RemoteTree {
    fn snapshot(&self, bucket: NodeId) -> Result<Snapshot> {
        let root = self.live(bucket)?;
        let mut records = vec![Record {
            parent: None,
            name: root.name.clone(),
            kind: RecordKind::of(&root.kind),
        }];
        let mut queue = VecDeque::from([(bucket, 0usize)]);

        while let Some((id, record)) = queue.pop_front() {
            for &child in self.children(id) {
                let Some(node) = self.node(child) else {
                    continue;
                };
                records.push(Record {
                    parent: Some(record),
                    name: node.name.clone(),
                    kind: RecordKind::of(&node.kind),
                });
                if matches!(node.kind, NodeKind::Container { .. }) {
                    queue.push_back((child, records.len() - 1));
                }
            }
        }

        Ok(Snapshot {
            version: CACHE_VERSION,
            bucket: root.name.clone(),
            records,
        })
    }

    /// Write a bucket's subtree to `dir/<bucket name>`
    ///
    /// An existing file is left untouched unless `force` is set.
    /// Returns whether the file was written.
    pub fn save(&self, bucket: NodeId, dir: &Path, force: bool) -> Result<bool> {
        if self.entry_kind(bucket) != Some(EntryKind::Bucket) {
            return Err(Error::Cache(format!(
                "only buckets can be saved, got {}",
                self.path(bucket)
            )));
        }

        std::fs::create_dir_all(dir)?;
        let file_path = dir.join(self.name(bucket));
        if !force && file_path.exists() {
            tracing::debug!(path = %file_path.display(), "cache file exists, not overwriting");
            return Ok(false);
        }

        let snapshot = self.snapshot(bucket)?;
        std::fs::write(&file_path, serde_json::to_vec(&snapshot)?)?;
        tracing::debug!(
            path = %file_path.display(),
            records = snapshot.records.len(),
            "saved tree cache"
        );
        Ok(true)
    }

    /// Replace the placeholder bucket `name` with the snapshot in `dir/<name>`
    ///
    /// Registers the bucket if needed. Returns `false` when no usable
    /// snapshot exists; unreadable snapshots are ignored with a warning.
    pub fn restore(&mut self, dir: &Path, name: &str) -> Result<bool> {
        let file_path = dir.join(name);
        if !file_path.exists() {
            return Ok(false);
        }

        let content = std::fs::read(&file_path)?;
        let snapshot: Snapshot = match serde_json::from_slice(&content) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(path = %file_path.display(), "ignoring unreadable tree cache: {e}");
                return Ok(false);
            }
        };
        if let Err(e) = validate(&snapshot, name) {
            tracing::warn!(path = %file_path.display(), "ignoring tree cache: {e}");
            return Ok(false);
        }

        let bucket = self.add_bucket(name);
        self.clear_children(bucket);

        let mut ids: Vec<Option<NodeId>> = Vec::with_capacity(snapshot.records.len());
        for record in snapshot.records {
            let id = match record.parent.and_then(|p| ids.get(p).copied().flatten()) {
                None if ids.is_empty() => Some(bucket),
                None => None,
                Some(parent) => {
                    let entry = Entry {
                        name: record.name,
                        parent,
                        container: matches!(record.kind, RecordKind::Container { .. }),
                    };
                    self.add(parent, entry)
                }
            };
            if let Some(id) = id {
                self.apply_record(id, record.kind);
            }
            ids.push(id);
        }

        tracing::debug!(path = %file_path.display(), "restored tree cache");
        Ok(true)
    }

    fn apply_record(&mut self, id: NodeId, record: RecordKind) {
        match (self.node_mut(id), record) {
            (
                Some(Node {
                    kind: NodeKind::Container { loaded, .. },
                    ..
                }),
                RecordKind::Container { loaded: was_loaded },
            ) => *loaded = was_loaded,
            (
                Some(Node {
                    kind: NodeKind::Leaf { meta },
                    ..
                }),
                RecordKind::Leaf { meta: cached },
            ) => *meta = cached,
            _ => {}
        }
    }
}

fn validate(snapshot: &Snapshot, name: &str) -> Result<()> {
    if snapshot.version != CACHE_VERSION {
        return Err(Error::Cache(format!(
            "version {} does not match {CACHE_VERSION}",
            snapshot.version
        )));
    }
    if snapshot.bucket != name {
        return Err(Error::Cache(format!(
            "snapshot is for bucket '{}', expected '{name}'",
            snapshot.bucket
        )));
    }
    match snapshot.records.first() {
        Some(Record {
            parent: None,
            kind: RecordKind::Container { .. },
            ..
        }) => {}
        _ => return Err(Error::Cache("missing bucket record".into())),
    }
    for (i, record) in snapshot.records.iter().enumerate().skip(1) {
        match record.parent {
            Some(p) if p < i => {}
            _ => return Err(Error::Cache(format!("record {i} has an invalid parent"))),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{Listing, MockObjectStore, ObjectInfo};
    use tempfile::TempDir;

    fn meta(secs: i64) -> Metadata {
        Metadata {
            created: Some(jiff::Timestamp::from_second(secs).unwrap()),
            updated: Some(jiff::Timestamp::from_second(secs + 60).unwrap()),
            size: Some(7),
        }
    }

    async fn populated_tree() -> (RemoteTree, NodeId) {
        let mut store = MockObjectStore::new();
        store.expect_list().returning(|path| {
            Ok(match path.key.as_str() {
                "" => Listing {
                    dirs: vec!["docs/".into(), "empty/".into()],
                    files: vec![ObjectInfo::file("top.txt", 3)],
                },
                "docs/" => Listing {
                    dirs: vec!["docs/deep/".into()],
                    files: vec![ObjectInfo::file("docs/a.md", 5), ObjectInfo::file("docs/b.md", 9)],
                },
                _ => Listing::default(),
            })
        });
        store.expect_stat().returning(|_| Ok(meta(1_700_000_000)));

        let mut tree = RemoteTree::new();
        let bucket = tree.add_bucket("bucket");
        tree.load(&store, bucket, false).await.unwrap();
        let docs = tree.get(bucket, "docs").unwrap();
        tree.load(&store, docs, false).await.unwrap();
        let empty = tree.get(bucket, "empty").unwrap();
        tree.load(&store, empty, false).await.unwrap();
        let a = tree.get(docs, "a.md").unwrap();
        tree.stat(&store, a).await.unwrap();
        (tree, bucket)
    }

    #[tokio::test]
    async fn test_round_trip_without_remote_calls() {
        let temp_dir = TempDir::new().unwrap();
        let (tree, bucket) = populated_tree().await;
        assert!(tree.save(bucket, temp_dir.path(), false).unwrap());

        let mut restored = RemoteTree::new();
        restored.add_bucket("bucket");
        assert!(restored.restore(temp_dir.path(), "bucket").unwrap());

        let bucket = restored.bucket("bucket").unwrap();
        assert_eq!(
            restored.ls(bucket),
            vec!["s3://bucket/docs", "s3://bucket/empty", "s3://bucket/top.txt"]
        );
        let docs = restored.get(bucket, "docs").unwrap();
        assert_eq!(
            restored.ls(docs),
            vec![
                "s3://bucket/docs/deep",
                "s3://bucket/docs/a.md",
                "s3://bucket/docs/b.md"
            ]
        );
        let a = restored.get(docs, "a.md").unwrap();
        assert_eq!(restored.cached_meta(a), Some(&meta(1_700_000_000)));
        assert!(restored.cached_meta(restored.get(docs, "b.md").unwrap()).is_none());
        assert!(restored.is_loaded(bucket));
        assert!(restored.is_loaded(restored.get(bucket, "empty").unwrap()));
        assert!(!restored.is_loaded(restored.get(docs, "deep").unwrap()));

        // populated and listed containers need no listing: no expectations set
        let store = MockObjectStore::new();
        restored.load(&store, bucket, false).await.unwrap();
        restored.load(&store, docs, false).await.unwrap();
        let empty = restored.get(bucket, "empty").unwrap();
        restored.load(&store, empty, false).await.unwrap();
        assert_eq!(restored.stat(&store, a).await.unwrap(), meta(1_700_000_000));
    }

    #[tokio::test]
    async fn test_save_does_not_overwrite_unless_forced() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("bucket");
        std::fs::write(&file_path, "existing").unwrap();

        let (tree, bucket) = populated_tree().await;
        assert!(!tree.save(bucket, temp_dir.path(), false).unwrap());
        assert_eq!(std::fs::read_to_string(&file_path).unwrap(), "existing");

        assert!(tree.save(bucket, temp_dir.path(), true).unwrap());
        assert_ne!(std::fs::read_to_string(&file_path).unwrap(), "existing");
    }

    #[test]
    fn test_save_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let cache_dir = temp_dir.path().join("nested").join("cache");
        let mut tree = RemoteTree::new();
        let bucket = tree.add_bucket("b");

        assert!(tree.save(bucket, &cache_dir, false).unwrap());
        assert!(cache_dir.join("b").exists());
    }

    #[test]
    fn test_save_rejects_non_bucket() {
        let temp_dir = TempDir::new().unwrap();
        let mut tree = RemoteTree::new();
        let bucket = tree.add_bucket("b");
        let dir = tree.add(bucket, Entry::directory("d", bucket)).unwrap();
        assert!(matches!(
            tree.save(dir, temp_dir.path(), true),
            Err(Error::Cache(_))
        ));
    }

    #[test]
    fn test_restore_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let mut tree = RemoteTree::new();
        assert!(!tree.restore(temp_dir.path(), "nothing").unwrap());
        assert!(tree.bucket("nothing").is_none());
    }

    #[test]
    fn test_restore_ignores_corrupt_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("b"), "{not json").unwrap();

        let mut tree = RemoteTree::new();
        let bucket = tree.add_bucket("b");
        tree.add(bucket, Entry::file("kept", bucket));
        assert!(!tree.restore(temp_dir.path(), "b").unwrap());
        assert_eq!(tree.ls(bucket), vec!["s3://b/kept"]);
    }

    #[test]
    fn test_restore_ignores_other_version() {
        let temp_dir = TempDir::new().unwrap();
        let snapshot = serde_json::json!({
            "version": CACHE_VERSION + 1,
            "bucket": "b",
            "records": [{"name": "b", "kind": "container", "loaded": true}],
        });
        std::fs::write(temp_dir.path().join("b"), snapshot.to_string()).unwrap();

        let mut tree = RemoteTree::new();
        assert!(!tree.restore(temp_dir.path(), "b").unwrap());
    }

    #[test]
    fn test_restore_replaces_placeholder_children() {
        let temp_dir = TempDir::new().unwrap();
        let mut source = RemoteTree::new();
        let bucket = source.add_bucket("b");
        source.add(bucket, Entry::file("cached.txt", bucket));
        source.save(bucket, temp_dir.path(), true).unwrap();

        let mut tree = RemoteTree::new();
        let bucket = tree.add_bucket("b");
        tree.add(bucket, Entry::file("stale.txt", bucket));
        assert!(tree.restore(temp_dir.path(), "b").unwrap());
        assert_eq!(tree.ls(bucket), vec!["s3://b/cached.txt"]);
    }
}
