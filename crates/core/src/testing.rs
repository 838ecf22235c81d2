//! Test doubles for the selector and traversal loop

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::browse::Browser;
use crate::error::{Error, Result};
use crate::select::{ClipboardSink, Key, Screen, View};

/// Owned copy of a drawn frame
#[derive(Debug, Clone)]
pub struct Frame {
    pub title: String,
    pub query: String,
    pub items: Vec<String>,
    pub highlighted: Option<usize>,
    pub preview: String,
    pub status: Option<String>,
}

/// Screen fed from a fixed key script; fails once the script runs out
#[derive(Debug, Default)]
pub struct ScriptedScreen {
    keys: VecDeque<Key>,
    pub frames: Vec<Frame>,
}

impl ScriptedScreen {
    pub fn new(keys: Vec<Key>) -> Self {
        Self {
            keys: keys.into(),
            frames: Vec::new(),
        }
    }
}

impl Screen for ScriptedScreen {
    fn draw(&mut self, view: &View<'_>) -> Result<()> {
        self.frames.push(Frame {
            title: view.title.to_string(),
            query: view.query.to_string(),
            items: view.items.iter().map(|i| i.label.to_string()).collect(),
            highlighted: view.highlighted,
            preview: view.preview.to_string(),
            status: view.status.map(str::to_string),
        });
        Ok(())
    }

    fn next_key(&mut self) -> Result<Key> {
        self.keys
            .pop_front()
            .ok_or_else(|| Error::Terminal("key script exhausted".into()))
    }
}

#[derive(Debug, Default)]
pub struct RecordingClipboard {
    pub texts: Vec<String>,
    pub fail: bool,
}

impl ClipboardSink for RecordingClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        if self.fail {
            return Err(Error::Clipboard("no clipboard".into()));
        }
        self.texts.push(text.to_string());
        Ok(())
    }
}

/// Flat browser over plain labels; a trailing `/` marks a container
#[derive(Debug, Default)]
pub struct ListBrowser {
    pub fail_remote: bool,
    pub previews: Vec<String>,
    pub refreshes: Vec<String>,
    pub downloads: Vec<(String, PathBuf)>,
}

impl ListBrowser {
    fn remote(&self) -> Result<()> {
        if self.fail_remote {
            return Err(Error::Network("connection refused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl Browser for ListBrowser {
    type Node = String;

    fn label(&self, node: &String) -> String {
        node.clone()
    }

    fn path(&self, node: &String) -> String {
        format!("s3://list/{}", node.trim_end_matches('/'))
    }

    fn is_container(&self, node: &String) -> bool {
        node.ends_with('/')
    }

    fn parent(&self, _node: &String) -> Option<String> {
        None
    }

    async fn roots(&mut self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn children(&mut self, node: &String, force: bool) -> Result<Vec<String>> {
        self.remote()?;
        if force {
            self.refreshes.push(node.clone());
        }
        Ok(Vec::new())
    }

    async fn preview(&mut self, node: &String) -> Result<String> {
        self.remote()?;
        self.previews.push(node.clone());
        Ok(format!("about {node}"))
    }

    async fn download(&mut self, node: &String, dest: &Path) -> Result<()> {
        self.remote()?;
        self.downloads.push((node.clone(), dest.to_path_buf()));
        Ok(())
    }
}
