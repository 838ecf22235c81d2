//! Interactive selection over one level of candidates
//!
//! A [`Selector`] runs rounds: each round shows a set of candidates, lets
//! the user filter and move the cursor, and ends with an [`Outcome`].
//! Rendering and input are behind [`Screen`], the clipboard behind
//! [`ClipboardSink`], so the round itself is toolkit-neutral.

pub mod cursor;
pub mod filter;
pub mod keymap;

pub use cursor::Cursor;
pub use keymap::{Action, Key, Keymap};

use std::collections::HashMap;
use std::path::PathBuf;

use crate::browse::Browser;
use crate::config::Preferences;
use crate::error::{Error, Result};

/// Rendering and input of the selector
pub trait Screen {
    /// Render one frame
    fn draw(&mut self, view: &View<'_>) -> Result<()>;

    /// Block until the next key press
    fn next_key(&mut self) -> Result<Key>;
}

/// Destination of the copy-path action
pub trait ClipboardSink {
    fn set_text(&mut self, text: &str) -> Result<()>;
}

/// One visible candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewItem<'a> {
    pub label: &'a str,
    pub container: bool,
}

/// Everything a frame shows
#[derive(Debug, Clone)]
pub struct View<'a> {
    /// Location of the current level
    pub title: &'a str,
    pub query: &'a str,
    /// Filtered candidates, in original order
    pub items: Vec<ViewItem<'a>>,
    /// Index into `items`, `None` when nothing matches
    pub highlighted: Option<usize>,
    pub preview: &'a str,
    /// Result of the last side effect
    pub status: Option<&'a str>,
}

/// How a round ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<N> {
    /// Confirmed; `None` when the filtered set was empty
    Selected(Option<N>),
    /// Go up one level
    Back,
    /// Abandon the whole traversal
    Cancelled,
}

/// Per-session selector settings
#[derive(Debug, Clone)]
pub struct SelectOptions {
    pub ignore_case: bool,
    pub download_dir: PathBuf,
}

impl Default for SelectOptions {
    fn default() -> Self {
        Self {
            ignore_case: true,
            download_dir: PathBuf::from("."),
        }
    }
}

impl From<&Preferences> for SelectOptions {
    fn from(prefs: &Preferences) -> Self {
        Self {
            ignore_case: prefs.ignore_case,
            download_dir: prefs.download_dir.clone(),
        }
    }
}

/// Reject labels that cannot be shown or filtered at all
///
/// Control characters are legal in object keys and are left to the screen
/// to render.
pub fn validate_label(label: &str) -> Result<()> {
    if label.is_empty() {
        return Err(Error::InvalidCandidate(label.to_string()));
    }
    Ok(())
}

/// Runs selection rounds on a screen
pub struct Selector<S, C> {
    screen: S,
    clipboard: C,
    keymap: Keymap,
    options: SelectOptions,
}

impl<S: Screen, C: ClipboardSink> Selector<S, C> {
    pub fn new(screen: S, clipboard: C, options: SelectOptions) -> Self {
        Self {
            screen,
            clipboard,
            keymap: Keymap::default(),
            options,
        }
    }

    #[cfg(test)]
    pub(crate) fn screen(&self) -> &S {
        &self.screen
    }

    #[cfg(test)]
    pub(crate) fn clipboard(&self) -> &C {
        &self.clipboard
    }

    /// Run one round over `candidates`
    ///
    /// Every key is handled to completion (filter, cursor, preview, redraw)
    /// before the next one is read. Copy-path, download and refresh report
    /// into the status line and never end the round.
    pub async fn select<B: Browser>(
        &mut self,
        browser: &mut B,
        candidates: &[B::Node],
        title: &str,
    ) -> Result<Outcome<B::Node>> {
        let labels = candidates
            .iter()
            .map(|node| {
                let label = browser.label(node);
                validate_label(&label).map(|()| label)
            })
            .collect::<Result<Vec<_>>>()?;
        let containers: Vec<bool> = candidates.iter().map(|n| browser.is_container(n)).collect();

        let mut query = String::new();
        let mut cursor = Cursor::new();
        let mut previews: HashMap<usize, String> = HashMap::new();
        let mut status: Option<String> = None;

        loop {
            let matches = filter::filter(&labels, &query, self.options.ignore_case);
            let highlighted = cursor.pointed(matches.len());
            let pointed = highlighted.map(|i| matches[i]);

            if let Some(idx) = pointed {
                if !previews.contains_key(&idx) {
                    let text = browser
                        .preview(&candidates[idx])
                        .await
                        .unwrap_or_else(|e| {
                            tracing::debug!(label = %labels[idx], "preview failed: {e}");
                            format!("preview unavailable: {e}")
                        });
                    previews.insert(idx, text);
                }
            }

            let shown_status = status.take();
            let view = View {
                title,
                query: &query,
                items: matches
                    .iter()
                    .map(|&i| ViewItem {
                        label: &labels[i],
                        container: containers[i],
                    })
                    .collect(),
                highlighted,
                preview: pointed
                    .and_then(|idx| previews.get(&idx))
                    .map_or("", String::as_str),
                status: shown_status.as_deref(),
            };
            self.screen.draw(&view)?;

            let key = self.screen.next_key()?;
            let Some(action) = self.keymap.action(key) else {
                continue;
            };
            match action {
                Action::MoveUp => cursor.move_up(matches.len()),
                Action::MoveDown => cursor.move_down(matches.len()),
                Action::Insert(c) => query.push(c),
                Action::DeleteBack => {
                    query.pop();
                }
                Action::Confirm => {
                    return Ok(Outcome::Selected(pointed.map(|idx| candidates[idx].clone())));
                }
                Action::Back => return Ok(Outcome::Back),
                Action::Cancel => return Ok(Outcome::Cancelled),
                Action::CopyPath => {
                    if let Some(idx) = pointed {
                        let path = browser.path(&candidates[idx]);
                        let result = self
                            .clipboard
                            .set_text(&path)
                            .map(|()| format!("copied {path}"));
                        status = Some(report("copy", &path, result));
                    }
                }
                Action::Download => {
                    if let Some(idx) = pointed {
                        let path = browser.path(&candidates[idx]);
                        let dest = &self.options.download_dir;
                        let result = browser
                            .download(&candidates[idx], dest)
                            .await
                            .map(|()| format!("downloaded {path} to {}", dest.display()));
                        status = Some(report("download", &path, result));
                    }
                }
                Action::Refresh => {
                    if let Some(idx) = pointed {
                        let node = &candidates[idx];
                        let path = browser.path(node);
                        let result = if containers[idx] {
                            browser.children(node, true).await.map(|children| {
                                format!("refreshed {path} ({} entries)", children.len())
                            })
                        } else {
                            Ok(format!("{path} is not a container"))
                        };
                        previews.remove(&idx);
                        status = Some(report("refresh", &path, result));
                    }
                }
            }
        }
    }
}

fn report(what: &str, path: &str, result: Result<String>) -> String {
    result.unwrap_or_else(|e| {
        tracing::warn!(%path, "{what} failed: {e}");
        format!("{what} failed: {e}")
    })
}
