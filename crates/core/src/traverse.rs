//! Drill-down walk over repeated selection rounds

use crate::browse::Browser;
use crate::error::Result;
use crate::select::{ClipboardSink, Outcome, Screen, Selector};

/// Title of the top-level round
pub const ROOTS_TITLE: &str = "buckets";

/// The level whose children are offered in a round
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Level<N> {
    /// Top-level containers
    Roots,
    /// Children of a container
    Inside(N),
}

/// How a traversal ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finished<N> {
    Leaf(N),
    Cancelled,
}

/// Run rounds from `start` until a leaf is confirmed or the user cancels
///
/// Confirming a container descends into it, confirming nothing repeats the
/// level, and going back moves to the parent's level (or stays at the roots).
/// Remote failures while listing a level end the walk with an error.
pub async fn traverse<B, S, C>(
    browser: &mut B,
    selector: &mut Selector<S, C>,
    start: Level<B::Node>,
) -> Result<Finished<B::Node>>
where
    B: Browser,
    S: Screen,
    C: ClipboardSink,
{
    let mut level = start;
    loop {
        let (candidates, title) = match &level {
            Level::Roots => (browser.roots().await?, ROOTS_TITLE.to_string()),
            Level::Inside(node) => (browser.children(node, false).await?, browser.path(node)),
        };
        tracing::debug!(level = %title, candidates = candidates.len(), "starting round");

        level = match selector.select(browser, &candidates, &title).await? {
            Outcome::Selected(None) => level,
            Outcome::Selected(Some(node)) if browser.is_container(&node) => Level::Inside(node),
            Outcome::Selected(Some(node)) => return Ok(Finished::Leaf(node)),
            Outcome::Back => match level {
                Level::Inside(node) => browser.parent(&node).map_or(Level::Roots, Level::Inside),
                Level::Roots => Level::Roots,
            },
            Outcome::Cancelled => return Ok(Finished::Cancelled),
        };
    }
}
