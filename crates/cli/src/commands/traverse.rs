//! traverse command - Browse interactively and print the selected object
//!
//! Without a root, every bucket is offered through the cached tree. With a
//! root, the browser lists that bucket or prefix live on every visit.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use pick_core::{
    Browser, DirectBrowser, Error, Finished, Level, ObjectStore, Preferences, RemotePath,
    Result, SelectOptions, Selector, TreeBrowser, parse_path, traverse,
};
use pick_s3::{ClientOptions, S3Client};
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, ProgressBar};
use crate::tui::{CrosstermScreen, SystemClipboard};

/// Browse buckets or a bucket/prefix
#[derive(Args, Debug, Default)]
pub struct TraverseArgs {
    /// Start here instead of at the bucket list (s3://bucket/prefix or bucket/prefix)
    pub root: Option<String>,

    /// Neither restore nor save the tree cache
    #[arg(long)]
    pub no_cache: bool,
}

/// Output structure for a selection (JSON format)
#[derive(Debug, Serialize)]
struct Selection {
    path: String,
}

impl std::fmt::Display for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path)
    }
}

/// Execute the traverse command
pub async fn execute(args: TraverseArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config.clone());

    let root = match args.root.as_deref().map(parse_path).transpose() {
        Ok(root) => root,
        Err(e) => {
            formatter.error(&e.to_string());
            return ExitCode::UsageError;
        }
    };

    let prefs = match pick_core::ConfigManager::new().and_then(|manager| manager.load()) {
        Ok(config) => config.preferences,
        Err(e) => {
            formatter.error(&format!("Failed to load preferences: {e}"));
            return ExitCode::from_error(&e);
        }
    };

    let client = match S3Client::new(&ClientOptions::from(&prefs)).await {
        Ok(client) => client,
        Err(e) => {
            formatter.error(&format!("Failed to create S3 client: {e}"));
            return ExitCode::from_error(&e);
        }
    };
    let store: Arc<dyn ObjectStore> = Arc::new(client);

    let picked = match root {
        Some(path) => browse_from(path, store, &prefs).await,
        None => browse_buckets(store, &prefs, args.no_cache, &formatter, &output_config).await,
    };

    match picked {
        Ok(Some(path)) => {
            formatter.result(&Selection { path });
            ExitCode::Success
        }
        Ok(None) => {
            tracing::debug!("browse cancelled");
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&e.to_string());
            ExitCode::from_error(&e)
        }
    }
}

/// Cached tree mode, starting at the bucket list
async fn browse_buckets(
    store: Arc<dyn ObjectStore>,
    prefs: &Preferences,
    no_cache: bool,
    formatter: &Formatter,
    output_config: &OutputConfig,
) -> Result<Option<String>> {
    let cache_dir: Option<PathBuf> = if no_cache {
        None
    } else {
        Some(prefs.cache_dir()?)
    };

    let spinner = ProgressBar::spinner(output_config, "Listing buckets...");
    let opened = TreeBrowser::open(store, cache_dir.as_deref(), prefs.preview_lines).await;
    spinner.finish_and_clear();
    let mut browser = opened?;

    let finished = run(&mut browser, Level::Roots, prefs).await;

    if let Some(dir) = &cache_dir {
        match browser.save_all(dir) {
            Ok(written) => tracing::debug!(dir = %dir.display(), written, "saved tree cache"),
            Err(e) => formatter.warning(&format!("Failed to save tree cache: {e}")),
        }
    }

    Ok(match finished? {
        Finished::Leaf(node) => Some(browser.path(&node)),
        Finished::Cancelled => None,
    })
}

/// Direct mode, starting at a user-supplied bucket or prefix
async fn browse_from(
    path: RemotePath,
    store: Arc<dyn ObjectStore>,
    prefs: &Preferences,
) -> Result<Option<String>> {
    if !store.exists(&path).await? {
        return Err(Error::NotFound(path.to_full_path()));
    }
    if !path.is_dir && !store.is_container(&path).await? {
        // already an object: nothing to pick
        return Ok(Some(path.to_full_path()));
    }

    let mut browser = DirectBrowser::new(store, prefs.preview_lines);
    let finished = run(&mut browser, Level::Inside(path.into_dir()), prefs).await?;
    Ok(match finished {
        Finished::Leaf(node) => Some(browser.path(&node)),
        Finished::Cancelled => None,
    })
}

/// Run the traversal on the terminal; the screen is restored before returning
async fn run<B: Browser>(
    browser: &mut B,
    start: Level<B::Node>,
    prefs: &Preferences,
) -> Result<Finished<B::Node>> {
    let screen = CrosstermScreen::open()?;
    let mut selector = Selector::new(screen, SystemClipboard::new(), SelectOptions::from(prefs));
    traverse(browser, &mut selector, start).await
}
