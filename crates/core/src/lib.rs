//! pick-core: Core library for the s3pick terminal browser
//!
//! This crate provides the core functionality for s3pick, including:
//! - Configuration management
//! - Path parsing and resolution
//! - ObjectStore trait for the remote store
//! - The lazily loaded, on-disk cached remote tree
//! - The interactive selector and the traversal loop
//!
//! This crate is independent of any specific S3 SDK or terminal toolkit,
//! so everything here can be driven by mocks and scripted screens.

pub mod browse;
pub mod config;
pub mod error;
pub mod path;
pub mod preview;
pub mod select;
pub mod traits;
pub mod traverse;
pub mod tree;

#[cfg(test)]
mod testing;

pub use browse::{Browser, DirectBrowser, TreeBrowser};
pub use config::{Config, ConfigManager, Preferences};
pub use error::{Error, Result};
pub use path::{parse_path, RemotePath};
pub use select::{ClipboardSink, Key, Outcome, Screen, SelectOptions, Selector, View, ViewItem};
pub use traits::{Listing, Metadata, ObjectInfo, ObjectStore};
pub use traverse::{traverse, Finished, Level};
pub use tree::{NodeId, RemoteTree};
