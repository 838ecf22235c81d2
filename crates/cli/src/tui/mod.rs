//! Terminal front end of the selector

mod clipboard;
mod screen;

pub use clipboard::SystemClipboard;
pub use screen::{map_key, CrosstermScreen};
