//! Preview text for the pointed candidate

use crate::traits::Metadata;

/// Maximum number of children listed in a container preview
pub const CONTAINER_PREVIEW_LIMIT: usize = 10;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Leaf preview: timestamps, size and type, then the first `lines` lines of content
pub fn leaf(name: &str, meta: &Metadata, head: &[u8], lines: usize) -> String {
    let stamp = |ts: Option<jiff::Timestamp>| {
        ts.map(|t| t.strftime(TIMESTAMP_FORMAT).to_string())
            .unwrap_or_else(|| "-".to_string())
    };
    let size = meta
        .size
        .map(|s| humansize::format_size(s, humansize::BINARY))
        .unwrap_or_else(|| "-".to_string());
    let content_type = mime_guess::from_path(name)
        .first()
        .map(|m| m.essence_str().to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string());

    let mut out = format!(
        "created: {}\nupdated: {}\nsize:    {size}\ntype:    {content_type}",
        stamp(meta.created),
        stamp(meta.updated),
    );
    let content = String::from_utf8_lossy(head);
    let body: Vec<&str> = content.lines().take(lines).collect();
    if !body.is_empty() {
        out.push_str("\n\n");
        out.push_str(&body.join("\n"));
    }
    out
}

/// Container preview: up to [`CONTAINER_PREVIEW_LIMIT`] child names, one per line
pub fn container<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    names
        .into_iter()
        .take(CONTAINER_PREVIEW_LIMIT)
        .collect::<Vec<_>>()
        .join("\n")
}
