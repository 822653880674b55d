use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// Source text we hand to the migration agent for one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSnapshot {
    pub path: String,
    pub bytes: usize,
    pub truncated: bool,
    pub content: String,
}

/// True when `rel` resolves (symlinks included) to a path inside `root`.
fn is_within_root(root: &Path, rel: &str) -> bool {
    let Ok(abs_root) = fs::canonicalize(root) else {
        return false;
    };
    match fs::canonicalize(root.join(rel)) {
        Ok(abs) => abs.starts_with(&abs_root),
        Err(_) => false,
    }
}

/// Read the first `max_bytes` of `rel` under `root`. Missing or unreadable
/// files, and paths resolving outside `root`, yield `None`; the agent then
/// works from the path alone.
pub fn read_source(root: &Path, rel: &str, max_bytes: usize) -> Option<SourceSnapshot> {
    let abs = root.join(rel);
    if !abs.is_file() {
        return None;
    }
    if !is_within_root(root, rel) {
        warn!(root = %root.display(), path = rel, "source path escapes project root, not read");
        return None;
    }
    let (content, bytes, truncated) = read_prefix(&abs, max_bytes).ok()?;
    Some(SourceSnapshot { path: rel.to_string(), bytes, truncated, content })
}

fn read_prefix(path: &Path, max_bytes: usize) -> anyhow::Result<(String, usize, bool)> {
    let data = fs::read(path)?;
    let bytes = data.len();
    let truncated = bytes > max_bytes;
    let slice = if truncated { &data[..max_bytes] } else { &data[..] };
    let content = String::from_utf8_lossy(slice).into_owned();
    Ok((content, bytes, truncated))
}
