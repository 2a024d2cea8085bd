// src/watch/path_utils.rs

use std::path::Path;

/// `path` relative to `root` with forward slashes, or `None` if it lies
/// outside the root.
///
/// Falls back to comparing canonical forms, since notify may report paths
/// through a different prefix than the one we watched (e.g. `/private/var`
/// on macOS). A removed file cannot be canonicalized, so its parent is tried.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(to_forward_slashes(rel));
    }

    let root_canon = root.canonicalize().ok()?;
    if let Ok(path_canon) = path.canonicalize() {
        return path_canon
            .strip_prefix(&root_canon)
            .ok()
            .map(to_forward_slashes);
    }

    let parent = path.parent()?.canonicalize().ok()?;
    let rel = parent.strip_prefix(&root_canon).ok()?.join(path.file_name()?);
    Some(to_forward_slashes(&rel))
}

fn to_forward_slashes(rel: &Path) -> String {
    rel.to_string_lossy().replace('\\', "/")
}
