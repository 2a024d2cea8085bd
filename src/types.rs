// src/types.rs

//! Small value types shared between the watcher and the pipeline.

use std::fmt;

/// What happened to a watched file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChangeKind::Added => "added",
            ChangeKind::Modified => "modified",
            ChangeKind::Removed => "removed",
        };
        f.write_str(s)
    }
}

/// One settled filesystem change, as delivered to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    /// Path relative to the project root, forward slashes.
    pub path: String,
}

impl ChangeEvent {
    pub fn new(kind: ChangeKind, path: impl Into<String>) -> Self {
        let path: String = path.into();
        Self {
            kind,
            path: path.replace('\\', "/"),
        }
    }

    pub fn modified(path: impl Into<String>) -> Self {
        Self::new(ChangeKind::Modified, path)
    }
}
