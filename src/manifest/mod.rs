// src/manifest/mod.rs

//! Fingerprint of the watched source files.
//!
//! A [`Manifest`] is rebuilt from scratch on every pipeline pass and then
//! handed to the artifact generator. Nothing compares two manifests directly:
//! the generator only writes what differs byte-for-byte on disk.

pub mod builder;

use serde::Serialize;

pub use builder::{WATCHED_SUBDIRS, build_manifest, is_source_file, list_applications};

/// A single watched source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchedFile {
    /// Path relative to the project root, forward slashes.
    pub relative_path: String,
    /// Modification time in milliseconds since the Unix epoch.
    pub last_modified: u128,
}

/// Ordered snapshot of applications and their watched files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Manifest {
    pub applications: Vec<String>,
    pub entries: Vec<WatchedFile>,
}

impl Manifest {
    pub fn is_empty(&self) -> bool {
        self.applications.is_empty() && self.entries.is_empty()
    }
}
