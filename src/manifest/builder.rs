// src/manifest/builder.rs

use std::path::Path;
use std::time::UNIX_EPOCH;

use tracing::debug;

use crate::errors::Result;
use crate::fs::FileSystem;
use crate::manifest::{Manifest, WatchedFile};

/// Per-application sub-directories whose files feed the manifest.
pub const WATCHED_SUBDIRS: [&str; 2] = ["server", "shared"];

/// File suffixes counted as source: `.ts`, `.tsx` and `.d.ts`.
const SOURCE_SUFFIXES: [&str; 3] = [".d.ts", ".tsx", ".ts"];

pub fn is_source_file(name: &str) -> bool {
    SOURCE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

/// List application directory names below `apps_dir`, sorted.
///
/// A missing `apps_dir` is a normal state for a project with no apps yet and
/// yields an empty list.
pub fn list_applications(fs: &dyn FileSystem, apps_dir: &Path) -> Result<Vec<String>> {
    if !fs.is_dir(apps_dir) {
        debug!(?apps_dir, "apps dir does not exist; no applications");
        return Ok(Vec::new());
    }

    let mut apps: Vec<String> = fs
        .read_dir(apps_dir)?
        .into_iter()
        .filter(|p| fs.is_dir(p))
        .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_string))
        .collect();
    apps.sort();
    Ok(apps)
}

/// Walk every application's watched sub-directories and fingerprint the
/// source files found there.
///
/// Traversal is sorted at every level, so the same tree always produces the
/// same entry order. `root` is only used to relativize entry paths.
pub fn build_manifest(fs: &dyn FileSystem, root: &Path, apps_dir: &Path) -> Result<Manifest> {
    let applications = list_applications(fs, apps_dir)?;
    let mut entries = Vec::new();

    for app in &applications {
        for sub in WATCHED_SUBDIRS {
            walk(fs, root, &apps_dir.join(app).join(sub), &mut entries)?;
        }
    }

    debug!(
        apps = applications.len(),
        files = entries.len(),
        "manifest built"
    );

    Ok(Manifest {
        applications,
        entries,
    })
}

fn walk(fs: &dyn FileSystem, root: &Path, dir: &Path, out: &mut Vec<WatchedFile>) -> Result<()> {
    if !fs.is_dir(dir) {
        return Ok(());
    }

    let mut children = fs.read_dir(dir)?;
    children.sort();

    for child in children {
        if fs.is_dir(&child) {
            walk(fs, root, &child, out)?;
            continue;
        }

        let is_source = child
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(is_source_file);
        if !is_source {
            continue;
        }

        let modified = match fs.modified(&child) {
            Ok(t) => t,
            // Removed between listing and stat: treat like it was never there.
            Err(_) if !fs.exists(&child) => continue,
            Err(e) => return Err(e.into()),
        };
        let last_modified = modified
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);

        out.push(WatchedFile {
            relative_path: relative_display(root, &child),
            last_modified,
        });
    }

    Ok(())
}

fn relative_display(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}
