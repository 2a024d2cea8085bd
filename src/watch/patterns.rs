// src/watch/patterns.rs

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::config::ChiselConfig;

/// Source files the watcher reports.
pub const WATCHED_GLOBS: &[&str] = &["src/**/*.ts", "src/**/*.tsx"];

/// Build output and dependency trees that are never reported.
pub const IGNORED_GLOBS: &[&str] = &["out/**", "lib/**", "dist/**", "node_modules/**"];

/// Shared sources outside any application that still feed the manifest.
pub const GLOBAL_SHARED_GLOB: &str = "src/global/shared/**/*.{ts,tsx}";

/// Compiled path classification for one project.
///
/// All inputs are root-relative paths with forward slashes. `*` never
/// crosses a `/`; `**` does.
#[derive(Debug, Clone)]
pub struct SourcePatterns {
    watched: GlobSet,
    ignored: GlobSet,
    manifest: GlobSet,
}

impl SourcePatterns {
    /// Compile the pattern sets for an applications root such as `src/apps`.
    pub fn new(apps_dir_rel: &str) -> Result<Self> {
        let apps = apps_dir_rel.trim_end_matches('/');
        let manifest_globs = [
            format!("{apps}/*/server/**/*.{{ts,tsx}}"),
            format!("{apps}/*/shared/**/*.{{ts,tsx}}"),
            GLOBAL_SHARED_GLOB.to_string(),
        ];

        Ok(Self {
            watched: build_globset(WATCHED_GLOBS.iter().copied())?,
            ignored: build_globset(IGNORED_GLOBS.iter().copied())?,
            manifest: build_globset(manifest_globs.iter().map(String::as_str))?,
        })
    }

    pub fn from_config(cfg: &ChiselConfig) -> Result<Self> {
        Self::new(&cfg.apps_dir_rel)
    }

    /// Whether a change to `rel` should reach the pipeline at all.
    pub fn is_watched(&self, rel: &str) -> bool {
        self.watched.is_match(rel) && !self.ignored.is_match(rel)
    }

    /// Whether a change to `rel` can alter the manifest.
    pub fn is_manifest_path(&self, rel: &str) -> bool {
        self.manifest.is_match(rel)
    }
}

fn build_globset<'a>(patterns: impl IntoIterator<Item = &'a str>) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .with_context(|| format!("invalid glob pattern: {pattern}"))?;
        builder.add(glob);
    }
    builder.build().context("building globset")
}
