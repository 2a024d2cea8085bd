// src/config/model.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_APPS_DIR: &str = "src/apps";
pub const DEFAULT_SENTINEL_PATH: &str = "src/chisel/__generated__/manifest-hash.ts";
pub const DEFAULT_PROJECT_FILE: &str = "default.project.json";
pub const DEFAULT_OUT_DIR: &str = "out";
pub const DEFAULT_DEBOUNCE_MS: u64 = 80;
pub const DEFAULT_REQUEUE_DELAY_MS: u64 = 50;
pub const DEFAULT_SETTLE_MS: u64 = 50;

/// Configuration exactly as read from `chisel.config.json`.
///
/// ```json
/// {
///   "appsDir": "src/apps",
///   "sentinelPath": "src/chisel/__generated__/manifest-hash.ts",
///   "compileCmd": "rbxtsc -p tsconfig.json"
/// }
/// ```
///
/// Every key is optional. Defaults are applied when the raw file is resolved
/// into a [`ChiselConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RawConfigFile {
    /// Root containing one directory per application.
    #[serde(default)]
    pub apps_dir: Option<String>,

    /// Output path of the generated change-sentinel module.
    #[serde(default)]
    pub sentinel_path: Option<String>,

    /// Shell command used to run the compiler. Blank means "derive a default".
    #[serde(default)]
    pub compile_cmd: Option<String>,

    /// Project descriptor written on every pass.
    #[serde(default)]
    pub project_file: Option<String>,

    /// `name` field of the project descriptor.
    #[serde(default)]
    pub project_name: Option<String>,

    /// Compiler output root referenced from the descriptor.
    #[serde(default)]
    pub out_dir: Option<String>,

    #[serde(default)]
    pub debounce_ms: Option<u64>,

    #[serde(default)]
    pub requeue_delay_ms: Option<u64>,

    #[serde(default)]
    pub settle_ms: Option<u64>,
}

/// Resolved, immutable configuration handed to every component.
///
/// All paths are absolute (joined onto `root`); the `*_rel` strings keep the
/// forward-slash relative form used for glob matching and descriptor output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChiselConfig {
    pub root: PathBuf,
    pub apps_dir: PathBuf,
    pub apps_dir_rel: String,
    pub sentinel_path: PathBuf,
    pub compile_cmd: String,
    pub project_file: PathBuf,
    pub project_name: String,
    pub out_dir_rel: String,
    pub debounce: Duration,
    pub requeue_delay: Duration,
    pub settle: Duration,
}

impl ChiselConfig {
    /// Build a config from already-validated pieces. `compile_cmd` must be the
    /// final command string; see [`crate::config::resolve_compile_cmd`].
    pub fn new_unchecked(raw: &RawConfigFile, root: &Path, compile_cmd: String) -> Self {
        let apps_dir_rel = normalize_rel(raw.apps_dir.as_deref().unwrap_or(DEFAULT_APPS_DIR));
        let sentinel_rel = raw
            .sentinel_path
            .as_deref()
            .unwrap_or(DEFAULT_SENTINEL_PATH);
        let project_rel = raw.project_file.as_deref().unwrap_or(DEFAULT_PROJECT_FILE);
        let out_dir_rel = normalize_rel(raw.out_dir.as_deref().unwrap_or(DEFAULT_OUT_DIR));

        let project_name = raw
            .project_name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| default_project_name(root));

        Self {
            root: root.to_path_buf(),
            apps_dir: root.join(&apps_dir_rel),
            apps_dir_rel,
            sentinel_path: root.join(sentinel_rel),
            compile_cmd,
            project_file: root.join(project_rel),
            project_name,
            out_dir_rel,
            debounce: Duration::from_millis(raw.debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS)),
            requeue_delay: Duration::from_millis(
                raw.requeue_delay_ms.unwrap_or(DEFAULT_REQUEUE_DELAY_MS),
            ),
            settle: Duration::from_millis(raw.settle_ms.unwrap_or(DEFAULT_SETTLE_MS)),
        }
    }
}

/// Forward slashes, no leading `./`, no trailing `/`.
pub(crate) fn normalize_rel(s: &str) -> String {
    let s = s.trim().replace('\\', "/");
    let s = s.strip_prefix("./").unwrap_or(&s);
    s.trim_end_matches('/').to_string()
}

fn default_project_name(root: &Path) -> String {
    root.file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .map(|n| n.to_string())
        .unwrap_or_else(|| "project".to_string())
}
