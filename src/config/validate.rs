// src/config/validate.rs

use std::path::Path;

use crate::config::model::{
    ChiselConfig, DEFAULT_APPS_DIR, DEFAULT_SENTINEL_PATH, RawConfigFile, normalize_rel,
};
use crate::errors::{ChiselError, Result};
use crate::fs::FileSystem;
use crate::watch::SourcePatterns;

/// Fallback compiler used when neither `compileCmd` nor a local install exists.
pub const GLOBAL_COMPILER: &str = "rbxtsc";
/// Flag appended to the derived compiler command.
pub const PROJECT_FLAG: &str = "-p tsconfig.json";

impl ChiselConfig {
    /// Validate a raw config and resolve it against the project root.
    ///
    /// The filesystem is consulted only to look for a locally installed
    /// compiler binary when `compileCmd` is not given.
    pub fn resolve(raw: RawConfigFile, root: &Path, fs: &dyn FileSystem) -> Result<Self> {
        validate_raw_config(&raw)?;
        let compile_cmd = resolve_compile_cmd(raw.compile_cmd.as_deref(), root, fs);
        Ok(ChiselConfig::new_unchecked(&raw, root, compile_cmd))
    }
}

pub fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    check_relative("appsDir", cfg.apps_dir.as_deref())?;
    check_relative("sentinelPath", cfg.sentinel_path.as_deref())?;
    check_relative("projectFile", cfg.project_file.as_deref())?;
    check_relative("outDir", cfg.out_dir.as_deref())?;

    if cfg.debounce_ms == Some(0) {
        return Err(ChiselError::Config(
            "debounceMs must be >= 1 (got 0)".to_string(),
        ));
    }

    check_sentinel_outside_sources(cfg)
}

/// The sentinel must not be a manifest input: its own rewrite would change
/// the manifest and it would never settle.
fn check_sentinel_outside_sources(cfg: &RawConfigFile) -> Result<()> {
    let apps_dir = normalize_rel(cfg.apps_dir.as_deref().unwrap_or(DEFAULT_APPS_DIR));
    let sentinel = normalize_rel(cfg.sentinel_path.as_deref().unwrap_or(DEFAULT_SENTINEL_PATH));
    let patterns = SourcePatterns::new(&apps_dir)?;

    if patterns.is_manifest_path(&sentinel) {
        return Err(ChiselError::Config(format!(
            "sentinelPath {sentinel:?} lies inside the sources it summarises; \
             move it out of {apps_dir}/*/server, {apps_dir}/*/shared and src/global/shared"
        )));
    }
    Ok(())
}

fn check_relative(key: &str, value: Option<&str>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if value.trim().is_empty() {
        return Err(ChiselError::Config(format!("{key} must not be empty")));
    }
    if Path::new(value).is_absolute() {
        return Err(ChiselError::Config(format!(
            "{key} must be relative to the project root (got {value:?})"
        )));
    }
    Ok(())
}

/// Pick the compiler command.
///
/// A non-blank configured command wins. Otherwise a compiler installed under
/// `node_modules/.bin` is preferred (quoted, since the root may contain
/// spaces), and the bare global binary is the last resort.
pub fn resolve_compile_cmd(configured: Option<&str>, root: &Path, fs: &dyn FileSystem) -> String {
    if let Some(cmd) = configured.map(str::trim).filter(|c| !c.is_empty()) {
        return cmd.to_string();
    }

    let bin_name = if cfg!(windows) {
        format!("{GLOBAL_COMPILER}.cmd")
    } else {
        GLOBAL_COMPILER.to_string()
    };
    let local = root.join("node_modules").join(".bin").join(bin_name);

    if fs.exists(&local) {
        format!("\"{}\" {PROJECT_FLAG}", local.display())
    } else {
        format!("{GLOBAL_COMPILER} {PROJECT_FLAG}")
    }
}
