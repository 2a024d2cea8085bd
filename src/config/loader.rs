// src/config/loader.rs

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::model::{ChiselConfig, RawConfigFile};
use crate::errors::{ChiselError, Result};
use crate::fs::FileSystem;

/// Default config file name, looked up in the project root.
pub const DEFAULT_CONFIG_FILE: &str = "chisel.config.json";

/// Load the raw config from `path`.
///
/// A missing file is a valid state and yields [`RawConfigFile::default`].
/// Anything else that goes wrong (unreadable file, malformed JSON, unknown
/// keys) is an error.
pub fn load_from_path(fs: &dyn FileSystem, path: &Path) -> Result<RawConfigFile> {
    if !fs.exists(path) {
        debug!(?path, "no config file found; using defaults");
        return Ok(RawConfigFile::default());
    }

    let contents = fs.read_to_string(path)?;
    let config: RawConfigFile = serde_json::from_str(&contents).map_err(|e| {
        ChiselError::Config(format!("parsing JSON config from {:?}: {e}", path))
    })?;

    Ok(config)
}

/// Load, validate and resolve the config for the project at `root`.
///
/// `config_path` is interpreted relative to `root` unless it is absolute.
/// This runs once at startup; errors here are fatal.
pub fn load_and_validate(
    fs: &dyn FileSystem,
    root: &Path,
    config_path: &Path,
) -> Result<ChiselConfig> {
    let path = resolve_config_path(root, config_path);
    let raw = load_from_path(fs, &path)?;
    let cfg = ChiselConfig::resolve(raw, root, fs)?;
    info!(apps_dir = %cfg.apps_dir_rel, compile_cmd = %cfg.compile_cmd, "configuration loaded");
    Ok(cfg)
}

fn resolve_config_path(root: &Path, config_path: &Path) -> PathBuf {
    if config_path.is_absolute() {
        config_path.to_path_buf()
    } else {
        root.join(config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn missing_file_yields_defaults() {
        let fs = MockFileSystem::new();
        let cfg = load_and_validate(&fs, Path::new("/game"), Path::new(DEFAULT_CONFIG_FILE))
            .unwrap();
        assert_eq!(cfg.apps_dir_rel, "src/apps");
        assert_eq!(
            cfg.sentinel_path,
            PathBuf::from("/game/src/chisel/__generated__/manifest-hash.ts")
        );
        assert_eq!(cfg.compile_cmd, "rbxtsc -p tsconfig.json");
    }

    #[test]
    fn keys_are_camel_case() {
        let fs = MockFileSystem::new();
        fs.add_file(
            "/game/chisel.config.json",
            r#"{ "appsDir": "game/apps", "compileCmd": "exit 3", "debounceMs": 10 }"#,
        );
        let cfg = load_and_validate(&fs, Path::new("/game"), Path::new(DEFAULT_CONFIG_FILE))
            .unwrap();
        assert_eq!(cfg.apps_dir, PathBuf::from("/game/game/apps"));
        assert_eq!(cfg.compile_cmd, "exit 3");
        assert_eq!(cfg.debounce.as_millis(), 10);
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let fs = MockFileSystem::new();
        fs.add_file("/game/chisel.config.json", "{ appsDir: ");
        let err = load_and_validate(&fs, Path::new("/game"), Path::new(DEFAULT_CONFIG_FILE))
            .unwrap_err();
        assert!(matches!(err, ChiselError::Config(msg) if msg.contains("parsing JSON")));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let fs = MockFileSystem::new();
        fs.add_file("/game/chisel.config.json", r#"{ "appDir": "src/apps" }"#);
        assert!(
            load_and_validate(&fs, Path::new("/game"), Path::new(DEFAULT_CONFIG_FILE)).is_err()
        );
    }
}
