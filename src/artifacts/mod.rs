// src/artifacts/mod.rs

//! Derived artifact generation.
//!
//! Every artifact is written through [`write_if_changed`]. The watcher also
//! sees the generated files, so an unconditional write would re-trigger the
//! pipeline forever; comparing content first is what breaks that loop.

pub mod sentinel;
pub mod stubs;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::ChiselConfig;
use crate::errors::{ChiselError, Result};
use crate::fs::FileSystem;
use crate::manifest::Manifest;

pub use sentinel::{manifest_hash, render_sentinel};
pub use stubs::{CLIENT_STUB_REL, client_stub_path, render_client_stub};

/// Files touched (or left alone) by one generation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    pub written: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
}

impl GenerationReport {
    fn record(&mut self, path: PathBuf, written: bool) {
        if written {
            self.written.push(path);
        } else {
            self.unchanged.push(path);
        }
    }
}

/// Write `content` to `path` unless the file already holds exactly these bytes.
///
/// Returns whether a write happened. Missing parent directories are created
/// by the filesystem; any failure fails the whole call.
pub fn write_if_changed(fs: &dyn FileSystem, path: &Path, content: &str) -> Result<bool> {
    if fs.is_file(path) {
        if let Ok(existing) = fs.read(path) {
            if existing == content.as_bytes() {
                return Ok(false);
            }
        }
    }

    fs.write(path, content.as_bytes())
        .map_err(|source| ChiselError::ArtifactWrite {
            path: path.to_path_buf(),
            source,
        })?;
    debug!(?path, "wrote generated file");
    Ok(true)
}

/// Writes client stubs and the sentinel module for a manifest.
#[derive(Debug, Clone)]
pub struct ArtifactGenerator {
    fs: Arc<dyn FileSystem>,
    apps_dir: PathBuf,
    sentinel_path: PathBuf,
}

impl ArtifactGenerator {
    pub fn new(fs: Arc<dyn FileSystem>, apps_dir: PathBuf, sentinel_path: PathBuf) -> Self {
        Self {
            fs,
            apps_dir,
            sentinel_path,
        }
    }

    pub fn from_config(fs: Arc<dyn FileSystem>, cfg: &ChiselConfig) -> Self {
        Self::new(fs, cfg.apps_dir.clone(), cfg.sentinel_path.clone())
    }

    pub fn generate(&self, manifest: &Manifest) -> Result<GenerationReport> {
        let mut report = GenerationReport::default();

        for app in &manifest.applications {
            let path = client_stub_path(&self.apps_dir, app);
            let written = write_if_changed(self.fs.as_ref(), &path, &render_client_stub(app))?;
            report.record(path, written);
        }

        let sentinel = render_sentinel(manifest)?;
        let written = write_if_changed(self.fs.as_ref(), &self.sentinel_path, &sentinel)?;
        report.record(self.sentinel_path.clone(), written);

        info!(
            written = report.written.len(),
            unchanged = report.unchanged.len(),
            "derived artifacts generated"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;
    use crate::manifest::build_manifest;

    fn generator(fs: &MockFileSystem) -> ArtifactGenerator {
        ArtifactGenerator::new(
            Arc::new(fs.clone()),
            PathBuf::from("/p/src/apps"),
            PathBuf::from("/p/src/chisel/__generated__/manifest-hash.ts"),
        )
    }

    #[test]
    fn write_if_changed_skips_identical_content() {
        let fs = MockFileSystem::new();
        let path = Path::new("/p/out/a.ts");

        assert!(write_if_changed(&fs, path, "x").unwrap());
        assert!(!write_if_changed(&fs, path, "x").unwrap());
        assert!(write_if_changed(&fs, path, "y").unwrap());
        assert_eq!(fs.write_count(), 2);
    }

    #[test]
    fn second_generation_with_same_manifest_writes_nothing() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/src/apps/alpha/shared/a.ts", "a");
        let generator = generator(&fs);
        let manifest =
            build_manifest(&fs, Path::new("/p"), Path::new("/p/src/apps")).unwrap();

        let first = generator.generate(&manifest).unwrap();
        assert_eq!(first.written.len(), 2);

        fs.clear_writes();
        let second = generator.generate(&manifest).unwrap();
        assert!(second.written.is_empty());
        assert_eq!(second.unchanged.len(), 2);
        assert_eq!(fs.write_count(), 0);
    }

    #[test]
    fn touching_a_source_rewrites_only_the_sentinel() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/src/apps/alpha/shared/a.ts", "a");
        let generator = generator(&fs);
        let m1 = build_manifest(&fs, Path::new("/p"), Path::new("/p/src/apps")).unwrap();
        generator.generate(&m1).unwrap();

        fs.touch("/p/src/apps/alpha/shared/a.ts");
        let m2 = build_manifest(&fs, Path::new("/p"), Path::new("/p/src/apps")).unwrap();
        let report = generator.generate(&m2).unwrap();

        assert_eq!(
            report.written,
            vec![PathBuf::from("/p/src/chisel/__generated__/manifest-hash.ts")]
        );
    }

    #[test]
    fn unwritable_target_fails_the_pass() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/src/apps/alpha/shared/a.ts", "a");
        fs.set_read_only("/p/src/apps/alpha/client");
        let generator = generator(&fs);
        let m = build_manifest(&fs, Path::new("/p"), Path::new("/p/src/apps")).unwrap();

        let err = generator.generate(&m).unwrap_err();
        assert!(matches!(err, ChiselError::ArtifactWrite { .. }));
    }
}
