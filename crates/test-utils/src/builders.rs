#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chisel::config::{ChiselConfig, RawConfigFile};
use tempfile::TempDir;

/// Builder for `ChiselConfig` to simplify test setup.
///
/// The compile command defaults to `true` so nothing real is spawned unless a
/// test asks for it.
pub struct ConfigBuilder {
    raw: RawConfigFile,
    compile_cmd: String,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            raw: RawConfigFile::default(),
            compile_cmd: "true".to_string(),
        }
    }

    pub fn compile_cmd(mut self, cmd: &str) -> Self {
        self.compile_cmd = cmd.to_string();
        self
    }

    pub fn apps_dir(mut self, rel: &str) -> Self {
        self.raw.apps_dir = Some(rel.to_string());
        self
    }

    pub fn project_name(mut self, name: &str) -> Self {
        self.raw.project_name = Some(name.to_string());
        self
    }

    pub fn debounce_ms(mut self, ms: u64) -> Self {
        self.raw.debounce_ms = Some(ms);
        self
    }

    pub fn requeue_delay_ms(mut self, ms: u64) -> Self {
        self.raw.requeue_delay_ms = Some(ms);
        self
    }

    pub fn raw(&self) -> &RawConfigFile {
        &self.raw
    }

    pub fn build(self, root: &Path) -> ChiselConfig {
        ChiselConfig::new_unchecked(&self.raw, root, self.compile_cmd)
    }

    pub fn build_arc(self, root: &Path) -> Arc<ChiselConfig> {
        Arc::new(self.build(root))
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A throwaway project on the real filesystem.
///
/// ```ignore
/// let tree = ProjectTree::new()
///     .app("alpha", &["shared"])
///     .file("src/apps/alpha/shared/util.ts", "export {};");
/// ```
pub struct ProjectTree {
    dir: TempDir,
    apps_dir: String,
}

impl ProjectTree {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp project dir"),
            apps_dir: "src/apps".to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// Create `<apps>/<name>/<sub>/` for each sub, each holding an `index.ts`.
    pub fn app(self, name: &str, subdirs: &[&str]) -> Self {
        let mut tree = self;
        for sub in subdirs {
            let rel = format!("{}/{name}/{sub}/index.ts", tree.apps_dir);
            tree = tree.file(&rel, &format!("export const {sub} = \"{name}\";\n"));
        }
        tree
    }

    pub fn file(self, rel: &str, content: &str) -> Self {
        self.write(rel, content);
        self
    }

    pub fn write(&self, rel: &str, content: &str) {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, content).expect("write project file");
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path(rel)).expect("read project file")
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.path(rel).exists()
    }
}

impl Default for ProjectTree {
    fn default() -> Self {
        Self::new()
    }
}
