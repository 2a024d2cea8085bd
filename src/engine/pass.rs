// src/engine/pass.rs

//! One pipeline pass: optionally regenerate artifacts, publish the
//! descriptor, then compile.

use std::sync::Arc;

use tracing::{info, warn};

use crate::artifacts::{ArtifactGenerator, GenerationReport};
use crate::config::ChiselConfig;
use crate::errors::Result;
use crate::exec::{CompileOutcome, CompilerBackend};
use crate::fs::FileSystem;
use crate::manifest::build_manifest;
use crate::project::ProjectPublisher;

/// What a completed pass did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    pub descriptor_changed: bool,
    /// `None` when regeneration was skipped.
    pub generation: Option<GenerationReport>,
    pub outcome: CompileOutcome,
}

pub struct PassRunner<C: CompilerBackend> {
    cfg: Arc<ChiselConfig>,
    fs: Arc<dyn FileSystem>,
    generator: ArtifactGenerator,
    publisher: Arc<dyn ProjectPublisher>,
    compiler: C,
}

impl<C: CompilerBackend> std::fmt::Debug for PassRunner<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PassRunner")
            .field("root", &self.cfg.root)
            .field("compile_cmd", &self.cfg.compile_cmd)
            .finish_non_exhaustive()
    }
}

impl<C: CompilerBackend> PassRunner<C> {
    pub fn new(
        cfg: Arc<ChiselConfig>,
        fs: Arc<dyn FileSystem>,
        publisher: Arc<dyn ProjectPublisher>,
        compiler: C,
    ) -> Self {
        let generator = ArtifactGenerator::from_config(fs.clone(), &cfg);
        Self {
            cfg,
            fs,
            generator,
            publisher,
            compiler,
        }
    }

    /// Run the three stages in order. A failing stage aborts the pass and
    /// later stages do not run. A non-zero compiler exit is not an error.
    ///
    /// The descriptor is published after generation: stub generation can
    /// create an app's `client/` directory, which the descriptor maps.
    pub async fn run(&self, regenerate: bool) -> Result<PassReport> {
        let generation = if regenerate {
            let manifest = build_manifest(self.fs.as_ref(), &self.cfg.root, &self.cfg.apps_dir)?;
            let report = self.generator.generate(&manifest)?;
            info!(
                apps = manifest.applications.len(),
                files = manifest.entries.len(),
                written = report.written.len(),
                "regenerated artifacts"
            );
            Some(report)
        } else {
            None
        };

        let descriptor_changed = self.publisher.publish()?;

        let outcome = self.compiler.compile(&self.cfg.compile_cmd).await?;
        if outcome.is_success() {
            info!("compile succeeded");
        } else {
            warn!(?outcome, exit_code = outcome.exit_code(), "compile failed");
        }

        Ok(PassReport {
            descriptor_changed,
            generation,
            outcome,
        })
    }
}
