// src/watch/session.rs

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::info;

use crate::config::ChiselConfig;
use crate::engine::{PassRunner, Pipeline, PipelineCore, PipelineOptions, PipelineStats};
use crate::errors::Result;
use crate::exec::CompilerBackend;
use crate::fs::FileSystem;
use crate::project::ProjectPublisher;
use crate::types::ChangeEvent;
use crate::watch::patterns::SourcePatterns;
use crate::watch::watcher::ChangeSource;

/// Capacity of the channel between a change source and the pipeline.
pub const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// Top-level entry for both one-shot and watch mode.
pub struct WatchSession<C: CompilerBackend> {
    runner: PassRunner<C>,
    patterns: SourcePatterns,
    options: PipelineOptions,
}

impl<C: CompilerBackend> std::fmt::Debug for WatchSession<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchSession")
            .field("runner", &self.runner)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<C: CompilerBackend> WatchSession<C> {
    pub fn new(
        cfg: Arc<ChiselConfig>,
        fs: Arc<dyn FileSystem>,
        publisher: Arc<dyn ProjectPublisher>,
        compiler: C,
    ) -> Result<Self> {
        let patterns = SourcePatterns::from_config(&cfg)?;
        let options = PipelineOptions {
            debounce: cfg.debounce,
            requeue_delay: cfg.requeue_delay,
        };
        Ok(Self {
            runner: PassRunner::new(cfg, fs, publisher, compiler),
            patterns,
            options,
        })
    }

    /// One unconditional pass with regeneration. Returns the compiler's exit
    /// code; a stage error is returned as `Err`.
    pub async fn run_once(&self) -> Result<i32> {
        let report = self.runner.run(true).await?;
        Ok(report.outcome.exit_code())
    }

    /// Start `source`, run the initial pass, then serve changes until
    /// `shutdown` resolves. The source is stopped before returning.
    pub async fn run_watch<F>(
        self,
        source: &mut dyn ChangeSource,
        shutdown: F,
    ) -> Result<PipelineStats>
    where
        F: Future<Output = ()>,
    {
        let (tx, rx) = mpsc::channel::<ChangeEvent>(CHANGE_CHANNEL_CAPACITY);
        source.start(tx)?;
        info!(
            debounce_ms = self.options.debounce.as_millis() as u64,
            "watching for changes"
        );

        let pipeline = Pipeline::new(
            PipelineCore::new(self.options),
            self.runner,
            self.patterns,
            rx,
        );
        let result = pipeline.run(shutdown).await;
        source.stop();
        result
    }
}
