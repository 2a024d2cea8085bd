// src/engine/runtime.rs

use std::collections::VecDeque;
use std::fmt;
use std::future::Future;

use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, error, info};

use crate::errors::Result;
use crate::exec::{CompileOutcome, CompilerBackend};
use crate::types::ChangeEvent;
use crate::watch::SourcePatterns;

use super::core::{PipelineCommand, PipelineCore, PipelineInput};
use super::pass::PassRunner;

/// Totals for one watch session, returned when the loop exits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub passes: u64,
    /// Passes aborted by a stage error (not compiler failures).
    pub errored_passes: u64,
    pub last_outcome: Option<CompileOutcome>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerKind {
    Debounce,
    Requeue,
}

impl TimerKind {
    fn elapsed(self) -> PipelineInput {
        match self {
            TimerKind::Debounce => PipelineInput::DebounceElapsed,
            TimerKind::Requeue => PipelineInput::RequeueElapsed,
        }
    }
}

/// Async shell around [`PipelineCore`].
///
/// Reads change events, owns the single timer slot and runs passes through a
/// [`PassRunner`]. While a pass is awaited, events keep flowing into the core
/// so they are folded into the trailing pass instead of being lost.
pub struct Pipeline<C: CompilerBackend> {
    core: PipelineCore,
    runner: PassRunner<C>,
    patterns: SourcePatterns,
    events_rx: mpsc::Receiver<ChangeEvent>,
}

impl<C: CompilerBackend> fmt::Debug for Pipeline<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<C: CompilerBackend> Pipeline<C> {
    pub fn new(
        core: PipelineCore,
        runner: PassRunner<C>,
        patterns: SourcePatterns,
        events_rx: mpsc::Receiver<ChangeEvent>,
    ) -> Self {
        Self {
            core,
            runner,
            patterns,
            events_rx,
        }
    }

    /// Run the initial pass, then react to changes until `shutdown` resolves
    /// or the event channel closes. A running pass is always allowed to
    /// finish before this returns.
    pub async fn run<F>(self, shutdown: F) -> Result<PipelineStats>
    where
        F: Future<Output = ()>,
    {
        let Pipeline {
            mut core,
            runner,
            patterns,
            mut events_rx,
        } = self;

        tokio::pin!(shutdown);
        let mut shutdown_seen = false;
        let mut events_open = true;
        let mut timer: Option<(TimerKind, Instant)> = None;
        let mut stats = PipelineStats::default();
        let mut commands: VecDeque<PipelineCommand> = core.begin_session().into();

        info!("watch pipeline started");

        loop {
            while let Some(command) = commands.pop_front() {
                match command {
                    PipelineCommand::ArmDebounce(delay) => {
                        timer = Some((TimerKind::Debounce, Instant::now() + delay));
                    }
                    PipelineCommand::ArmRequeue(delay) => {
                        timer = Some((TimerKind::Requeue, Instant::now() + delay));
                    }
                    PipelineCommand::StartPass { regenerate, trigger } => {
                        timer = None;
                        debug!(?trigger, regenerate, "running pass");

                        let pass = runner.run(regenerate);
                        tokio::pin!(pass);

                        let result = loop {
                            tokio::select! {
                                result = &mut pass => break result,
                                maybe = events_rx.recv(), if events_open => match maybe {
                                    Some(event) => {
                                        commands.extend(core.step(classify(&patterns, event)));
                                    }
                                    None => {
                                        events_open = false;
                                        commands.extend(core.step(PipelineInput::Shutdown));
                                    }
                                },
                                _ = &mut shutdown, if !shutdown_seen => {
                                    shutdown_seen = true;
                                    commands.extend(core.step(PipelineInput::Shutdown));
                                }
                            }
                        };

                        stats.passes += 1;
                        let finished = match result {
                            Ok(report) => {
                                stats.last_outcome = Some(report.outcome);
                                PipelineInput::PassFinished
                            }
                            Err(err) => {
                                stats.errored_passes += 1;
                                error!(error = %err, "pass failed; waiting for the next change");
                                PipelineInput::PassFailed
                            }
                        };
                        commands.extend(core.step(finished));
                    }
                    PipelineCommand::Exit => {
                        info!(passes = stats.passes, "watch pipeline stopped");
                        return Ok(stats);
                    }
                }
            }

            let deadline = timer.map(|(_, at)| at);
            tokio::select! {
                _ = &mut shutdown, if !shutdown_seen => {
                    shutdown_seen = true;
                    commands.extend(core.step(PipelineInput::Shutdown));
                }
                maybe = events_rx.recv(), if events_open => match maybe {
                    Some(event) => commands.extend(core.step(classify(&patterns, event))),
                    None => {
                        debug!("change channel closed");
                        events_open = false;
                        commands.extend(core.step(PipelineInput::Shutdown));
                    }
                },
                _ = sleep_until_deadline(deadline) => {
                    if let Some((kind, _)) = timer.take() {
                        commands.extend(core.step(kind.elapsed()));
                    }
                }
            }
        }
    }
}

fn classify(patterns: &SourcePatterns, event: ChangeEvent) -> PipelineInput {
    let manifest_relevant = patterns.is_manifest_path(&event.path);
    debug!(kind = %event.kind, path = %event.path, manifest_relevant, "change received");
    PipelineInput::Change {
        path: event.path,
        manifest_relevant,
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}
