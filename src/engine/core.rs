// src/engine/core.rs

//! Pure pipeline state machine.
//!
//! [`PipelineCore`] consumes [`PipelineInput`]s and returns the
//! [`PipelineCommand`]s the async shell (`engine::runtime::Pipeline`) should
//! carry out. It owns the pending-trigger bookkeeping and has no timers,
//! channels or IO of its own, so every ordering rule can be tested
//! synchronously.
//!
//! States:
//!
//! ```text
//!            change            debounce elapsed
//!   Idle ──────────▶ Debouncing ───────────────▶ Running
//!    ▲    (change restarts the timer)              │  ▲
//!    │                                      change │  │ requeue elapsed
//!    │                pass finished                ▼  │
//!    └───────────────────────────────── RunningQueued ─▶ Cooldown
//!                     (from Running)      pass finished
//! ```

use std::time::Duration;

use tracing::{debug, info};

/// Timing policy for the serializer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Quiet period after the last change before a pass starts.
    pub debounce: Duration,
    /// Delay between a finished pass and the trailing pass it owes.
    pub requeue_delay: Duration,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(80),
            requeue_delay: Duration::from_millis(50),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Debouncing,
    Running,
    /// Running, and at least one change arrived since the pass started.
    RunningQueued,
    /// A pass finished with a queued change; waiting out the requeue delay.
    Cooldown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineInput {
    Change {
        path: String,
        /// The path feeds the manifest (server/shared sources).
        manifest_relevant: bool,
    },
    DebounceElapsed,
    RequeueElapsed,
    PassFinished,
    /// The pass ended with a stage error. Artifacts may be stale, so the next
    /// pass regenerates regardless of what triggered it.
    PassFailed,
    Shutdown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineCommand {
    /// (Re)start the single timer slot as a debounce timer.
    ArmDebounce(Duration),
    /// (Re)start the single timer slot as a requeue timer.
    ArmRequeue(Duration),
    /// Run one full pass. The shell must report `PassFinished` afterwards.
    StartPass {
        regenerate: bool,
        trigger: Option<String>,
    },
    /// Stop the loop. Only ever issued while no pass is running.
    Exit,
}

/// Changes seen since the last pass started.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingTrigger {
    pub requested: bool,
    pub last_path: Option<String>,
    /// Any of the folded changes was manifest-relevant.
    pub manifest_relevant: bool,
}

impl PendingTrigger {
    fn record(&mut self, path: String, manifest_relevant: bool) {
        self.requested = true;
        self.last_path = Some(path);
        self.manifest_relevant |= manifest_relevant;
    }
}

#[derive(Debug)]
pub struct PipelineCore {
    options: PipelineOptions,
    state: PipelineState,
    pending: PendingTrigger,
    passes_started: u64,
    force_regenerate: bool,
    shutdown_requested: bool,
}

impl PipelineCore {
    pub fn new(options: PipelineOptions) -> Self {
        Self {
            options,
            state: PipelineState::Idle,
            pending: PendingTrigger::default(),
            passes_started: 0,
            force_regenerate: true,
            shutdown_requested: false,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn pending(&self) -> &PendingTrigger {
        &self.pending
    }

    pub fn passes_started(&self) -> u64 {
        self.passes_started
    }

    pub fn is_running(&self) -> bool {
        matches!(
            self.state,
            PipelineState::Running | PipelineState::RunningQueued
        )
    }

    /// Kick off the first pass of a session without waiting for a change.
    ///
    /// The first pass always regenerates artifacts. Has no effect unless the
    /// core is idle.
    pub fn begin_session(&mut self) -> Vec<PipelineCommand> {
        if self.state != PipelineState::Idle {
            return Vec::new();
        }
        vec![self.start_pass()]
    }

    pub fn step(&mut self, input: PipelineInput) -> Vec<PipelineCommand> {
        use PipelineState::*;

        let input = match input {
            PipelineInput::PassFailed if self.is_running() => {
                self.force_regenerate = true;
                PipelineInput::PassFinished
            }
            other => other,
        };

        match (self.state, input) {
            (_, PipelineInput::Shutdown) => self.handle_shutdown(),

            (_, PipelineInput::Change { .. }) if self.shutdown_requested => Vec::new(),

            (Idle | Debouncing, PipelineInput::Change { path, manifest_relevant }) => {
                self.pending.record(path, manifest_relevant);
                self.state = Debouncing;
                vec![PipelineCommand::ArmDebounce(self.options.debounce)]
            }
            (Running | RunningQueued, PipelineInput::Change { path, manifest_relevant }) => {
                debug!(path = %path, "change while running; folding into trailing pass");
                self.pending.record(path, manifest_relevant);
                self.state = RunningQueued;
                Vec::new()
            }
            // The owed pass has not started yet, so it will observe this change.
            (Cooldown, PipelineInput::Change { path, manifest_relevant }) => {
                self.pending.record(path, manifest_relevant);
                Vec::new()
            }

            (Debouncing, PipelineInput::DebounceElapsed) => vec![self.start_pass()],
            (Cooldown, PipelineInput::RequeueElapsed) => vec![self.start_pass()],

            (Running, PipelineInput::PassFinished) => {
                self.state = Idle;
                self.exit_if_requested()
            }
            (RunningQueued, PipelineInput::PassFinished) => {
                if self.shutdown_requested {
                    self.state = Idle;
                    return self.exit_if_requested();
                }
                self.state = Cooldown;
                vec![PipelineCommand::ArmRequeue(self.options.requeue_delay)]
            }

            (state, input) => {
                debug!(?state, ?input, "ignoring input in current state");
                Vec::new()
            }
        }
    }

    fn start_pass(&mut self) -> PipelineCommand {
        let forced = std::mem::take(&mut self.force_regenerate);
        let regenerate = forced || self.pending.manifest_relevant;
        let trigger = std::mem::take(&mut self.pending).last_path;

        self.passes_started += 1;
        self.state = PipelineState::Running;
        info!(
            pass = self.passes_started,
            regenerate,
            trigger = trigger.as_deref().unwrap_or("<startup>"),
            "starting pipeline pass"
        );

        PipelineCommand::StartPass {
            regenerate,
            trigger,
        }
    }

    fn handle_shutdown(&mut self) -> Vec<PipelineCommand> {
        self.shutdown_requested = true;
        if self.is_running() {
            info!("shutdown requested; waiting for the running pass to finish");
            return Vec::new();
        }
        self.state = PipelineState::Idle;
        vec![PipelineCommand::Exit]
    }

    fn exit_if_requested(&self) -> Vec<PipelineCommand> {
        if self.shutdown_requested {
            vec![PipelineCommand::Exit]
        } else {
            Vec::new()
        }
    }
}
