// tests/pipeline_core_props.rs

use std::time::Duration;

use chisel::engine::{
    PipelineCommand, PipelineCore, PipelineInput, PipelineOptions, PipelineState,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Change { relevant: bool },
    /// Fire whichever timer is armed, if any.
    FireTimer,
    /// Complete the running pass, if any.
    FinishPass { failed: bool },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => any::<bool>().prop_map(|relevant| Op::Change { relevant }),
        2 => Just(Op::FireTimer),
        2 => any::<bool>().prop_map(|failed| Op::FinishPass { failed }),
    ]
}

/// Plays the shell's role: a single timer slot and at most one pass.
#[derive(Debug, Default)]
struct Driver {
    timer: Option<PipelineInput>,
    running: bool,
    passes: u64,
    changes: u64,
    changes_since_last_start: bool,
    exited: bool,
}

impl Driver {
    fn apply(&mut self, core: &mut PipelineCore, commands: Vec<PipelineCommand>) {
        for command in commands {
            match command {
                PipelineCommand::ArmDebounce(_) => {
                    self.timer = Some(PipelineInput::DebounceElapsed)
                }
                PipelineCommand::ArmRequeue(_) => self.timer = Some(PipelineInput::RequeueElapsed),
                PipelineCommand::StartPass { .. } => {
                    assert!(!self.running, "a pass started while another was running");
                    self.running = true;
                    self.timer = None;
                    self.passes += 1;
                    self.changes_since_last_start = false;
                }
                PipelineCommand::Exit => {
                    assert!(!self.running, "exit issued while a pass was running");
                    self.exited = true;
                }
            }
        }
        assert_eq!(self.running, core.is_running());
    }

    fn run_op(&mut self, core: &mut PipelineCore, op: &Op) {
        let commands = match op {
            Op::Change { relevant } => {
                self.changes += 1;
                self.changes_since_last_start = true;
                core.step(PipelineInput::Change {
                    path: format!("src/f{}.ts", self.changes),
                    manifest_relevant: *relevant,
                })
            }
            Op::FireTimer => match self.timer.take() {
                Some(input) => core.step(input),
                None => Vec::new(),
            },
            Op::FinishPass { failed } if self.running => {
                self.running = false;
                core.step(if *failed {
                    PipelineInput::PassFailed
                } else {
                    PipelineInput::PassFinished
                })
            }
            Op::FinishPass { .. } => Vec::new(),
        };
        self.apply(core, commands);
    }

    /// Finish passes and fire timers until nothing is left to do.
    fn settle(&mut self, core: &mut PipelineCore) {
        for _ in 0..16 {
            if self.running {
                self.run_op(core, &Op::FinishPass { failed: false });
            } else if self.timer.is_some() {
                self.run_op(core, &Op::FireTimer);
            } else {
                return;
            }
        }
        panic!("pipeline did not settle");
    }
}

fn new_core() -> PipelineCore {
    PipelineCore::new(PipelineOptions {
        debounce: Duration::from_millis(80),
        requeue_delay: Duration::from_millis(50),
    })
}

proptest! {
    #[test]
    fn passes_never_overlap_and_no_change_is_lost(
        ops in proptest::collection::vec(op_strategy(), 0..64),
    ) {
        let mut core = new_core();
        let mut driver = Driver::default();
        let initial = core.begin_session();
        driver.apply(&mut core, initial);

        for op in &ops {
            driver.run_op(&mut core, op);
        }
        driver.settle(&mut core);

        prop_assert_eq!(core.state(), PipelineState::Idle);
        prop_assert!(!core.pending().requested);
        prop_assert!(!driver.changes_since_last_start);
        // One initial pass, and never more passes than changes on top.
        prop_assert!(driver.passes >= 1);
        prop_assert!(driver.passes <= driver.changes + 1);
        prop_assert_eq!(driver.passes, core.passes_started());
    }

    #[test]
    fn any_burst_during_a_pass_yields_exactly_one_trailing_pass(burst in 1usize..40) {
        let mut core = new_core();
        let mut driver = Driver::default();
        let initial = core.begin_session();
        driver.apply(&mut core, initial);

        for _ in 0..burst {
            driver.run_op(&mut core, &Op::Change { relevant: false });
        }
        driver.settle(&mut core);

        prop_assert_eq!(driver.passes, 2);
    }

    #[test]
    fn shutdown_never_interrupts_a_pass(ops in proptest::collection::vec(op_strategy(), 0..32)) {
        let mut core = new_core();
        let mut driver = Driver::default();
        let initial = core.begin_session();
        driver.apply(&mut core, initial);
        for op in &ops {
            driver.run_op(&mut core, op);
        }

        let was_running = driver.running;
        let commands = core.step(PipelineInput::Shutdown);
        driver.apply(&mut core, commands);
        prop_assert_eq!(driver.exited, !was_running);

        if was_running {
            driver.run_op(&mut core, &Op::FinishPass { failed: false });
            prop_assert!(driver.exited);
        }
    }
}
