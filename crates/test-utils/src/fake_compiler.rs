use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chisel::exec::{CompileFuture, CompileOutcome, CompilerBackend};

#[derive(Debug, Default)]
struct FakeState {
    calls: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
    exit_code: AtomicI32,
    commands: Mutex<Vec<String>>,
}

/// A compiler that:
/// - records every command it was asked to run
/// - tracks how many invocations overlapped at most
/// - "compiles" by sleeping for `delay` on the tokio clock
/// - exits with a configurable code
///
/// Clones share state, so a test keeps one handle while the session owns
/// another.
#[derive(Debug, Clone, Default)]
pub struct FakeCompiler {
    state: Arc<FakeState>,
    delay: Duration,
}

impl FakeCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_exit_code(self, code: i32) -> Self {
        self.set_exit_code(code);
        self
    }

    pub fn set_exit_code(&self, code: i32) {
        self.state.exit_code.store(code, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }

    pub fn max_concurrency(&self) -> usize {
        self.state.max_active.load(Ordering::SeqCst)
    }

    pub fn commands(&self) -> Vec<String> {
        self.state.commands.lock().unwrap().clone()
    }
}

impl CompilerBackend for FakeCompiler {
    fn compile<'a>(&'a self, cmd: &'a str) -> CompileFuture<'a> {
        let state = Arc::clone(&self.state);
        let delay = self.delay;

        Box::pin(async move {
            state.calls.fetch_add(1, Ordering::SeqCst);
            state.commands.lock().unwrap().push(cmd.to_string());
            let now_active = state.active.fetch_add(1, Ordering::SeqCst) + 1;
            state.max_active.fetch_max(now_active, Ordering::SeqCst);

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            state.active.fetch_sub(1, Ordering::SeqCst);
            Ok(CompileOutcome::Exited(state.exit_code.load(Ordering::SeqCst)))
        })
    }
}
