// src/exec/backend.rs

//! Pluggable compiler backend.
//!
//! The pipeline talks to a `CompilerBackend` instead of spawning processes
//! itself, so tests can substitute a fake that records invocations. The
//! backend is stateless: single-flight is the pipeline's job, not this one.

use std::future::Future;
use std::pin::Pin;

use crate::errors::Result;
use crate::exec::process::run_shell;

/// How a compiler invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileOutcome {
    /// The process exited on its own with this code.
    Exited(i32),
    /// The process was terminated by a signal (number, when known).
    Signalled(Option<i32>),
}

impl CompileOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CompileOutcome::Exited(0))
    }

    /// Exit code to propagate from one-shot mode.
    ///
    /// Signal termination maps to `128 + signal`, like a POSIX shell does, or
    /// to `1` when the signal number is unknown.
    pub fn exit_code(&self) -> i32 {
        match *self {
            CompileOutcome::Exited(code) => code,
            CompileOutcome::Signalled(Some(signal)) => 128 + signal,
            CompileOutcome::Signalled(None) => 1,
        }
    }
}

pub type CompileFuture<'a> = Pin<Box<dyn Future<Output = Result<CompileOutcome>> + Send + 'a>>;

/// Trait abstracting how the compiler command is executed.
pub trait CompilerBackend: Send + Sync {
    /// Run `cmd` to completion and report how it ended.
    fn compile<'a>(&'a self, cmd: &'a str) -> CompileFuture<'a>;
}

/// Production backend: runs the command through the platform shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellCompiler;

impl CompilerBackend for ShellCompiler {
    fn compile<'a>(&'a self, cmd: &'a str) -> CompileFuture<'a> {
        Box::pin(run_shell(cmd))
    }
}
