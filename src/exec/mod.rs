// src/exec/mod.rs

//! Compiler invocation layer.
//!
//! - [`backend`] defines the `CompilerBackend` seam and the production
//!   `ShellCompiler`.
//! - [`process`] spawns the shell with inherited stdio via
//!   `tokio::process::Command`.

pub mod backend;
pub mod process;

pub use backend::{CompileFuture, CompileOutcome, CompilerBackend, ShellCompiler};
pub use process::run_shell;
