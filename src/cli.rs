// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `chisel`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "chisel",
    version,
    about = "Regenerate app stubs and drive the roblox-ts compiler, in watch or one-shot mode.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (JSON), relative to the project root.
    ///
    /// A missing file is not an error; defaults are used instead.
    #[arg(long, value_name = "PATH", default_value = "chisel.config.json", global = true)]
    pub config: String,

    /// Project root. Defaults to the current working directory.
    #[arg(long, value_name = "DIR", global = true)]
    pub root: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `CHISEL_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Watch the source tree: codegen -> compile on every settled change.
    Watch,
    /// One-shot codegen -> compile; exits with the compiler's exit code.
    Build,
    /// Regenerate the project descriptor and exit.
    GenerateProject,
    /// Print the resolved configuration without running anything.
    PrintConfig,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
