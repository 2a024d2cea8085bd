// src/lib.rs

pub mod artifacts;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod manifest;
pub mod project;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, info};

use crate::cli::{CliArgs, Command};
use crate::config::{ChiselConfig, load_and_validate};
use crate::errors::Result;
use crate::exec::ShellCompiler;
use crate::fs::{FileSystem, RealFileSystem};
use crate::project::{ProjectPublisher, RojoProjectPublisher};
use crate::watch::{NotifyChangeSource, SourcePatterns, WatchSession};

/// High-level entry point used by `main.rs`. Returns the process exit code.
///
/// This wires together:
/// - config loading (fatal on error)
/// - the project publisher and shell compiler
/// - one-shot or watch mode, with Ctrl-C as the shutdown signal in the latter
pub async fn run(args: CliArgs) -> Result<i32> {
    let root = resolve_root(args.root.as_deref())?;
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let cfg = Arc::new(load_and_validate(
        fs.as_ref(),
        &root,
        Path::new(&args.config),
    )?);

    let publisher: Arc<dyn ProjectPublisher> =
        Arc::new(RojoProjectPublisher::from_config(fs.clone(), &cfg));

    match args.command {
        Command::PrintConfig => {
            print_config(&cfg);
            Ok(0)
        }
        Command::GenerateProject => {
            let changed = publisher.publish()?;
            info!(path = ?cfg.project_file, changed, "project descriptor generated");
            Ok(0)
        }
        Command::Build => {
            let session = WatchSession::new(cfg, fs, publisher, ShellCompiler)?;
            session.run_once().await
        }
        Command::Watch => {
            let mut source = NotifyChangeSource::new(
                cfg.root.clone(),
                SourcePatterns::from_config(&cfg)?,
                cfg.settle,
            );
            let session = WatchSession::new(cfg, fs, publisher, ShellCompiler)?;
            session.run_watch(&mut source, ctrl_c()).await?;
            Ok(0)
        }
    }
}

fn resolve_root(root: Option<&str>) -> Result<PathBuf> {
    let root = match root {
        Some(r) => PathBuf::from(r),
        None => std::env::current_dir().context("reading current directory")?,
    };
    Ok(root.canonicalize().unwrap_or(root))
}

/// Resolves on the first Ctrl-C. If the handler cannot be installed the
/// session simply runs until killed.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        eprintln!("failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
    info!("Ctrl-C received; shutting down");
}

fn print_config(cfg: &ChiselConfig) {
    println!("chisel configuration");
    println!("  root            = {}", cfg.root.display());
    println!("  appsDir         = {}", cfg.apps_dir_rel);
    println!("  sentinelPath    = {}", cfg.sentinel_path.display());
    println!("  compileCmd      = {}", cfg.compile_cmd);
    println!("  projectFile     = {}", cfg.project_file.display());
    println!("  projectName     = {}", cfg.project_name);
    println!("  outDir          = {}", cfg.out_dir_rel);
    println!("  debounceMs      = {}", cfg.debounce.as_millis());
    println!("  requeueDelayMs  = {}", cfg.requeue_delay.as_millis());
    println!("  settleMs        = {}", cfg.settle.as_millis());

    debug!("print-config complete (no execution)");
}
