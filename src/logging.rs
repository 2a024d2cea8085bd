// src/logging.rs

//! `tracing` setup.
//!
//! The filter comes from `--log-level` when given. Otherwise `CHISEL_LOG` is
//! read as a full `EnvFilter` directive (`debug`, `chisel::engine=trace`,
//! ...), falling back to `info`. Output goes to stderr: the compiler
//! inherits our stdout and its diagnostics should stay readable.

use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;

use crate::cli::LogLevel;

pub const LOG_ENV_VAR: &str = "CHISEL_LOG";

const DEFAULT_DIRECTIVE: &str = "info";

/// Install the global subscriber. Call once, before anything logs.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV_VAR).ok();
    let filter = build_filter(cli_level, env.as_deref());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("installing log subscriber: {e}"))
}

fn build_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> EnvFilter {
    if let Some(level) = cli_level {
        return EnvFilter::new(level_directive(level));
    }
    env.filter(|s| !s.trim().is_empty())
        .and_then(|s| EnvFilter::try_new(s.trim()).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVE))
}

fn level_directive(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flag_wins_over_env() {
        let filter = build_filter(Some(LogLevel::Warn), Some("trace"));
        assert_eq!(filter.to_string(), "warn");
    }

    #[test]
    fn env_directive_is_used_verbatim() {
        let filter = build_filter(None, Some("chisel::engine=debug"));
        assert_eq!(filter.to_string(), "chisel::engine=debug");
    }

    #[test]
    fn blank_or_invalid_env_falls_back_to_info() {
        assert_eq!(build_filter(None, Some("  ")).to_string(), "info");
        assert_eq!(build_filter(None, None).to_string(), "info");
        assert_eq!(build_filter(None, Some("chisel=notalevel")).to_string(), "info");
    }
}
