// src/config/mod.rs

//! Configuration loading and validation for chisel.
//!
//! Responsibilities:
//! - Define the JSON-backed data model (`model.rs`).
//! - Load a config file from disk, defaulting when absent (`loader.rs`).
//! - Validate and resolve it into an immutable [`ChiselConfig`] (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{DEFAULT_CONFIG_FILE, load_and_validate, load_from_path};
pub use model::{ChiselConfig, RawConfigFile};
pub use validate::{resolve_compile_cmd, validate_raw_config};
