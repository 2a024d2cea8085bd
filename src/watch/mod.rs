// src/watch/mod.rs

//! File watching and session orchestration.
//!
//! - [`patterns`] classifies root-relative paths (watched, manifest-relevant).
//! - [`watcher`] turns raw `notify` events into settled [`ChangeEvent`]s.
//! - [`session`] wires a change source to the pipeline, or runs a single
//!   pass in one-shot mode.
//!
//! [`ChangeEvent`]: crate::types::ChangeEvent

pub mod path_utils;
pub mod patterns;
pub mod session;
pub mod watcher;

pub use patterns::SourcePatterns;
pub use session::{CHANGE_CHANNEL_CAPACITY, WatchSession};
pub use watcher::{ChangeSource, NotifyChangeSource, SettleBuffer, classify_kind};
