// src/project/mod.rs

//! Project descriptor publishing.
//!
//! The pipeline calls [`ProjectPublisher::publish`] in every pass, after
//! artifacts are generated and before the compiler runs. Implementations must be idempotent and must only write outside the
//! watched source set.

pub mod rojo;

use crate::errors::Result;

pub use rojo::RojoProjectPublisher;

pub trait ProjectPublisher: Send + Sync {
    /// Regenerate the descriptor from the current application set.
    ///
    /// Returns whether the file on disk changed.
    fn publish(&self) -> Result<bool>;
}
