// src/engine/mod.rs

//! Pipeline serializer.
//!
//! Change events are debounced into passes, passes never overlap, and
//! changes that arrive during a pass collapse into exactly one trailing
//! pass. The pure state machine lives in [`core`]; the async shell that owns
//! the timer and awaits passes is [`runtime`]; [`pass`] runs the stages of a
//! single pass.

pub mod core;
pub mod pass;
pub mod runtime;

pub use core::{
    PendingTrigger, PipelineCommand, PipelineCore, PipelineInput, PipelineOptions, PipelineState,
};
pub use pass::{PassReport, PassRunner};
pub use runtime::{Pipeline, PipelineStats};
