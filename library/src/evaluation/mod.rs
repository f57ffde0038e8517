//! Per-pass evaluation parameters and the update-function interface.

pub mod context;
pub mod update;

pub use context::EvaluationContext;
pub use update::{UpdateAction, UpdateContext};
