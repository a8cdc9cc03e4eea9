//! Prelude module for Strand.
//!
//! This module re-exports the most commonly used types for convenient importing:
//!
//! ```
//! use strand::prelude::*;
//! ```

pub use crate::view_model::{Options, ViewModel};
pub use strand_core::{
    Compiler, CompilerBuilder, CompilerConfig, Document, Dom, NodeId, ReactiveObject, Value,
    Watcher, make_reactive,
};
