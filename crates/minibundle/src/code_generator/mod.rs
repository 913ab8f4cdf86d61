//! Bundle code generation
//!
//! Turns a finished [`DependencyGraph`](crate::dependency_graph::DependencyGraph)
//! into a single script: a small `require` loader followed by a table holding
//! every module body wrapped in its own function scope together with its
//! specifier → id mapping.

pub mod bundler;
pub mod runtime;

pub use bundler::{EmitOptions, emit};
