//! minibundle: bundle an ES module graph into one self-contained script
//!
//! The pipeline is strictly ordered: the [`asset`] resolver turns one file
//! into an [`asset::Asset`], the [`graph_builder`] walks imports breadth-first
//! to produce a [`dependency_graph::DependencyGraph`], and the
//! [`code_generator`] serializes that graph together with a tiny `require`
//! runtime.

pub mod asset;
pub mod code_generator;
pub mod config;
pub mod dependency_graph;
pub mod error;
pub mod graph_builder;
pub mod module_registry;
pub mod orchestrator;
pub mod resolver;
pub mod transpiler;
pub mod types;
pub mod util;
pub mod visitors;

pub use error::BundleError;
pub use orchestrator::{BundleOrchestrator, BundleOutput};
