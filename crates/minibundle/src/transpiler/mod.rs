//! Source parser and syntax downleveler
//!
//! The asset resolver only talks to these two traits. `SwcParser` and
//! `SwcDownleveler` back them with swc; tests may substitute their own.

use std::path::Path;

use swc_core::{
    common::{SourceMap, sync::Lrc},
    ecma::ast::Module,
};

pub mod downlevel;
pub mod parser;

pub use downlevel::SwcDownleveler;
pub use parser::SwcParser;

/// A parsed module together with the source map its spans point into
pub struct SyntaxTree {
    pub module: Module,
    pub source_map: Lrc<SourceMap>,
}

impl std::fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntaxTree")
            .field("items", &self.module.body.len())
            .finish_non_exhaustive()
    }
}

/// Target environment the downleveler lowers syntax for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TargetPreset {
    /// Every preset-env transform enabled, CommonJS module output
    #[default]
    Es5,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} (line {line}, column {column})")]
pub struct ParseFailure {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TransformFailure {
    pub message: String,
}

impl TransformFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Turns module source text into a syntax tree
pub trait SourceParser {
    fn parse(&self, path: &Path, source: &str) -> Result<SyntaxTree, ParseFailure>;
}

/// Lowers a syntax tree into emit-ready code for a target preset
///
/// Implementations must be deterministic for the same tree and preset.
pub trait Downleveler {
    fn downlevel(&self, tree: SyntaxTree, preset: TargetPreset) -> Result<String, TransformFailure>;
}
