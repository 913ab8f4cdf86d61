//! AST visitors over parsed ES modules
//!
//! Import discovery reads the dependency specifiers of a module; the ESM to
//! CommonJS pass rewrites module syntax into `require`/`exports` calls that
//! the bundle runtime understands.

pub mod esm_to_cjs;
pub mod import_discovery;

pub use esm_to_cjs::EsmToCjs;
pub use import_discovery::collect_import_specifiers;
