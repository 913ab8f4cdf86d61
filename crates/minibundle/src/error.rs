//! Error taxonomy for a bundling run
//!
//! Every error is fatal to the build. Failures in the entry file surface as
//! the bare `Read`/`Parse`/`Transform` variant; anything reached through an
//! import specifier is wrapped in `Resolution` so the message names the file
//! that imported it and the chain of imports leading there.

use std::path::PathBuf;

/// One `importer --specifier-->` hop on the way from the entry to a failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportHop {
    pub importer: PathBuf,
    pub specifier: String,
}

#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}:{line}:{column}: {message}", path.display())]
    Parse {
        path: PathBuf,
        message: String,
        line: usize,
        column: usize,
    },

    #[error("failed to transform {}: {message}", path.display())]
    Transform { path: PathBuf, message: String },

    #[error(
        "cannot resolve '{specifier}' imported from {} (resolved to {}){}",
        importer.display(),
        path.display(),
        format_chain(chain)
    )]
    Resolution {
        importer: PathBuf,
        specifier: String,
        path: PathBuf,
        chain: Vec<ImportHop>,
        #[source]
        source: Box<BundleError>,
    },
}

impl BundleError {
    /// Path of the file whose read, parse or transform actually failed
    pub fn failing_path(&self) -> &std::path::Path {
        match self {
            Self::Read { path, .. } | Self::Parse { path, .. } | Self::Transform { path, .. } => {
                path
            }
            Self::Resolution { source, .. } => source.failing_path(),
        }
    }

    /// Wrap a child failure with the import that led to it
    pub(crate) fn resolution(
        importer: PathBuf,
        specifier: String,
        path: PathBuf,
        chain: Vec<ImportHop>,
        source: Self,
    ) -> Self {
        Self::Resolution {
            importer,
            specifier,
            path,
            chain,
            source: Box::new(source),
        }
    }
}

fn format_chain(chain: &[ImportHop]) -> String {
    if chain.len() < 2 {
        return String::new();
    }

    let hops = chain
        .iter()
        .map(|hop| format!("{} imports '{}'", hop.importer.display(), hop.specifier))
        .collect::<Vec<_>>()
        .join(" -> ");
    format!("\n  import chain: {hops}")
}
