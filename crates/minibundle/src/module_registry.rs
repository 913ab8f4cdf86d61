//! Module registry for tracking asset identity during graph construction
//!
//! The registry is the single source of truth for "have we seen this file
//! already?" within one bundling run. It maps canonical paths to asset ids so
//! that diamonds and cycles reuse the existing asset instead of re-parsing.

use std::path::{Path, PathBuf};

use log::trace;
use rustc_hash::FxHashMap;

use crate::types::AssetId;

#[derive(Debug, Default, Clone)]
pub struct ModuleRegistry {
    /// Map from canonical path to AssetId
    path_to_id: FxHashMap<PathBuf, AssetId>,
}

impl ModuleRegistry {
    /// Create a new empty module registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `path` is represented by `id`
    ///
    /// Registering the same path twice is a graph builder bug.
    pub fn register(&mut self, path: PathBuf, id: AssetId) {
        trace!("Registering {} as asset {id}", path.display());
        let previous = self.path_to_id.insert(path, id);
        debug_assert!(previous.is_none(), "path registered twice");
    }

    /// Get asset ID by canonical path
    pub fn get_id_by_path(&self, path: &Path) -> Option<AssetId> {
        self.path_to_id.get(path).copied()
    }
}
