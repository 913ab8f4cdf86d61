//! Shared type definitions for the minibundle crate
//!
//! This module contains common types that are used across multiple components
//! of the bundler, ensuring consistency and avoiding circular dependencies.

use indexmap::IndexMap;
use rustc_hash::FxHasher;
use serde::Serialize;

/// Type alias for FxHasher-based IndexMap
pub type FxIndexMap<K, V> = IndexMap<K, V, std::hash::BuildHasherDefault<FxHasher>>;

/// Unique identifier for an asset within one bundling run
///
/// Ids are dense and 0-based: the entry file is always `AssetId(0)` and every
/// newly discovered file receives the next value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AssetId(u32);

impl AssetId {
    /// The id reserved for the entry asset
    pub const ENTRY: Self = Self(0);

    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the underlying u32 value of the AssetId
    #[inline]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    /// Position of this asset in the graph's asset list
    #[inline]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic id counter for one bundling session
///
/// Owned by the graph builder so separate runs in the same process never
/// share or leak ids.
#[derive(Debug, Default)]
pub struct AssetIdAllocator {
    next: u32,
}

impl AssetIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out the next id; every call increments the counter exactly once
    pub fn next_id(&mut self) -> AssetId {
        let id = AssetId(self.next);
        self.next += 1;
        id
    }

    /// Number of ids handed out so far
    pub fn allocated(&self) -> u32 {
        self.next
    }
}

/// Specifier → dependency id table of one asset, in first-seen order
pub type DependencyMapping = FxIndexMap<String, AssetId>;
