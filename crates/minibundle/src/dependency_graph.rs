//! The resolved module graph handed to the code generator
//!
//! Assets are stored in discovery (BFS) order and ids are dense, so the asset
//! with id `i` lives at index `i`.

use anyhow::{Result, anyhow};
use log::debug;
use petgraph::{
    algo::tarjan_scc,
    graph::{DiGraph, NodeIndex},
};

use crate::{asset::Asset, types::AssetId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyGraph {
    assets: Vec<Asset>,
}

impl DependencyGraph {
    /// Wrap an asset list whose ids already match their positions
    pub(crate) fn from_assets(assets: Vec<Asset>) -> Self {
        Self { assets }
    }

    /// The entry asset (id 0)
    pub fn entry(&self) -> Option<&Asset> {
        self.assets.first()
    }

    pub fn get(&self, id: AssetId) -> Option<&Asset> {
        self.assets.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Asset> {
        self.assets.iter()
    }

    /// Check the structural invariants the runtime relies on: ids are dense
    /// and match positions, and every specifier maps to an asset in the graph.
    pub fn validate(&self) -> Result<()> {
        for (index, asset) in self.assets.iter().enumerate() {
            if asset.id.index() != index {
                return Err(anyhow!(
                    "asset {} ({}) stored at index {index}",
                    asset.id,
                    asset.absolute_path.display()
                ));
            }

            for specifier in &asset.dependency_specifiers {
                let target = asset.mapping.get(specifier).ok_or_else(|| {
                    anyhow!(
                        "specifier '{specifier}' of {} has no mapping",
                        asset.absolute_path.display()
                    )
                })?;
                if target.index() >= self.assets.len() {
                    return Err(anyhow!(
                        "specifier '{specifier}' of {} maps to unknown asset {target}",
                        asset.absolute_path.display()
                    ));
                }
            }
        }
        Ok(())
    }

    /// Groups of assets that import each other, directly or transitively
    ///
    /// Each group is sorted by id and the groups are ordered by their lowest
    /// id. A module importing itself forms a group of one.
    pub fn cycles(&self) -> Vec<Vec<AssetId>> {
        let mut graph: DiGraph<AssetId, ()> = DiGraph::with_capacity(self.assets.len(), 0);
        for asset in &self.assets {
            graph.add_node(asset.id);
        }
        for asset in &self.assets {
            for target in asset.mapping.values() {
                let from = NodeIndex::new(asset.id.index());
                let to = NodeIndex::new(target.index());
                if graph.find_edge(from, to).is_none() {
                    graph.add_edge(from, to, ());
                }
            }
        }

        let mut cycles: Vec<Vec<AssetId>> = tarjan_scc(&graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || component
                        .first()
                        .is_some_and(|&node| graph.find_edge(node, node).is_some())
            })
            .map(|component| {
                let mut ids: Vec<AssetId> = component.into_iter().map(|node| graph[node]).collect();
                ids.sort();
                ids
            })
            .collect();
        cycles.sort();

        debug!("Found {} circular import group(s)", cycles.len());
        cycles
    }
}
