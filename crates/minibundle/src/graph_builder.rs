//! Breadth-first construction of the dependency graph
//!
//! Starting from the entry asset, the builder walks a single queue that it
//! appends to while iterating, so ids come out in BFS discovery order. Each
//! canonical path is resolved at most once: diamonds share one asset and
//! circular imports terminate.

use std::path::Path;

use log::{debug, info, trace};

use crate::{
    asset::{Asset, AssetResolver},
    dependency_graph::DependencyGraph,
    error::{BundleError, ImportHop},
    module_registry::ModuleRegistry,
    resolver::ModuleResolver,
    transpiler::{Downleveler, SourceParser, SwcDownleveler, SwcParser},
    types::{AssetId, AssetIdAllocator},
};

/// How an asset was first reached: the importing asset and the specifier
#[derive(Debug, Clone, Copy)]
struct Discovery {
    importer: AssetId,
    specifier_index: usize,
}

#[derive(Debug)]
pub struct GraphBuilder<'a, P = SwcParser, D = SwcDownleveler> {
    asset_resolver: &'a AssetResolver<P, D>,
    module_resolver: &'a ModuleResolver,
}

impl<'a, P: SourceParser, D: Downleveler> GraphBuilder<'a, P, D> {
    pub fn new(
        asset_resolver: &'a AssetResolver<P, D>,
        module_resolver: &'a ModuleResolver,
    ) -> Self {
        Self {
            asset_resolver,
            module_resolver,
        }
    }

    /// Build the graph reachable from `entry`
    ///
    /// `entry` must already be resolved (see [`ModuleResolver::resolve_entry`]).
    /// Any failure aborts the whole build; no partial graph is returned.
    pub fn build_graph(&self, entry: &Path) -> Result<DependencyGraph, BundleError> {
        // Session state: a fresh counter and registry for every run
        let mut ids = AssetIdAllocator::new();
        let mut registry = ModuleRegistry::new();
        let mut discovered_by: Vec<Option<Discovery>> = Vec::new();

        let entry_asset = self.asset_resolver.create_asset(entry, &mut ids)?;
        registry.register(entry_asset.absolute_path.clone(), entry_asset.id);
        discovered_by.push(None);

        let mut queue: Vec<Asset> = vec![entry_asset];
        let mut cursor = 0;

        while cursor < queue.len() {
            let importer_id = queue[cursor].id;
            let importer_dir = queue[cursor].directory().to_path_buf();
            let specifiers = queue[cursor].dependency_specifiers.clone();
            let mut mapping = std::mem::take(&mut queue[cursor].mapping);

            for (specifier_index, specifier) in specifiers.iter().enumerate() {
                let path = self
                    .module_resolver
                    .resolve_specifier(&importer_dir, specifier);

                let child_id = if let Some(existing) = registry.get_id_by_path(&path) {
                    trace!("'{specifier}' -> asset {existing} (already resolved)");
                    existing
                } else {
                    let child = self
                        .asset_resolver
                        .create_asset(&path, &mut ids)
                        .map_err(|source| {
                            BundleError::resolution(
                                queue[cursor].absolute_path.clone(),
                                specifier.clone(),
                                path.clone(),
                                import_chain(&queue, &discovered_by, importer_id, specifier),
                                source,
                            )
                        })?;
                    let child_id = child.id;
                    trace!("'{specifier}' -> asset {child_id} ({})", path.display());

                    registry.register(path, child_id);
                    discovered_by.push(Some(Discovery {
                        importer: importer_id,
                        specifier_index,
                    }));
                    queue.push(child);
                    child_id
                };

                mapping.insert(specifier.clone(), child_id);
            }

            queue[cursor].mapping = mapping;
            cursor += 1;
        }

        debug!(
            "Resolved {} assets from {} ({} ids allocated)",
            queue.len(),
            entry.display(),
            ids.allocated()
        );
        info!("Built dependency graph with {} modules", queue.len());

        Ok(DependencyGraph::from_assets(queue))
    }
}

/// Import hops from the entry down to `importer` importing `specifier`
fn import_chain(
    assets: &[Asset],
    discovered_by: &[Option<Discovery>],
    importer: AssetId,
    specifier: &str,
) -> Vec<ImportHop> {
    let mut chain = vec![ImportHop {
        importer: assets[importer.index()].absolute_path.clone(),
        specifier: specifier.to_owned(),
    }];

    let mut current = importer;
    while let Some(Some(discovery)) = discovered_by.get(current.index()) {
        let parent = &assets[discovery.importer.index()];
        chain.push(ImportHop {
            importer: parent.absolute_path.clone(),
            specifier: parent.dependency_specifiers[discovery.specifier_index].clone(),
        });
        current = discovery.importer;
    }

    chain.reverse();
    chain
}
