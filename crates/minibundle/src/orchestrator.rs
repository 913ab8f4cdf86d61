//! Top-level driver tying resolution, graph building and emission together

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{info, warn};

use crate::{
    asset::AssetResolver,
    code_generator::{EmitOptions, emit},
    config::Config,
    dependency_graph::DependencyGraph,
    graph_builder::GraphBuilder,
    resolver::ModuleResolver,
    util::display_relative,
};

/// Result of a successful bundling run
#[derive(Debug, Clone)]
pub struct BundleOutput {
    pub graph: DependencyGraph,
    pub code: String,
}

#[derive(Debug)]
pub struct BundleOrchestrator {
    config: Config,
    resolver: ModuleResolver,
    assets: AssetResolver,
}

impl BundleOrchestrator {
    pub fn new(config: Config) -> Self {
        let resolver = ModuleResolver::new(&config);
        Self {
            config,
            resolver,
            assets: AssetResolver::default(),
        }
    }

    /// Build the graph for `entry` and emit the bundle in memory
    ///
    /// A relative `entry` is resolved against the current working directory.
    pub fn bundle(&self, entry: &Path) -> Result<BundleOutput> {
        let cwd = std::env::current_dir().context("failed to determine working directory")?;
        let entry = self.resolver.resolve_entry(entry, &cwd);
        info!("Bundling {}", entry.display());

        let graph = GraphBuilder::new(&self.assets, &self.resolver).build_graph(&entry)?;
        graph
            .validate()
            .context("dependency graph failed validation")?;
        self.report_cycles(&graph);

        let options = EmitOptions {
            module_cache: self.config.module_cache,
            root: entry.parent().map(Path::to_path_buf),
        };
        let code = emit(&graph, &options)?;

        info!(
            "Bundled {} modules into {} bytes",
            graph.len(),
            code.len()
        );
        Ok(BundleOutput { graph, code })
    }

    /// Bundle `entry` and write the result to `output`
    ///
    /// Nothing is written unless the whole build succeeds. Missing parent
    /// directories of `output` are created.
    pub fn bundle_to_file(&self, entry: &Path, output: &Path) -> Result<BundleOutput> {
        let result = self.bundle(entry)?;

        if let Some(parent) = output.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        std::fs::write(output, &result.code)
            .with_context(|| format!("failed to write bundle to {}", output.display()))?;

        info!("Wrote bundle to {}", output.display());
        Ok(result)
    }

    fn report_cycles(&self, graph: &DependencyGraph) {
        let root: Option<PathBuf> = graph.entry().map(|entry| entry.directory().to_path_buf());

        for cycle in graph.cycles() {
            let members = cycle
                .iter()
                .filter_map(|id| graph.get(*id))
                .map(|asset| display_relative(&asset.absolute_path, root.as_deref()))
                .collect::<Vec<_>>()
                .join(", ");

            if self.config.module_cache {
                warn!("Circular import between: {members}");
            } else {
                warn!(
                    "Circular import between: {members}; with the module cache disabled the \
                     bundle will recurse without bound when it reaches this cycle"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;
    use crate::{error::BundleError, types::AssetId};

    #[test]
    fn test_bundle_in_memory() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("entry.js"),
            "import { greet } from './greet.js';\nconsole.log(greet('world'));\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("greet.js"),
            "export const greet = (name) => `hello ${name}`;\n",
        )
        .unwrap();

        let output = BundleOrchestrator::new(Config::default())
            .bundle(&dir.path().join("entry.js"))
            .unwrap();

        assert_eq!(output.graph.len(), 2);
        assert_eq!(
            output.graph.entry().unwrap().mapping.get("./greet.js"),
            Some(&AssetId::new(1))
        );
        assert!(output.code.contains("// 0: entry.js"));
        assert!(output.code.contains("// 1: greet.js"));
        assert!(!output.code.contains("=>"));
    }

    #[test]
    fn test_bundle_to_file_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("entry.js"), "console.log(1);\n").unwrap();
        let output = dir.path().join("dist/nested/bundle.js");

        let result = BundleOrchestrator::new(Config::default())
            .bundle_to_file(&dir.path().join("entry.js"), &output)
            .unwrap();

        assert_eq!(std::fs::read_to_string(&output).unwrap(), result.code);
    }

    #[test]
    fn test_failed_build_writes_nothing() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("entry.js"), "import './gone.js';\n").unwrap();
        let output = dir.path().join("bundle.js");

        let err = BundleOrchestrator::new(Config::default())
            .bundle_to_file(&dir.path().join("entry.js"), &output)
            .unwrap_err();

        let bundle_err = err.downcast_ref::<BundleError>().unwrap();
        assert!(bundle_err.failing_path().ends_with("gone.js"));
        assert!(!output.exists());
    }
}
