use std::{fmt::Write as _, path::PathBuf};

use anyhow::{Context, Result};
use log::debug;

use crate::{
    asset::Asset,
    code_generator::runtime::{LOADER_TAIL, loader_head},
    dependency_graph::DependencyGraph,
    util::display_relative,
};

/// Knobs for bundle emission
#[derive(Debug, Clone)]
pub struct EmitOptions {
    /// Evaluate each module once and share its exports between requires
    pub module_cache: bool,
    /// Directory that annotation paths are shown relative to; defaults to the
    /// entry's directory
    pub root: Option<PathBuf>,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            module_cache: true,
            root: None,
        }
    }
}

/// Serialize the whole graph into one executable script
///
/// The output is the loader followed by the module table in id order, so the
/// module with id `i` is element `i` of the table.
pub fn emit(graph: &DependencyGraph, options: &EmitOptions) -> Result<String> {
    let root = options
        .root
        .clone()
        .or_else(|| graph.entry().map(|entry| entry.directory().to_path_buf()));

    let mut bundle = loader_head(options.module_cache);

    for (index, asset) in graph.iter().enumerate() {
        if index > 0 {
            bundle.push(',');
        }
        bundle.push('\n');
        write_module_entry(&mut bundle, asset, root.as_deref())?;
    }

    bundle.push('\n');
    bundle.push_str(LOADER_TAIL);

    debug!(
        "Emitted bundle with {} modules ({} bytes, module cache {})",
        graph.len(),
        bundle.len(),
        if options.module_cache { "on" } else { "off" }
    );

    Ok(bundle)
}

/// `[function (require, module, exports) { ... }, {"./dep": 1}]`
fn write_module_entry(
    out: &mut String,
    asset: &Asset,
    root: Option<&std::path::Path>,
) -> Result<()> {
    let mapping = serde_json::to_string(&asset.mapping).with_context(|| {
        format!(
            "failed to serialize the dependency mapping of {}",
            asset.absolute_path.display()
        )
    })?;

    // Writing to a String cannot fail
    let _ = writeln!(
        out,
        "// {}: {} ({})",
        asset.id,
        display_relative(&asset.absolute_path, root),
        asset.short_hash()
    );
    out.push_str("[function (require, module, exports) {\n");
    out.push_str(&asset.code);
    if !asset.code.ends_with('\n') {
        out.push('\n');
    }
    out.push_str("}, ");
    out.push_str(&mapping);
    out.push(']');
    Ok(())
}
