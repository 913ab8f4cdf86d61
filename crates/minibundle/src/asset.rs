//! Asset records and the resolver that produces them
//!
//! An asset is one source file turned into everything the bundle needs: its
//! id, the raw import specifiers it declares, and its lowered code. The
//! resolver knows nothing about the graph; the specifier → id `mapping` is
//! filled in later by the graph builder.

use std::path::{Path, PathBuf};

use log::debug;
use sha2::{Digest, Sha256};

use crate::{
    error::BundleError,
    transpiler::{Downleveler, SourceParser, SwcDownleveler, SwcParser, TargetPreset},
    types::{AssetId, AssetIdAllocator, DependencyMapping},
    visitors::import_discovery::collect_import_specifiers,
};

/// One resolved source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Dense, 0-based id in first-visit order
    pub id: AssetId,
    /// Canonical path; relative specifiers of this asset resolve against its directory
    pub absolute_path: PathBuf,
    /// Import specifiers exactly as written, in document order, duplicates kept
    pub dependency_specifiers: Vec<String>,
    /// Lowered code body
    pub code: String,
    /// SHA-256 of the original source text (hex-encoded)
    pub content_hash: String,
    /// Specifier → dependency id, populated by the graph builder
    pub mapping: DependencyMapping,
}

impl Asset {
    /// Directory that this asset's relative specifiers are resolved against
    pub fn directory(&self) -> &Path {
        self.absolute_path.parent().unwrap_or_else(|| Path::new("/"))
    }

    /// First eight hex digits of the content hash, for logs and annotations
    pub fn short_hash(&self) -> &str {
        &self.content_hash[..self.content_hash.len().min(8)]
    }
}

/// Turns a file path into an [`Asset`]
pub struct AssetResolver<P = SwcParser, D = SwcDownleveler> {
    parser: P,
    downleveler: D,
    preset: TargetPreset,
}

impl<P, D> std::fmt::Debug for AssetResolver<P, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetResolver")
            .field("preset", &self.preset)
            .finish_non_exhaustive()
    }
}

impl Default for AssetResolver {
    fn default() -> Self {
        Self::new(SwcParser, SwcDownleveler)
    }
}

impl<P: SourceParser, D: Downleveler> AssetResolver<P, D> {
    pub fn new(parser: P, downleveler: D) -> Self {
        Self {
            parser,
            downleveler,
            preset: TargetPreset::default(),
        }
    }

    /// Read, parse and lower `path`, taking the next id from `ids`
    ///
    /// The id is only consumed once the source has parsed, so a failing
    /// file never leaves a gap in an otherwise successful numbering.
    pub fn create_asset(
        &self,
        path: &Path,
        ids: &mut AssetIdAllocator,
    ) -> Result<Asset, BundleError> {
        let source = std::fs::read_to_string(path).map_err(|source| BundleError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let tree = self
            .parser
            .parse(path, &source)
            .map_err(|failure| BundleError::Parse {
                path: path.to_path_buf(),
                message: failure.message,
                line: failure.line,
                column: failure.column,
            })?;

        let dependency_specifiers = collect_import_specifiers(&tree.module);
        let id = ids.next_id();

        let code = self
            .downleveler
            .downlevel(tree, self.preset)
            .map_err(|failure| BundleError::Transform {
                path: path.to_path_buf(),
                message: failure.message,
            })?;

        let content_hash = format!("{:x}", Sha256::digest(source.as_bytes()));

        let asset = Asset {
            id,
            absolute_path: path.to_path_buf(),
            dependency_specifiers,
            code,
            content_hash,
            mapping: DependencyMapping::default(),
        };

        debug!(
            "Created asset {} for {} ({} specifiers, hash {})",
            asset.id,
            path.display(),
            asset.dependency_specifiers.len(),
            asset.short_hash()
        );

        Ok(asset)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_create_asset_collects_specifiers_and_assigns_ids() {
        let dir = TempDir::new().unwrap();
        let entry = write(
            &dir,
            "entry.js",
            "import a from './a.js';\nimport { b } from './b.js';\nconsole.log(a, b);\n",
        );
        let leaf = write(&dir, "leaf.js", "export default 1;\n");

        let resolver = AssetResolver::new(SwcParser, SwcDownleveler);
        let mut ids = AssetIdAllocator::new();

        let first = resolver.create_asset(&entry, &mut ids).unwrap();
        let second = resolver.create_asset(&leaf, &mut ids).unwrap();

        assert_eq!(first.id, AssetId::ENTRY);
        assert_eq!(second.id, AssetId::new(1));
        assert_eq!(first.dependency_specifiers, vec!["./a.js", "./b.js"]);
        assert!(second.dependency_specifiers.is_empty());
        assert!(first.mapping.is_empty());
        assert_eq!(first.content_hash.len(), 64);
        assert_eq!(first.directory(), dir.path());
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.js");
        let mut ids = AssetIdAllocator::new();

        let err = AssetResolver::new(SwcParser, SwcDownleveler)
            .create_asset(&missing, &mut ids)
            .unwrap_err();

        assert!(matches!(&err, BundleError::Read { path, .. } if *path == missing));
        assert_eq!(ids.allocated(), 0);
    }

    #[test]
    fn test_malformed_source_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let bad = write(&dir, "bad.js", "const = 1;\n");
        let mut ids = AssetIdAllocator::new();

        let err = AssetResolver::new(SwcParser, SwcDownleveler)
            .create_asset(&bad, &mut ids)
            .unwrap_err();

        assert!(matches!(err, BundleError::Parse { line: 1, .. }), "{err}");
        assert_eq!(ids.allocated(), 0);
    }

    #[test]
    fn test_unsupported_module_syntax_is_transform_error() {
        let dir = TempDir::new().unwrap();
        let reexport = write(&dir, "reexport.js", "export * from './other.js';\n");
        let mut ids = AssetIdAllocator::new();

        let err = AssetResolver::new(SwcParser, SwcDownleveler)
            .create_asset(&reexport, &mut ids)
            .unwrap_err();

        assert!(matches!(err, BundleError::Transform { .. }), "{err}");
    }
}
