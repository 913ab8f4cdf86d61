//! Import specifier → file path resolution
//!
//! Specifiers are resolved relative to the importing file's directory only;
//! there is no package lookup for bare specifiers.

use std::path::{Path, PathBuf};

use log::{trace, warn};

use crate::{config::Config, util::normalize_path};

#[derive(Debug, Clone)]
pub struct ModuleResolver {
    /// Extensions tried, in order, when a specifier does not name a file
    extensions: Vec<String>,
}

impl Default for ModuleResolver {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl ModuleResolver {
    pub fn new(config: &Config) -> Self {
        Self {
            extensions: config.extensions.clone(),
        }
    }

    /// Canonicalize a path, handling errors gracefully
    fn canonicalize_path(&self, path: PathBuf) -> PathBuf {
        match path.canonicalize() {
            Ok(canonical) => canonical,
            Err(e) => {
                // Log warning but don't fail - return the original path
                warn!("Failed to canonicalize path {}: {}", path.display(), e);
                path
            }
        }
    }

    /// Resolve the entry path, relative to `cwd` when it is not absolute
    pub fn resolve_entry(&self, entry: &Path, cwd: &Path) -> PathBuf {
        let joined = if entry.is_absolute() {
            entry.to_path_buf()
        } else {
            cwd.join(entry)
        };
        self.locate(normalize_path(&joined))
    }

    /// Resolve `specifier` as written in a module living in `importer_dir`
    ///
    /// When no candidate exists the normalized joined path is returned, so the
    /// subsequent read reports exactly that path.
    pub fn resolve_specifier(&self, importer_dir: &Path, specifier: &str) -> PathBuf {
        let joined = normalize_path(&importer_dir.join(specifier));
        let resolved = self.locate(joined);
        trace!(
            "Resolved '{specifier}' from {} to {}",
            importer_dir.display(),
            resolved.display()
        );
        resolved
    }

    /// Probe `path`, then `path<ext>`, then `path/index<ext>`
    fn locate(&self, path: PathBuf) -> PathBuf {
        if path.is_file() {
            return self.canonicalize_path(path);
        }

        for ext in &self.extensions {
            let mut with_ext = path.clone().into_os_string();
            with_ext.push(ext);
            let candidate = PathBuf::from(with_ext);
            if candidate.is_file() {
                return self.canonicalize_path(candidate);
            }
        }

        if path.is_dir() {
            for ext in &self.extensions {
                let candidate = path.join(format!("index{ext}"));
                if candidate.is_file() {
                    return self.canonicalize_path(candidate);
                }
            }
        }

        path
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("src/lib")).unwrap();
        std::fs::write(dir.path().join("src/entry.js"), "").unwrap();
        std::fs::write(dir.path().join("src/util.js"), "").unwrap();
        std::fs::write(dir.path().join("src/lib/index.js"), "").unwrap();
        std::fs::write(dir.path().join("src/lib/helpers.mjs"), "").unwrap();
        dir
    }

    fn canonical(dir: &TempDir, rel: &str) -> PathBuf {
        dir.path().join(rel).canonicalize().unwrap()
    }

    #[test]
    fn test_exact_file() {
        let dir = fixture();
        let resolver = ModuleResolver::default();
        let src = dir.path().join("src");
        assert_eq!(
            resolver.resolve_specifier(&src, "./util.js"),
            canonical(&dir, "src/util.js")
        );
    }

    #[test]
    fn test_extension_probing() {
        let dir = fixture();
        let resolver = ModuleResolver::default();
        let lib = dir.path().join("src/lib");
        assert_eq!(
            resolver.resolve_specifier(&lib, "../util"),
            canonical(&dir, "src/util.js")
        );
        assert_eq!(
            resolver.resolve_specifier(&lib, "./helpers"),
            canonical(&dir, "src/lib/helpers.mjs")
        );
    }

    #[test]
    fn test_directory_index() {
        let dir = fixture();
        let resolver = ModuleResolver::default();
        let src = dir.path().join("src");
        assert_eq!(
            resolver.resolve_specifier(&src, "./lib"),
            canonical(&dir, "src/lib/index.js")
        );
    }

    #[test]
    fn test_missing_specifier_returns_normalized_path() {
        let dir = fixture();
        let resolver = ModuleResolver::default();
        let src = dir.path().join("src");
        assert_eq!(
            resolver.resolve_specifier(&src, "./lib/../nope.js"),
            src.join("nope.js")
        );
    }

    #[test]
    fn test_no_extension_probing_when_disabled() {
        let dir = fixture();
        let resolver = ModuleResolver::new(&Config {
            extensions: Vec::new(),
            ..Config::default()
        });
        let src = dir.path().join("src");
        assert_eq!(resolver.resolve_specifier(&src, "./util"), src.join("util"));
    }

    #[test]
    fn test_relative_entry() {
        let dir = fixture();
        let resolver = ModuleResolver::default();
        assert_eq!(
            resolver.resolve_entry(Path::new("./src/entry.js"), dir.path()),
            canonical(&dir, "src/entry.js")
        );
    }
}
