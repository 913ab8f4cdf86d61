//! Bundler configuration
//!
//! Settings come from three layers, later layers overriding earlier ones:
//! built-in defaults, a `minibundle.toml` file, and command-line flags.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::debug;
use serde::Deserialize;

/// File name looked up in the working directory when no `--config` is given
pub const CONFIG_FILE_NAME: &str = "minibundle.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Entry module, used when none is passed on the command line
    pub entry: Option<PathBuf>,
    /// Output file; the bundle is written to stdout when unset
    pub output: Option<PathBuf>,
    /// Cache module instances by id inside the emitted runtime
    pub module_cache: bool,
    /// Extensions tried, in order, for specifiers that do not name a file
    pub extensions: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            entry: None,
            output: None,
            module_cache: true,
            extensions: vec![".js".to_owned(), ".mjs".to_owned()],
        }
    }
}

impl Config {
    /// Parse a configuration document
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("invalid minibundle configuration")
    }

    /// Load configuration from an explicit file
    ///
    /// Relative `entry`/`output` paths are interpreted relative to the
    /// directory containing the file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let mut config = Self::from_toml_str(&contents)
            .with_context(|| format!("failed to load config file {}", path.display()))?;

        if let Some(base) = path.parent() {
            config.entry = config.entry.map(|p| base.join(p));
            config.output = config.output.map(|p| base.join(p));
        }

        debug!("Loaded configuration from {}: {config:?}", path.display());
        Ok(config)
    }

    /// Load configuration from `explicit` when given, otherwise from
    /// `minibundle.toml` in `search_dir` if it exists, otherwise defaults.
    pub fn load(explicit: Option<&Path>, search_dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let candidate = search_dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Self::from_file(&candidate);
        }

        debug!("No {CONFIG_FILE_NAME} found in {}, using defaults", search_dir.display());
        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.module_cache);
        assert_eq!(config.extensions, vec![".js", ".mjs"]);
        assert!(config.entry.is_none());
    }

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config = Config::from_toml_str("module_cache = false\n").unwrap();
        assert_eq!(
            config,
            Config {
                module_cache: false,
                ..Config::default()
            }
        );
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(Config::from_toml_str("tree_shaking = true\n").is_err());
    }

    #[test]
    fn test_load_resolves_paths_relative_to_config_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "entry = \"src/main.js\"\noutput = \"dist/bundle.js\"\nextensions = [\".js\"]\n",
        )
        .unwrap();

        let config = Config::load(None, dir.path()).unwrap();
        assert_eq!(config.entry, Some(dir.path().join("src/main.js")));
        assert_eq!(config.output, Some(dir.path().join("dist/bundle.js")));
        assert_eq!(config.extensions, vec![".js"]);
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        assert_eq!(Config::load(None, dir.path()).unwrap(), Config::default());
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(Some(&dir.path().join("nope.toml")), dir.path()).unwrap_err();
        assert!(err.to_string().contains("nope.toml"));
    }
}
