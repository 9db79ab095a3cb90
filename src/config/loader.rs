// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{BundleError, Result};

/// Read and deserialize a config file without semantic validation.
///
/// Use [`load_and_validate`] unless you need the raw form.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| BundleError::fs(path, e))?;
    parse_str(&contents)
}

/// Deserialize config text.
pub fn parse_str(contents: &str) -> Result<RawConfigFile> {
    Ok(toml::from_str(contents)?)
}

/// Load a config file and validate it.
///
/// - Reads TOML.
/// - Applies defaults (`serde` + `Default` impls).
/// - Checks bundle paths, patterns and the listen address.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    ConfigFile::try_from(raw_config)
}

/// `Bundlekit.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Bundlekit.toml")
}

/// Directory the config's relative `root` is anchored to.
pub fn config_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// The application root for a config loaded from `config_path`.
pub fn resolve_root(config: &ConfigFile, config_path: &Path) -> PathBuf {
    let root = &config.config.root;
    if root.is_absolute() {
        root.clone()
    } else {
        config_dir(config_path).join(root)
    }
}
