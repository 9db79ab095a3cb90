// src/config/validate.rs

use std::collections::HashMap;
use std::path::Path;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{BundleError, Result};
use crate::resolve::FilePattern;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = BundleError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.bundle))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_bundles(cfg)?;
    validate_global_config(cfg)?;
    validate_bundle_paths(cfg)?;
    validate_bundle_files(cfg)?;
    Ok(())
}

fn ensure_has_bundles(cfg: &RawConfigFile) -> Result<()> {
    if cfg.bundle.is_empty() {
        return Err(BundleError::Config(
            "config must contain at least one [bundle.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.listen_addr().is_none() {
        return Err(BundleError::Config(format!(
            "[config].listen is not a socket address: {:?}",
            cfg.config.listen
        )));
    }
    if cfg.config.workers == 0 {
        return Err(BundleError::Config(
            "[config].workers must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.config.root.as_os_str().is_empty() {
        return Err(BundleError::Config(
            "[config].root must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_bundle_paths(cfg: &RawConfigFile) -> Result<()> {
    let mut seen: HashMap<String, &str> = HashMap::new();
    for (name, bundle) in cfg.bundle.iter() {
        let path = bundle.path.trim().trim_start_matches('/');
        if path.is_empty() {
            return Err(BundleError::Config(format!(
                "bundle '{name}' has an empty `path`"
            )));
        }
        if let Some(other) = seen.insert(path.to_ascii_lowercase(), name) {
            return Err(BundleError::Config(format!(
                "bundles '{other}' and '{name}' share the path {:?}",
                bundle.path
            )));
        }
    }
    Ok(())
}

fn validate_bundle_files(cfg: &RawConfigFile) -> Result<()> {
    for (name, bundle) in cfg.bundle.iter() {
        if bundle.files.is_empty() {
            return Err(BundleError::Config(format!(
                "bundle '{name}' must list at least one pattern in `files`"
            )));
        }
        for pattern in &bundle.files {
            FilePattern::parse(pattern, Path::new(".")).map_err(|e| {
                BundleError::Config(format!("bundle '{name}': {e}"))
            })?;
        }
    }
    Ok(())
}
