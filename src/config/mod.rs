// src/config/mod.rs

//! `Bundlekit.toml` loading and validation.
//!
//! - `model.rs`: the TOML-backed data model.
//! - `loader.rs`: reading a config file from disk.
//! - `validate.rs`: raw → validated conversion.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, resolve_root};
pub use model::{BundleConfig, ConfigFile, ConfigSection, RawConfigFile};
