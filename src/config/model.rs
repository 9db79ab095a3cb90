// src/config/model.rs

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Deserialize;

use crate::build::DEFAULT_TEMPLATE_MODULE;
use crate::types::{BundleKind, MinificationMode, MissingFilePolicy};

/// Configuration exactly as read from `Bundlekit.toml`, before validation.
///
/// ```toml
/// [config]
/// root = "."
/// listen = "127.0.0.1:8080"
///
/// [bundle.styles]
/// path = "/styles.css"
/// kind = "style"
/// files = ["css/pure.css", "css/*.css", "!css/print.css"]
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    /// All bundles from `[bundle.<name>]`, keyed by name.
    #[serde(default)]
    pub bundle: BTreeMap<String, BundleConfig>,
}

/// Validated configuration. Only obtainable through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub bundles: BTreeMap<String, BundleConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        bundles: BTreeMap<String, BundleConfig>,
    ) -> Self {
        Self { config, bundles }
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigSection {
    /// Application root the bundle patterns are relative to. A relative
    /// root is taken relative to the config file's directory.
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Address the `serve` host binds.
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Request worker threads for the host.
    #[serde(default = "default_workers")]
    pub workers: usize,

    #[serde(default)]
    pub missing_files: MissingFilePolicy,

    #[serde(default)]
    pub serve_stale_on_error: bool,

    /// Angular module name for the HTML template registry.
    #[serde(default = "default_template_module")]
    pub template_module: String,

    /// Watch source directories and rebuild on change.
    #[serde(default = "default_watch")]
    pub watch: bool,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_listen() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_workers() -> usize {
    4
}

fn default_template_module() -> String {
    DEFAULT_TEMPLATE_MODULE.to_string()
}

fn default_watch() -> bool {
    true
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            root: default_root(),
            listen: default_listen(),
            workers: default_workers(),
            missing_files: MissingFilePolicy::default(),
            serve_stale_on_error: false,
            template_module: default_template_module(),
            watch: default_watch(),
        }
    }
}

impl ConfigSection {
    /// `listen` as a socket address; validation guarantees it parses.
    pub fn listen_addr(&self) -> Option<SocketAddr> {
        self.listen.parse().ok()
    }
}

/// `[bundle.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BundleConfig {
    /// Request path the bundle is served under, e.g. `/styles.css`.
    pub path: String,

    pub kind: BundleKind,

    #[serde(default = "default_minify")]
    pub minify: bool,

    /// Overrides the kind's default content type.
    #[serde(default)]
    pub content_type: Option<String>,

    /// Ordered include / `!`exclude patterns.
    pub files: Vec<String>,
}

fn default_minify() -> bool {
    true
}

impl BundleConfig {
    pub fn effective_content_type(&self) -> String {
        self.content_type
            .clone()
            .unwrap_or_else(|| self.kind.content_type().to_string())
    }

    pub fn minification(&self) -> MinificationMode {
        self.kind.minification(self.minify)
    }
}
