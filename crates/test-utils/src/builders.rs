#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use bundlekit::config::{BundleConfig, ConfigFile, ConfigSection, RawConfigFile};
use bundlekit::types::BundleKind;
use tempfile::TempDir;

/// Builder for an on-disk application root in a temporary directory.
#[derive(Default)]
pub struct SiteBuilder {
    files: Vec<(String, Vec<u8>)>,
}

impl SiteBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file at `rel` (relative to the root, `/`-separated).
    pub fn file(mut self, rel: &str, contents: impl Into<Vec<u8>>) -> Self {
        self.files.push((rel.to_string(), contents.into()));
        self
    }

    pub fn build(self) -> Site {
        let dir = tempfile::tempdir().expect("create temp site");
        let site = Site { dir };
        for (rel, contents) in self.files {
            site.write(&rel, contents);
        }
        site
    }
}

/// A temporary application root; removed on drop.
pub struct Site {
    dir: TempDir,
}

impl Site {
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// Create or overwrite a file, creating parent directories.
    pub fn write(&self, rel: &str, contents: impl Into<Vec<u8>>) {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, contents.into()).expect("write site file");
    }

    pub fn remove(&self, rel: &str) {
        let path = self.path(rel);
        if path.is_dir() {
            fs::remove_dir_all(path).expect("remove dir");
        } else {
            fs::remove_file(path).expect("remove file");
        }
    }
}

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                bundle: BTreeMap::new(),
            },
        }
    }

    pub fn with_bundle(mut self, name: &str, bundle: BundleConfig) -> Self {
        self.config.bundle.insert(name.to_string(), bundle);
        self
    }

    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.config.root = root.into();
        self
    }

    pub fn watch(mut self, val: bool) -> Self {
        self.config.config.watch = val;
        self
    }

    pub fn serve_stale_on_error(mut self, val: bool) -> Self {
        self.config.config.serve_stale_on_error = val;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `BundleConfig`.
pub struct BundleConfigBuilder {
    bundle: BundleConfig,
}

impl BundleConfigBuilder {
    pub fn new(path: &str, kind: BundleKind) -> Self {
        Self {
            bundle: BundleConfig {
                path: path.to_string(),
                kind,
                minify: true,
                content_type: None,
                files: vec![],
            },
        }
    }

    pub fn style(path: &str) -> Self {
        Self::new(path, BundleKind::Style)
    }

    pub fn script(path: &str) -> Self {
        Self::new(path, BundleKind::Script)
    }

    pub fn file(mut self, pattern: &str) -> Self {
        self.bundle.files.push(pattern.to_string());
        self
    }

    pub fn minify(mut self, val: bool) -> Self {
        self.bundle.minify = val;
        self
    }

    pub fn content_type(mut self, val: &str) -> Self {
        self.bundle.content_type = Some(val.to_string());
        self
    }

    pub fn build(self) -> BundleConfig {
        self.bundle
    }
}
