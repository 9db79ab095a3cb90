// src/build/mod.rs

//! Bundle construction: read → compile → aggregate → minify → digest.
//!
//! The builder is stateless apart from its collaborators (filesystem,
//! transform table, options) and can be shared freely between threads.

pub mod digest;
pub mod minify;
pub mod templates;
pub mod transform;

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::errors::{BundleError, Result};
use crate::fs::{FileSystem, RealFileSystem};
use crate::resolve::path_utils::display_name;
use crate::resolve::{ResolvedFileSet, resolve};
use crate::types::{MinificationMode, MissingFilePolicy, SourceKind};

pub use digest::Digest;
pub use templates::{DEFAULT_TEMPLATE_MODULE, Template};
pub use transform::{CommandCompiler, Compiler, Lenient, TransformTable};

/// An immutable, fully built bundle.
///
/// Cloning is cheap: the payload is shared.
#[derive(Clone, PartialEq, Eq)]
pub struct Bundle {
    digest: Digest,
    bytes: Arc<[u8]>,
}

impl fmt::Debug for Bundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bundle")
            .field("digest", &self.digest)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl Bundle {
    fn from_text(text: String) -> Self {
        let bytes: Arc<[u8]> = Arc::from(text.into_bytes());
        Self {
            digest: Digest::of(&bytes),
            bytes,
        }
    }

    pub fn digest(&self) -> Digest {
        self.digest
    }

    pub fn etag(&self) -> String {
        self.digest.etag()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The payload as a shared buffer, for handing to responses.
    pub fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    /// Bundles are always built from UTF-8 text.
    pub fn text(&self) -> &str {
        std::str::from_utf8(&self.bytes).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Knobs that apply to every build.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub missing_files: MissingFilePolicy,
    /// Angular module name for the HTML template registry.
    pub template_module: String,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            missing_files: MissingFilePolicy::default(),
            template_module: DEFAULT_TEMPLATE_MODULE.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BundleBuilder {
    fs: Arc<dyn FileSystem>,
    transforms: Arc<TransformTable>,
    options: BuildOptions,
}

impl Default for BundleBuilder {
    fn default() -> Self {
        Self::new(Arc::new(RealFileSystem))
    }
}

impl BundleBuilder {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            transforms: Arc::new(TransformTable::standard()),
            options: BuildOptions::default(),
        }
    }

    pub fn with_transforms(mut self, transforms: TransformTable) -> Self {
        self.transforms = Arc::new(transforms);
        self
    }

    pub fn with_options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    pub fn file_system(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    /// Expand `patterns` under `root` using this builder's filesystem.
    pub fn resolve<S: AsRef<str>>(&self, patterns: &[S], root: &Path) -> Result<ResolvedFileSet> {
        resolve(self.fs.as_ref(), patterns, root)
    }

    /// Resolve and build in one go.
    pub fn build_patterns<S: AsRef<str>>(
        &self,
        patterns: &[S],
        mode: MinificationMode,
        root: &Path,
    ) -> Result<Bundle> {
        let files = self.resolve(patterns, root)?;
        self.build(&files, mode, root)
    }

    /// Build a bundle from an already resolved file set.
    pub fn build(&self, files: &ResolvedFileSet, mode: MinificationMode, root: &Path) -> Result<Bundle> {
        let text = self.aggregate(files, root)?;
        let text = minify::minify(mode, text)?;
        let bundle = Bundle::from_text(text);

        info!(
            files = files.len(),
            ?mode,
            digest = %bundle.digest(),
            bytes = bundle.len(),
            "bundle built"
        );
        Ok(bundle)
    }

    /// Concatenate compiled regular files, then append the template registry.
    fn aggregate(&self, files: &ResolvedFileSet, root: &Path) -> Result<String> {
        let mut out = String::new();
        let mut templates = Vec::new();

        for path in files.iter() {
            let kind = SourceKind::from_path(path);
            let Some(source) = self.read_source(path)? else {
                continue;
            };
            let name = display_name(root, path);

            if kind.is_template() {
                templates.push(Template { key: name, text: source });
                continue;
            }

            let compiled = self
                .transforms
                .transform(kind, source)
                .map_err(|e| BundleError::Compile {
                    path: path.clone(),
                    kind,
                    message: format!("{e:#}"),
                })?;
            debug!(file = %name, ?kind, "added source to bundle");

            out.push('\n');
            out.push_str("\n/* ");
            out.push_str(&banner_safe(&name));
            out.push_str(" */\n");
            out.push_str(&compiled);
        }

        out.push_str(&templates::render_registry(
            &self.options.template_module,
            &templates,
        ));
        Ok(out)
    }

    fn read_source(&self, path: &Path) -> Result<Option<String>> {
        match self.fs.read_to_string(path) {
            Ok(text) => Ok(Some(text)),
            Err(e)
                if e.kind() == std::io::ErrorKind::NotFound
                    && self.options.missing_files == MissingFilePolicy::Skip =>
            {
                warn!(file = ?path, "source file vanished; leaving it out of the bundle");
                Ok(None)
            }
            Err(e) => Err(BundleError::fs(path, e)),
        }
    }
}

/// A path segment ending in `*` would close the banner comment early.
fn banner_safe(name: &str) -> String {
    name.replace("*/", "*\\/")
}
