// src/resolve/mod.rs

//! File-set resolution from ordered include / exclude patterns.
//!
//! `resolve` turns a bundle's file list (e.g. `["css/pure.css", "css/*.css",
//! "!css/print.css"]`) into the concrete, ordered list of files the builder
//! reads. Inclusion order is preserved so that vendor files listed first end
//! up first in the bundle.

pub mod path_utils;
pub mod patterns;

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::{BundleError, Result};
use crate::fs::FileSystem;

pub use patterns::{FilePattern, Polarity};

/// Result of resolving a pattern list: included files minus excluded ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedFileSet {
    files: Vec<PathBuf>,
}

impl ResolvedFileSet {
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.iter().any(|f| f == path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.files.iter()
    }

    /// Distinct parent directories of the resolved files.
    pub fn parent_dirs(&self) -> BTreeSet<PathBuf> {
        self.files
            .iter()
            .filter_map(|f| f.parent())
            .map(Path::to_path_buf)
            .collect()
    }
}

impl From<Vec<PathBuf>> for ResolvedFileSet {
    fn from(files: Vec<PathBuf>) -> Self {
        Self { files }
    }
}

impl IntoIterator for ResolvedFileSet {
    type Item = PathBuf;
    type IntoIter = std::vec::IntoIter<PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.into_iter()
    }
}

/// Compile a raw pattern list against `root`.
pub fn compile_patterns<S: AsRef<str>>(patterns: &[S], root: &Path) -> Result<Vec<FilePattern>> {
    if root.as_os_str().is_empty() {
        return Err(BundleError::InvalidArgument(
            "application root path must not be empty".to_string(),
        ));
    }
    patterns
        .iter()
        .map(|p| FilePattern::parse(p.as_ref(), root))
        .collect()
}

/// Expand `patterns` under `root` into a concrete file set.
pub fn resolve<S: AsRef<str>>(
    fs: &dyn FileSystem,
    patterns: &[S],
    root: &Path,
) -> Result<ResolvedFileSet> {
    let compiled = compile_patterns(patterns, root)?;

    let mut seen = HashSet::new();
    let mut included = Vec::new();
    let mut excluded = HashSet::new();

    for pattern in &compiled {
        let matches = pattern.collect(fs)?;
        match pattern.polarity() {
            Polarity::Include => {
                for path in matches {
                    if seen.insert(path.clone()) {
                        included.push(path);
                    }
                }
            }
            Polarity::Exclude => excluded.extend(matches),
        }
    }

    let files: Vec<PathBuf> = included
        .into_iter()
        .filter(|p| !excluded.contains(p))
        .collect();

    debug!(
        patterns = compiled.len(),
        excluded = excluded.len(),
        files = files.len(),
        "resolved bundle file set"
    );
    Ok(ResolvedFileSet { files })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    fn site() -> MockFileSystem {
        let fs = MockFileSystem::new();
        fs.add_file("./css/pure.css", "pure");
        fs.add_file("./css/site.css", "site");
        fs.add_file("./css/skip.css", "skip");
        fs.add_file("./css/theme/dark.css", "dark");
        fs.add_file("./js/app.js", "app");
        fs
    }

    #[test]
    fn first_occurrence_wins_ordering() {
        let fs = site();
        let set = resolve(&fs, &["css/site.css", "css/*.css"], Path::new(".")).unwrap();
        let names: Vec<_> = set.iter().map(|p| p.to_string_lossy().into_owned()).collect();
        assert_eq!(
            names,
            vec![
                "./css/site.css",
                "./css/pure.css",
                "./css/skip.css",
                "./css/theme/dark.css"
            ]
        );
    }

    #[test]
    fn exclusion_beats_inclusion() {
        let fs = site();
        let set = resolve(&fs, &["css/*.css", "!css/skip.css"], Path::new(".")).unwrap();
        assert_eq!(set.len(), 3);
        assert!(!set.contains(Path::new("./css/skip.css")));
    }

    #[test]
    fn missing_directory_contributes_nothing() {
        let fs = site();
        let set = resolve(&fs, &["nope/*.css", "js/*.js"], Path::new(".")).unwrap();
        assert_eq!(set.files(), &[PathBuf::from("./js/app.js")]);
    }

    #[test]
    fn empty_root_is_invalid() {
        let fs = site();
        let err = resolve(&fs, &["*.css"], Path::new("")).unwrap_err();
        assert!(matches!(err, BundleError::InvalidArgument(_)));
    }
}
