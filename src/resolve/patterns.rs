// src/resolve/patterns.rs

use std::fmt;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};
use tracing::debug;

use crate::errors::{BundleError, Result};
use crate::fs::FileSystem;

/// Whether a pattern adds files to the set or removes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Include,
    Exclude,
}

/// What the compiled glob is matched against while walking `base`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchScope {
    /// Only the file name (`css/*.css` matches `css/a.css` and `css/x/b.css`).
    FileName,
    /// The path relative to `base`, used when the directory part itself
    /// contains wildcards (`js/*/app.js`).
    RelativePath,
}

/// A single compiled entry of a bundle's file list.
///
/// The raw form is a `/`-separated path relative to the application root.
/// A leading `!` turns it into an exclusion.
#[derive(Clone)]
pub struct FilePattern {
    raw: String,
    polarity: Polarity,
    base: PathBuf,
    scope: MatchScope,
    matcher: GlobMatcher,
}

impl fmt::Debug for FilePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilePattern")
            .field("raw", &self.raw)
            .field("polarity", &self.polarity)
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

impl FilePattern {
    /// Compile `raw` against `root`.
    pub fn parse(raw: &str, root: &Path) -> Result<Self> {
        let (polarity, body) = match raw.strip_prefix('!') {
            Some(rest) => (Polarity::Exclude, rest),
            None => (Polarity::Include, raw),
        };

        let body = body.trim().replace('\\', "/");
        if body.is_empty() {
            return Err(BundleError::InvalidArgument(format!(
                "empty file pattern: {raw:?}"
            )));
        }

        let segments: Vec<&str> = body.split('/').collect();
        let (file_glob, dirs) = segments
            .split_last()
            .ok_or_else(|| BundleError::InvalidArgument(format!("empty file pattern: {raw:?}")))?;
        if file_glob.is_empty() {
            return Err(BundleError::InvalidArgument(format!(
                "file pattern has no file name part: {raw:?}"
            )));
        }

        // Leading "/" yields an empty first segment; keep it so the joined
        // base stays absolute.
        let first_wild = dirs.iter().position(|s| has_glob_meta(s));
        let (base, scope, glob_src) = match first_wild {
            None => (
                join_segments(root, dirs),
                MatchScope::FileName,
                (*file_glob).to_string(),
            ),
            Some(idx) => (
                join_segments(root, &dirs[..idx]),
                MatchScope::RelativePath,
                segments[idx..].join("/"),
            ),
        };

        let matcher = GlobBuilder::new(&glob_src)
            .literal_separator(scope == MatchScope::FileName)
            .build()
            .map_err(|e| {
                BundleError::InvalidArgument(format!("invalid glob pattern {raw:?}: {e}"))
            })?
            .compile_matcher();

        Ok(Self {
            raw: raw.to_string(),
            polarity,
            base,
            scope,
            matcher,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    pub fn is_exclusion(&self) -> bool {
        self.polarity == Polarity::Exclude
    }

    /// Directory the walk starts from.
    pub fn base_dir(&self) -> &Path {
        &self.base
    }

    /// Returns true if `path` (somewhere under `base_dir`) is selected.
    pub fn matches(&self, path: &Path) -> bool {
        match self.scope {
            MatchScope::FileName => path
                .file_name()
                .is_some_and(|name| self.matcher.is_match(name)),
            MatchScope::RelativePath => match path.strip_prefix(&self.base) {
                Ok(rel) => {
                    let rel = rel.to_string_lossy().replace('\\', "/");
                    self.matcher.is_match(rel.as_str())
                }
                Err(_) => false,
            },
        }
    }

    /// Collect every file under `base_dir` (recursively) matching this pattern.
    ///
    /// A missing base directory yields no files; a directory that cannot be
    /// listed once the walk has started is an error. The result is sorted.
    pub fn collect(&self, fs: &dyn FileSystem) -> Result<Vec<PathBuf>> {
        if !fs.is_dir(&self.base) {
            debug!(pattern = %self.raw, base = ?self.base, "pattern base directory does not exist");
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        let mut stack = vec![self.base.clone()];

        while let Some(dir) = stack.pop() {
            let entries = fs
                .read_dir(&dir)
                .map_err(|e| BundleError::fs(&dir, e))?;
            for path in entries {
                if fs.is_dir(&path) {
                    stack.push(path);
                } else if fs.is_file(&path) && self.matches(&path) {
                    files.push(path);
                }
            }
        }

        files.sort();
        debug!(pattern = %self.raw, matched = files.len(), "pattern expanded");
        Ok(files)
    }
}

fn has_glob_meta(segment: &str) -> bool {
    segment.contains(['*', '?', '[', '{'])
}

fn join_segments(root: &Path, segments: &[&str]) -> PathBuf {
    let mut path = root.to_path_buf();
    for (i, seg) in segments.iter().enumerate() {
        if seg.is_empty() {
            if i == 0 {
                path = PathBuf::from("/");
            }
            continue;
        }
        path.push(seg);
    }
    path
}
