// src/cache/watcher.rs

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use notify::event::{AccessKind, EventKind, MetadataKind, ModifyKind};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, warn};

use crate::errors::Result;

/// Recursive watches over the source directories of one bundle.
///
/// The notify callback runs on notify's own thread and does nothing but
/// raise the shared dirty flag; the rebuild happens lazily on the next
/// request. Dropping the group stops watching.
pub struct WatchGroup {
    watcher: RecommendedWatcher,
    dirs: BTreeSet<PathBuf>,
}

impl std::fmt::Debug for WatchGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchGroup").field("dirs", &self.dirs).finish()
    }
}

impl WatchGroup {
    /// Create an empty group that sets `dirty` on any write under a watched
    /// directory.
    pub fn new(bundle_path: &str, dirty: Arc<AtomicBool>) -> Result<Self> {
        let bundle = bundle_path.to_string();
        let watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if is_write(&event.kind) => {
                    if !dirty.swap(true, Ordering::AcqRel) {
                        debug!(bundle = %bundle, paths = ?event.paths, "source changed; bundle marked dirty");
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(bundle = %bundle, error = %err, "file watch error");
                }
            },
            Config::default(),
        )?;

        Ok(Self {
            watcher,
            dirs: BTreeSet::new(),
        })
    }

    /// Start watching every directory in `dirs` not already covered by an
    /// existing (recursive) watch. Returns how many watches were added.
    ///
    /// A directory that cannot be watched is logged and skipped; the bundle
    /// still serves, it just will not refresh on changes there.
    pub fn watch_dirs<I>(&mut self, dirs: I) -> usize
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut added = 0;
        for dir in dirs {
            let dir = dir.canonicalize().unwrap_or(dir);
            if self.covers(&dir) {
                continue;
            }
            match self.watcher.watch(&dir, RecursiveMode::Recursive) {
                Ok(()) => {
                    info!(dir = ?dir, "watching source directory");
                    // Drop nested watches now subsumed by this one.
                    let nested: Vec<PathBuf> = self
                        .dirs
                        .iter()
                        .filter(|d| d.starts_with(&dir))
                        .cloned()
                        .collect();
                    for d in nested {
                        let _ = self.watcher.unwatch(&d);
                        self.dirs.remove(&d);
                    }
                    self.dirs.insert(dir);
                    added += 1;
                }
                Err(err) => {
                    warn!(dir = ?dir, error = %err, "could not watch source directory");
                }
            }
        }
        added
    }

    /// Whether `dir` lies under a directory already being watched.
    pub fn covers(&self, dir: &Path) -> bool {
        self.dirs.iter().any(|d| dir.starts_with(d))
    }

    pub fn dirs(&self) -> impl Iterator<Item = &Path> {
        self.dirs.iter().map(PathBuf::as_path)
    }
}

/// Content-affecting notifications: creates, removes, data writes, renames.
/// Pure reads and access-time updates are ignored.
fn is_write(kind: &EventKind) -> bool {
    match kind {
        EventKind::Access(AccessKind::Close(notify::event::AccessMode::Write)) => true,
        EventKind::Access(_) => false,
        EventKind::Modify(ModifyKind::Metadata(MetadataKind::AccessTime)) => false,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => true,
        EventKind::Any | EventKind::Other => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, RemoveKind};

    #[test]
    fn classifies_write_events() {
        assert!(is_write(&EventKind::Modify(ModifyKind::Data(DataChange::Content))));
        assert!(is_write(&EventKind::Create(CreateKind::File)));
        assert!(is_write(&EventKind::Remove(RemoveKind::File)));
        assert!(!is_write(&EventKind::Access(AccessKind::Read)));
        assert!(!is_write(&EventKind::Modify(ModifyKind::Metadata(
            MetadataKind::AccessTime
        ))));
    }

    #[test]
    fn nested_directories_are_covered_by_parent_watch() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();

        let mut group = WatchGroup::new("/t.js", Arc::new(AtomicBool::new(false))).unwrap();
        assert_eq!(group.watch_dirs([dir.path().to_path_buf()]), 1);
        assert_eq!(group.watch_dirs([nested]), 0);
        assert_eq!(group.dirs().count(), 1);
    }
}
