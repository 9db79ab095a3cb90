// src/cache/slot.rs

//! Per-bundle-path state: active digest, dirty flag and watches.
//!
//! ```text
//! Empty --request--> Fresh --write under watched dir--> Dirty --request--> Fresh ...
//! ```
//!
//! Rebuilds are lazy: a watch notification only raises the dirty flag and
//! the next request pays for the rebuild.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::build::{Bundle, BundleBuilder, Digest};
use crate::cache::store::BundleStore;
use crate::cache::watcher::WatchGroup;
use crate::errors::{BundleError, Result};
use crate::resolve::compile_patterns;
use crate::types::MinificationMode;

/// Attempts at fetching the active bundle when a concurrent rebuild evicts
/// it between reading the key and reading the store.
const FETCH_ATTEMPTS: usize = 3;

/// Static description of a registered bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotConfig {
    /// Request path, always starting with `/`.
    pub bundle_path: String,
    pub content_type: String,
    pub mode: MinificationMode,
    pub patterns: Vec<String>,
}

/// Behaviour switches shared by every slot of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotPolicy {
    /// Keep serving the last good bundle when a rebuild fails.
    pub serve_stale_on_error: bool,
    /// Attach filesystem watches; without them a slot builds once.
    pub watch: bool,
}

impl Default for SlotPolicy {
    fn default() -> Self {
        Self {
            serve_stale_on_error: false,
            watch: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Never built successfully.
    Empty,
    /// Active bundle matches the last observed sources.
    Fresh,
    /// Sources changed since the active bundle was built.
    Dirty,
}

/// Lifecycle of a slot's watch group.
#[derive(Debug)]
enum WatchState {
    Uninitialized,
    Initializing,
    Ready(WatchGroup),
    Disabled,
}

/// Observable summary of [`WatchState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchStatus {
    Uninitialized,
    Initializing,
    Ready,
    Disabled,
}

#[derive(Debug)]
pub struct BundleSlot {
    config: SlotConfig,
    policy: SlotPolicy,
    builder: Arc<BundleBuilder>,
    store: Arc<BundleStore>,
    active: RwLock<Option<Digest>>,
    dirty: Arc<AtomicBool>,
    /// Set while a rebuild holds `build_lock`; keeps the fast path from
    /// handing out the superseded key.
    rebuilding: AtomicBool,
    build_lock: Mutex<()>,
    watch: Mutex<WatchState>,
    rebuilds: AtomicU64,
}

impl BundleSlot {
    pub fn new(
        config: SlotConfig,
        policy: SlotPolicy,
        builder: Arc<BundleBuilder>,
        store: Arc<BundleStore>,
    ) -> Self {
        let watch = if policy.watch {
            WatchState::Uninitialized
        } else {
            WatchState::Disabled
        };
        Self {
            config,
            policy,
            builder,
            store,
            active: RwLock::new(None),
            dirty: Arc::new(AtomicBool::new(true)),
            rebuilding: AtomicBool::new(false),
            build_lock: Mutex::new(()),
            watch: Mutex::new(watch),
            rebuilds: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &SlotConfig {
        &self.config
    }

    pub fn bundle_path(&self) -> &str {
        &self.config.bundle_path
    }

    pub fn state(&self) -> SlotState {
        match (*self.active.read(), self.dirty.load(Ordering::Acquire)) {
            (None, _) => SlotState::Empty,
            (Some(_), true) => SlotState::Dirty,
            (Some(_), false) => SlotState::Fresh,
        }
    }

    pub fn active_digest(&self) -> Option<Digest> {
        *self.active.read()
    }

    /// Number of successful rebuilds so far.
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds.load(Ordering::Acquire)
    }

    /// Force a rebuild on the next request.
    pub fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    pub fn watch_status(&self) -> WatchStatus {
        match &*self.watch.lock() {
            WatchState::Uninitialized => WatchStatus::Uninitialized,
            WatchState::Initializing => WatchStatus::Initializing,
            WatchState::Ready(_) => WatchStatus::Ready,
            WatchState::Disabled => WatchStatus::Disabled,
        }
    }

    pub fn watched_dirs(&self) -> Vec<PathBuf> {
        match &*self.watch.lock() {
            WatchState::Ready(group) => group.dirs().map(Path::to_path_buf).collect(),
            _ => Vec::new(),
        }
    }

    /// Stop watching; the slot keeps serving its current bundle.
    pub fn detach_watches(&self) {
        *self.watch.lock() = WatchState::Disabled;
    }

    /// Return the bundle to serve, rebuilding first if the slot is empty or
    /// dirty.
    pub fn current(&self, root: &Path) -> Result<Bundle> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let digest = self.ensure_fresh(root)?;
            match self.store.get(&digest) {
                Ok(bundle) => return Ok(bundle),
                // Superseded by a rebuild on another thread; the slot now
                // points at the replacement.
                Err(BundleError::NotFound(_)) if attempt < FETCH_ATTEMPTS => continue,
                Err(e) => return Err(e),
            }
        }
    }

    fn ensure_fresh(&self, root: &Path) -> Result<Digest> {
        if !self.dirty.load(Ordering::SeqCst) && !self.rebuilding.load(Ordering::SeqCst) {
            if let Some(digest) = *self.active.read() {
                return Ok(digest);
            }
        }

        let _guard = self.build_lock.lock();

        let previous = *self.active.read();
        if let (false, Some(digest)) = (self.dirty.load(Ordering::SeqCst), previous) {
            debug!(bundle = %self.config.bundle_path, "rebuild already done by another request");
            return Ok(digest);
        }

        // Raised before the dirty flag drops, lowered after the key is
        // swapped, so every fast-path reader in between waits on the lock.
        self.rebuilding.store(true, Ordering::SeqCst);
        // Clear before building so a change that lands mid-build re-arms it.
        self.dirty.store(false, Ordering::SeqCst);
        let outcome = self.rebuild(root, previous);
        if outcome.is_err() {
            self.dirty.store(true, Ordering::SeqCst);
        }
        self.rebuilding.store(false, Ordering::SeqCst);

        match outcome {
            Ok(digest) => Ok(digest),
            Err(err) => {
                match previous {
                    Some(stale) if self.policy.serve_stale_on_error => {
                        warn!(
                            bundle = %self.config.bundle_path,
                            error = %err,
                            digest = %stale,
                            "rebuild failed; serving last good bundle"
                        );
                        Ok(stale)
                    }
                    _ => {
                        error!(bundle = %self.config.bundle_path, error = %err, "rebuild failed");
                        Err(err)
                    }
                }
            }
        }
    }

    fn rebuild(&self, root: &Path, previous: Option<Digest>) -> Result<Digest> {
        let files = self.builder.resolve(&self.config.patterns, root)?;

        // Watch before reading so edits made during the build are seen.
        // Pattern bases are watched too, so files created where nothing
        // matched yet still mark the slot dirty.
        let mut dirs = files.parent_dirs();
        let fs = self.builder.file_system();
        for pattern in compile_patterns(&self.config.patterns, root)? {
            if !pattern.is_exclusion() && fs.is_dir(pattern.base_dir()) {
                dirs.insert(pattern.base_dir().to_path_buf());
            }
        }
        self.attach_watches(dirs.into_iter().collect());

        let bundle = self.builder.build(&files, self.config.mode, root)?;
        let digest = bundle.digest();

        if previous != Some(digest) {
            self.store.put(bundle);
            *self.active.write() = Some(digest);
            if let Some(old) = previous {
                self.store.remove(&old);
            }
            info!(
                bundle = %self.config.bundle_path,
                digest = %digest,
                previous = ?previous,
                "active bundle replaced"
            );
        } else {
            debug!(bundle = %self.config.bundle_path, %digest, "rebuild produced identical bundle");
        }

        self.rebuilds.fetch_add(1, Ordering::AcqRel);
        Ok(digest)
    }

    /// Make sure every directory in `dirs` is watched.
    fn attach_watches(&self, dirs: Vec<PathBuf>) {
        let mut state = self.watch.lock();
        if let WatchState::Ready(group) = &mut *state {
            let added = group.watch_dirs(dirs);
            if added > 0 {
                debug!(bundle = %self.config.bundle_path, added, "watching new source directories");
            }
            return;
        }
        if !matches!(*state, WatchState::Uninitialized) {
            return;
        }
        *state = WatchState::Initializing;
        drop(state);

        let group = WatchGroup::new(&self.config.bundle_path, Arc::clone(&self.dirty)).map(
            |mut group| {
                group.watch_dirs(dirs);
                group
            },
        );

        let mut state = self.watch.lock();
        // Torn down while we were setting up.
        if matches!(*state, WatchState::Disabled) {
            return;
        }
        *state = match group {
            Ok(group) => WatchState::Ready(group),
            Err(err) => {
                warn!(bundle = %self.config.bundle_path, error = %err, "could not start file watcher");
                WatchState::Uninitialized
            }
        };
    }
}
