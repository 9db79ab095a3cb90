// src/cache/store.rs

//! Content-addressable bundle storage shared by all slots.

use dashmap::DashMap;
use tracing::debug;

use crate::build::{Bundle, Digest};
use crate::errors::{BundleError, Result};

#[derive(Debug)]
struct Entry {
    bundle: Bundle,
    /// Number of slots currently pointing at this digest.
    holders: usize,
}

/// Concurrent map from digest to bundle.
///
/// Two slots that happen to build byte-identical output share one entry;
/// the entry is evicted once the last of them moves on.
#[derive(Debug, Default)]
pub struct BundleStore {
    bundles: DashMap<Digest, Entry>,
}

impl BundleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `bundle` and return its key.
    ///
    /// If the digest is already present the stored bundle is kept (its bytes
    /// are identical) and one more holder is recorded.
    pub fn put(&self, bundle: Bundle) -> Digest {
        let digest = bundle.digest();
        self.bundles
            .entry(digest)
            .and_modify(|e| e.holders += 1)
            .or_insert_with(|| Entry { bundle, holders: 1 });
        debug!(%digest, "bundle published");
        digest
    }

    pub fn get(&self, digest: &Digest) -> Result<Bundle> {
        self.bundles
            .get(digest)
            .map(|e| e.bundle.clone())
            .ok_or_else(|| BundleError::NotFound(digest.to_hex()))
    }

    pub fn contains(&self, digest: &Digest) -> bool {
        self.bundles.contains_key(digest)
    }

    /// Release one holder of `digest`; returns true if the bundle was evicted.
    pub fn remove(&self, digest: &Digest) -> bool {
        let last = match self.bundles.get_mut(digest) {
            Some(mut e) => {
                e.holders = e.holders.saturating_sub(1);
                e.holders == 0
            }
            None => return false,
        };
        if !last {
            return false;
        }
        let evicted = self
            .bundles
            .remove_if(digest, |_, e| e.holders == 0)
            .is_some();
        if evicted {
            debug!(%digest, "bundle evicted");
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }
}
