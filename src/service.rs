// src/service.rs

//! The bundle registry owned by the host.
//!
//! A [`BundleService`] holds every registered bundle path, the shared
//! builder and the shared content-addressable store. Hosts create one at
//! startup, route requests through [`BundleService::handle`] and call
//! [`BundleService::shutdown`] (or drop it) to stop all watches.

use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::build::{BuildOptions, BundleBuilder};
use crate::cache::{BundleSlot, BundleStore, SlotConfig, SlotPolicy};
use crate::config::ConfigFile;
use crate::errors::{BundleError, Result};
use crate::http::{ResponseDescriptor, respond};
use crate::resolve::compile_patterns;
use crate::types::{BundleKind, MinificationMode, SCRIPT_CONTENT_TYPE, STYLE_CONTENT_TYPE};

/// Answers requests for exactly one bundle path.
#[derive(Debug, Clone)]
pub struct BundleHandler {
    slot: Arc<BundleSlot>,
}

impl BundleHandler {
    pub fn path(&self) -> &str {
        self.slot.bundle_path()
    }

    pub fn slot(&self) -> &BundleSlot {
        &self.slot
    }

    /// Bundle paths compare case-insensitively.
    pub fn matches(&self, request_path: &str) -> bool {
        request_path.eq_ignore_ascii_case(self.path())
    }

    /// `Ok(None)` when the request is for some other path.
    pub fn handle(
        &self,
        request_path: &str,
        if_none_match: Option<&str>,
        root: &Path,
    ) -> Result<Option<ResponseDescriptor>> {
        if !self.matches(request_path) {
            return Ok(None);
        }
        let bundle = self.slot.current(root)?;
        let descriptor = respond(&bundle, if_none_match, &self.slot.config().content_type);
        debug!(
            bundle = %self.path(),
            status = descriptor.status,
            digest = %bundle.digest(),
            "answered bundle request"
        );
        Ok(Some(descriptor))
    }
}

#[derive(Debug)]
pub struct BundleService {
    builder: Arc<BundleBuilder>,
    store: Arc<BundleStore>,
    policy: SlotPolicy,
    handlers: RwLock<Vec<BundleHandler>>,
}

impl Default for BundleService {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl BundleService {
    pub fn new(builder: BundleBuilder, policy: SlotPolicy) -> Self {
        Self {
            builder: Arc::new(builder),
            store: Arc::new(BundleStore::new()),
            policy,
            handlers: RwLock::new(Vec::new()),
        }
    }

    /// Real filesystem, standard compilers, watching enabled.
    pub fn with_defaults() -> Self {
        Self::new(BundleBuilder::default(), SlotPolicy::default())
    }

    /// Build a service with every bundle declared in `config` registered.
    pub fn from_config(config: &ConfigFile) -> Result<Self> {
        let settings = &config.config;
        let builder = BundleBuilder::default().with_options(BuildOptions {
            missing_files: settings.missing_files,
            template_module: settings.template_module.clone(),
        });
        let policy = SlotPolicy {
            serve_stale_on_error: settings.serve_stale_on_error,
            watch: settings.watch,
        };
        let service = Self::new(builder, policy);

        for (name, bundle) in &config.bundles {
            service.register(
                &bundle.path,
                bundle.effective_content_type(),
                bundle.minification(),
                bundle.files.clone(),
            )?;
            debug!(name = %name, path = %bundle.path, "bundle declared in config");
        }
        Ok(service)
    }

    pub fn store(&self) -> &Arc<BundleStore> {
        &self.store
    }

    pub fn builder(&self) -> &Arc<BundleBuilder> {
        &self.builder
    }

    /// Register `patterns` under `bundle_path`.
    ///
    /// Nothing is built until the first request. Fails on an empty path, a
    /// path already registered (ignoring case) or a malformed pattern.
    pub fn register<S: Into<String>>(
        &self,
        bundle_path: &str,
        content_type: impl Into<String>,
        mode: MinificationMode,
        patterns: impl IntoIterator<Item = S>,
    ) -> Result<BundleHandler> {
        let bundle_path = normalize_bundle_path(bundle_path)?;
        let patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();

        // Syntax only; the root is supplied per request.
        compile_patterns(&patterns, Path::new("."))?;

        let mut handlers = self.handlers.write();
        if handlers.iter().any(|h| h.matches(&bundle_path)) {
            return Err(BundleError::InvalidArgument(format!(
                "bundle path {bundle_path} is already registered"
            )));
        }

        let slot = BundleSlot::new(
            SlotConfig {
                bundle_path: bundle_path.clone(),
                content_type: content_type.into(),
                mode,
                patterns,
            },
            self.policy,
            Arc::clone(&self.builder),
            Arc::clone(&self.store),
        );
        let handler = BundleHandler {
            slot: Arc::new(slot),
        };
        handlers.push(handler.clone());

        info!(bundle = %bundle_path, ?mode, "bundle registered");
        Ok(handler)
    }

    pub fn register_style<S: Into<String>>(
        &self,
        bundle_path: &str,
        minify: bool,
        patterns: impl IntoIterator<Item = S>,
    ) -> Result<BundleHandler> {
        self.register(
            bundle_path,
            STYLE_CONTENT_TYPE,
            BundleKind::Style.minification(minify),
            patterns,
        )
    }

    pub fn register_script<S: Into<String>>(
        &self,
        bundle_path: &str,
        minify: bool,
        patterns: impl IntoIterator<Item = S>,
    ) -> Result<BundleHandler> {
        self.register(
            bundle_path,
            SCRIPT_CONTENT_TYPE,
            BundleKind::Script.minification(minify),
            patterns,
        )
    }

    pub fn handlers(&self) -> Vec<BundleHandler> {
        self.handlers.read().clone()
    }

    pub fn handler(&self, request_path: &str) -> Option<BundleHandler> {
        self.handlers
            .read()
            .iter()
            .find(|h| h.matches(request_path))
            .cloned()
    }

    /// Route a request to the handler registered for its path.
    pub fn handle(
        &self,
        request_path: &str,
        if_none_match: Option<&str>,
        root: &Path,
    ) -> Result<Option<ResponseDescriptor>> {
        // Clone out so a slow build does not hold the registry lock.
        match self.handler(request_path) {
            Some(handler) => handler.handle(request_path, if_none_match, root),
            None => Ok(None),
        }
    }

    /// Stop every watch and forget all registrations.
    pub fn shutdown(&self) {
        let handlers = std::mem::take(&mut *self.handlers.write());
        for handler in &handlers {
            handler.slot.detach_watches();
        }
        info!(bundles = handlers.len(), "bundle service shut down");
    }
}

impl Drop for BundleService {
    fn drop(&mut self) {
        for handler in self.handlers.get_mut().iter() {
            handler.slot.detach_watches();
        }
    }
}

fn normalize_bundle_path(path: &str) -> Result<String> {
    let path = path.trim();
    if path.is_empty() || path == "/" {
        return Err(BundleError::InvalidArgument(
            "bundle path must not be empty".to_string(),
        ));
    }
    Ok(if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    })
}
