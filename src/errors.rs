// src/errors.rs

//! Crate-wide error type and result alias.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::{MinificationMode, SourceKind};

#[derive(Error, Debug)]
pub enum BundleError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Filesystem error at {path:?}: {source}")]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Compile error in {path:?} ({kind:?}): {message}")]
    Compile {
        path: PathBuf,
        kind: SourceKind,
        message: String,
    },

    #[error("Minification failed ({mode:?}): {message}")]
    Minify {
        mode: MinificationMode,
        message: String,
    },

    #[error("Bundle not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BundleError {
    pub(crate) fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BundleError::FileSystem {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, BundleError>;
