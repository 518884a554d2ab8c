// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for the shim build pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Result type for shim build operations
pub type Result<T> = std::result::Result<T, BuildError>;

/// Errors that abort a shim build
///
/// Every variant is fatal to the whole pipeline; nothing is retried.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A logical module name matched no source file, or more than one
    #[error("Cannot resolve shim '{module}': {reason}")]
    CatalogResolution {
        /// Logical module name
        module: String,
        /// Why resolution failed
        reason: String,
    },

    /// The bundling engine failed for a module
    #[error("Bundling '{module}' failed: {message}")]
    BundleEngine {
        /// Logical module name
        module: String,
        /// Engine diagnostic
        message: String,
    },

    /// Sanitized output still contains a construct the host cannot run
    #[error("Forbidden pattern in '{module}': {pattern}")]
    ForbiddenPattern {
        /// Logical module name
        module: String,
        /// Description of the matched pattern
        pattern: String,
    },

    /// Reading or writing a source, staging or output file failed
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl BuildError {
    /// Create a catalog resolution error
    pub fn unresolved(module: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CatalogResolution {
            module: module.into(),
            reason: reason.into(),
        }
    }

    /// Create a bundling engine error
    pub fn engine(module: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BundleEngine {
            module: module.into(),
            message: message.into(),
        }
    }

    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Logical module name the error is attributed to, if any
    pub fn module(&self) -> Option<&str> {
        match self {
            Self::CatalogResolution { module, .. }
            | Self::BundleEngine { module, .. }
            | Self::ForbiddenPattern { module, .. } => Some(module),
            Self::Io { .. } | Self::Config(_) => None,
        }
    }
}
