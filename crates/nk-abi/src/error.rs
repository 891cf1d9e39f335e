// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for layout measurement and assertion emission.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for nk-abi operations
pub type Result<T> = std::result::Result<T, LayoutError>;

/// Errors raised while resolving, measuring or emitting layouts.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// Lookup of a native descriptor that has no registry entry.
    #[error("native type `{native}` is not registered")]
    NotRegistered { native: String },

    /// A registry entry does not name a complete, sized type.
    #[error("unresolvable type `{native}` (bound to `{foreign}`): {reason}")]
    UnresolvableType {
        native: String,
        foreign: String,
        reason: String,
    },

    /// The destination file could not be created, written or replaced.
    #[error("failed to write {}: {source}", .path.display())]
    OutputWriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The Odin package name is not an identifier.
    #[error("invalid package name `{0}`")]
    InvalidPackage(String),

    /// The configured C compiler could not be started.
    #[error("C compiler `{compiler}` is unavailable: {source}")]
    CompilerUnavailable {
        compiler: String,
        #[source]
        source: std::io::Error,
    },

    /// The layout probe failed to compile for a reason not tied to one entry.
    #[error("layout probe failed to compile with `{compiler}`:\n{stderr}")]
    ProbeCompile { compiler: String, stderr: String },

    /// The compiled probe exited unsuccessfully.
    #[error("layout probe exited with {status}:\n{stderr}")]
    ProbeRun { status: String, stderr: String },

    /// The probe printed something that is not a size table.
    #[error("malformed layout probe output: {0}")]
    ProbeOutput(String),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    #[error("invalid configuration {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },

    #[error("invalid layout report: {0}")]
    Report(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LayoutError {
    /// Build an `UnresolvableType` error for a native/foreign pair.
    pub fn unresolvable(
        native: impl Into<String>,
        foreign: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::UnresolvableType {
            native: native.into(),
            foreign: foreign.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn write_failure(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::OutputWriteFailure {
            path: path.into(),
            source,
        }
    }
}
