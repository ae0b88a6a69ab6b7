// Copyright 2025 Framebench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Errors for result persistence and reporting.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while persisting or loading results.
#[derive(Debug, Error)]
pub enum BenchError {
    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Tab-separated read/write error
    #[error("Result file error in {path}: {source}")]
    Tsv {
        /// File being read or written
        path: PathBuf,
        /// Underlying csv error
        #[source]
        source: csv::Error,
    },

    /// JSON export error
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// No result files to load
    #[error("No result files given")]
    NoInputs,
}

/// Result type for persistence and reporting operations.
pub type Result<T> = std::result::Result<T, BenchError>;
