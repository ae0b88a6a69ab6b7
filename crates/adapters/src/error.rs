// Copyright 2025 Framebench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Adapter error type.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while configuring or running a framework adapter.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// No candidate build directory contains the engine binary.
    #[error("no engine build found (searched: {})", display_paths(.searched))]
    NoBuildFound {
        /// Directories probed, in priority order.
        searched: Vec<PathBuf>,
    },

    /// The engine build has no plugin directory.
    #[error("engine plugin directory not found (searched: {})", display_paths(.searched))]
    MissingPlugin {
        /// Directories probed, in priority order.
        searched: Vec<PathBuf>,
    },

    /// Dataset scale factor below 1.
    #[error("scale must be >= 1, got {0}")]
    InvalidScale(u32),

    /// Framework name not known to the harness.
    #[error("unknown framework: {0}")]
    UnknownFramework(String),

    /// Framework known but compiled out.
    #[error("framework {framework} is not available; rebuild with the `{feature}` feature")]
    FrameworkUnavailable {
        /// Requested framework.
        framework: String,
        /// Cargo feature that enables it.
        feature: String,
    },

    /// Two requested frameworks cannot be measured in one process.
    #[error("{0} and {1} cannot run in the same process; run them separately and merge the result files")]
    ConflictingFrameworks(String, String),

    /// A query references a dataset the suite does not define.
    #[error("unknown dataset: {0}")]
    UnknownDataset(String),

    /// The adapter has no query with this name.
    #[error("unknown query: {0}")]
    UnknownQuery(String),

    /// Malformed suite definition.
    #[error("invalid suite: {0}")]
    Suite(String),

    /// The external engine exited non-zero or reported an error.
    #[error(
        "engine failed during {stage} (exit code {}):\n{stdout}\n{stderr}",
        display_code(.exit_code)
    )]
    EngineFailed {
        /// What the harness was doing when the run failed.
        stage: String,
        /// Exit code, `None` when the process was killed by a signal.
        exit_code: Option<i32>,
        /// Captured standard output.
        stdout: String,
        /// Captured standard error.
        stderr: String,
    },

    /// An in-process engine returned an error.
    #[error("engine error: {0}")]
    Engine(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Suite parse error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl AdapterError {
    /// True for errors detected before any measurement begins.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::NoBuildFound { .. }
                | Self::MissingPlugin { .. }
                | Self::InvalidScale(_)
                | Self::UnknownFramework(_)
                | Self::FrameworkUnavailable { .. }
                | Self::ConflictingFrameworks(..)
                | Self::UnknownDataset(_)
                | Self::Suite(_)
                | Self::Toml(_)
        )
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn display_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "none".to_string(), |c| c.to_string())
}

/// Result type for adapter operations.
pub type Result<T> = std::result::Result<T, AdapterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_failure_message_carries_output() {
        let err = AdapterError::EngineFailed {
            stage: "probe".into(),
            exit_code: Some(2),
            stdout: "rows: 1".into(),
            stderr: "error: bad column".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("probe"));
        assert!(msg.contains("exit code 2"));
        assert!(msg.contains("error: bad column"));
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_configuration_classification() {
        let err = AdapterError::NoBuildFound {
            searched: vec![PathBuf::from("build-release"), PathBuf::from("build")],
        };
        assert!(err.is_configuration());
        assert!(err.to_string().contains("build-release, build"));
        assert!(AdapterError::InvalidScale(0).is_configuration());
    }
}
