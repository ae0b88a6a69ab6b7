// Copyright 2025 Framebench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Harness configuration.
//!
//! Layers, lowest precedence first: built-in defaults, the configuration
//! file (`framebench.toml` when present, or an explicit `--config`),
//! `FRAMEBENCH__*` environment variables (`__` separates nested keys, e.g.
//! `FRAMEBENCH__ENGINE__ERROR_MARKER`), then command-line flags.

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use framebench_adapters::engine::EngineConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration file read when no explicit path is given.
pub const DEFAULT_CONFIG_FILE: &str = "framebench.toml";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "FRAMEBENCH";

/// Resolved harness settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Repository root; relative paths below resolve against it.
    pub repo_root: PathBuf,
    /// Explicit engine build directory; probed when unset.
    pub build_dir: Option<PathBuf>,
    /// Scratch directory for scripts and scaled datasets.
    pub work_dir: PathBuf,
    /// Suite file.
    pub suite: PathBuf,
    /// Result file written by `run`.
    pub output: PathBuf,
    /// Optional JSON export of the run's results.
    pub json: Option<PathBuf>,
    /// Optional markdown summary of the run's results.
    pub summary: Option<PathBuf>,
    /// Directory `report` reads when given no paths.
    pub results_dir: PathBuf,
    /// Minimum measured seconds per query; 0 uses fixed iterations.
    pub min_seconds: f64,
    /// Warm-up executions for fixed-iteration runs.
    pub warmup: u64,
    /// Measured executions for fixed-iteration runs.
    pub iterations: u64,
    /// Row-count scale factor for scalable datasets.
    pub scale: u32,
    /// Frameworks to run, in order.
    pub frameworks: Vec<String>,
    /// Run in-process libraries single-threaded.
    pub single_thread: bool,
    /// Calibration probe batch size.
    pub probe_count: u64,
    /// Per-execution cost floor used by calibration, in milliseconds.
    pub min_probe_ms: f64,
    /// Loads per prefix when profiling.
    pub profile_runs: u64,
    /// Block repeats inside each profiled load.
    pub profile_repeat: u64,
    /// External engine settings.
    pub engine: EngineConfig,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            repo_root: PathBuf::from("."),
            build_dir: None,
            work_dir: PathBuf::from("target/framebench"),
            suite: PathBuf::from("suites/prices.toml"),
            output: PathBuf::from("results/framebench.tsv"),
            json: None,
            summary: None,
            results_dir: PathBuf::from("results"),
            min_seconds: 0.0,
            warmup: 1,
            iterations: 5,
            scale: 1,
            frameworks: vec!["ibex".to_string()],
            single_thread: false,
            probe_count: 3,
            min_probe_ms: 1.0,
            profile_runs: 3,
            profile_repeat: 8,
            engine: EngineConfig::default(),
        }
    }
}

impl HarnessConfig {
    /// Load from the configuration file and the process environment.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        Self::load_with_env(config_file, environment())
    }

    /// Load from the configuration file and the given environment source.
    pub fn load_with_env(config_file: Option<&Path>, env: Environment) -> Result<Self> {
        let file = match config_file {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        Config::builder()
            .add_source(file)
            .add_source(env)
            .build()
            .context("failed to read configuration")?
            .try_deserialize()
            .context("invalid configuration")
    }

    /// Resolve a configured path against the repository root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.repo_root.join(path)
        }
    }

    /// Absolute-or-root-relative scratch directory.
    pub fn work_dir(&self) -> PathBuf {
        self.resolve(&self.work_dir)
    }
}

/// `FRAMEBENCH__*` variables with `frameworks` parsed as a comma list.
pub fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("frameworks")
        .with_list_parse_key("engine.build_candidates")
        .with_list_parse_key("engine.plugin_candidates")
}
