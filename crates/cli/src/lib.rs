// Copyright 2025 Framebench Contributors
// SPDX-License-Identifier: Apache-2.0

//! CLI for framebench.
//!
//! This crate provides the command-line interface: `run` measures the
//! configured frameworks and persists the results, `profile` attributes
//! pipeline cost per step, `report` compares result files, and `status`
//! shows the resolved configuration.

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod commands;
pub mod config;

use clap::{ArgAction, Args, Parser, Subcommand};
use crate::config::HarnessConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// framebench CLI.
#[derive(Parser, Debug)]
#[command(name = "framebench")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (default: framebench.toml when present).
    #[arg(short, long, global = true, env = "FRAMEBENCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Benchmark every suite query on the selected frameworks.
    ///
    /// Results are written as tab-separated rows and the comparison against
    /// the baseline is printed. Results completed before a failure are still
    /// written.
    Run(RunArgs),

    /// Profile the suite pipeline on the external engine, one step at a time.
    Profile(ProfileArgs),

    /// Compare one or more result files.
    Report(ReportArgs),

    /// Show the resolved configuration and the discovered engine build.
    Status {
        /// Also list the suite's queries.
        #[arg(short, long)]
        detailed: bool,
    },
}

/// Options of `run`.
#[derive(Args, Debug, Default, Clone)]
pub struct RunArgs {
    /// Minimum measured seconds per query; enables calibration.
    #[arg(long)]
    pub min_seconds: Option<f64>,

    /// Repeat scalable dataset rows N times.
    #[arg(long)]
    pub scale: Option<u32>,

    /// Warm-up executions (fixed-iteration mode).
    #[arg(long)]
    pub warmup: Option<u64>,

    /// Measured executions (fixed-iteration mode).
    #[arg(long = "iters")]
    pub iterations: Option<u64>,

    /// Result file.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also export results as JSON.
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Also write a markdown summary.
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Frameworks to run, comma separated.
    #[arg(short, long, value_delimiter = ',')]
    pub frameworks: Option<Vec<String>>,

    /// Run in-process libraries single-threaded.
    #[arg(long)]
    pub single_thread: bool,

    /// Suite file.
    #[arg(long)]
    pub suite: Option<PathBuf>,

    /// Engine build directory.
    #[arg(long)]
    pub build_dir: Option<PathBuf>,
}

/// Options of `profile`.
#[derive(Args, Debug, Default, Clone)]
pub struct ProfileArgs {
    /// Loads per pipeline prefix.
    #[arg(long)]
    pub runs: Option<u64>,

    /// Block repeats inside each load.
    #[arg(long)]
    pub repeat: Option<u64>,

    /// Repeat scalable dataset rows N times.
    #[arg(long)]
    pub scale: Option<u32>,

    /// Suite file.
    #[arg(long)]
    pub suite: Option<PathBuf>,

    /// Engine build directory.
    #[arg(long)]
    pub build_dir: Option<PathBuf>,
}

/// Options of `report`.
#[derive(Args, Debug, Default, Clone)]
pub struct ReportArgs {
    /// Result files; later files override earlier ones. Defaults to every
    /// `.tsv` file in the results directory.
    pub paths: Vec<PathBuf>,
}

impl RunArgs {
    /// Apply the flags that were given on top of `config`.
    pub fn apply(&self, config: &mut HarnessConfig) {
        if let Some(v) = self.min_seconds {
            config.min_seconds = v;
        }
        if let Some(v) = self.scale {
            config.scale = v;
        }
        if let Some(v) = self.warmup {
            config.warmup = v;
        }
        if let Some(v) = self.iterations {
            config.iterations = v;
        }
        if let Some(v) = &self.output {
            config.output = v.clone();
        }
        if let Some(v) = &self.json {
            config.json = Some(v.clone());
        }
        if let Some(v) = &self.summary {
            config.summary = Some(v.clone());
        }
        if let Some(v) = &self.frameworks {
            config.frameworks = v.clone();
        }
        if self.single_thread {
            config.single_thread = true;
        }
        if let Some(v) = &self.suite {
            config.suite = v.clone();
        }
        if let Some(v) = &self.build_dir {
            config.build_dir = Some(v.clone());
        }
    }
}

impl ProfileArgs {
    /// Apply the flags that were given on top of `config`.
    pub fn apply(&self, config: &mut HarnessConfig) {
        if let Some(v) = self.runs {
            config.profile_runs = v;
        }
        if let Some(v) = self.repeat {
            config.profile_repeat = v;
        }
        if let Some(v) = self.scale {
            config.scale = v;
        }
        if let Some(v) = &self.suite {
            config.suite = v.clone();
        }
        if let Some(v) = &self.build_dir {
            config.build_dir = Some(v.clone());
        }
    }
}

/// Install the stderr log subscriber. `RUST_LOG` takes precedence over
/// the verbosity flag.
pub fn init_logging(verbose: u8, json: bool) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    // A subscriber may already be installed when embedded; keep it.
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

/// Run the CLI with the process arguments.
///
/// # Returns
///
/// Returns `Ok(())` on success, or an error if any command step fails.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_json);

    dotenvy::dotenv().ok();
    let mut config = HarnessConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run(args) => {
            args.apply(&mut config);
            commands::run(&config)
        }
        Commands::Profile(args) => {
            args.apply(&mut config);
            commands::profile(&config)
        }
        Commands::Report(args) => commands::report(&config, &args.paths),
        Commands::Status { detailed } => commands::status(&config, detailed),
    }
}
