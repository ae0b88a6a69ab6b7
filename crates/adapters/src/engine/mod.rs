// Copyright 2025 Framebench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Out-of-process engine adapter.
//!
//! Each measurement spawns the engine binary, feeds it
//! `:load <script>` / `:quit` on standard input and waits for it to exit.
//! With [`BatchStrategy::InlineBatch`] a batch of N executions is one
//! script holding N copies of the query body, so the elapsed time of one
//! process covers N executions and spawn cost is amortized.

pub mod build;
pub mod runner;
pub mod script;

pub use build::EngineBuild;
pub use runner::{check_output, parse_rows, Invocation, ProcessOutput, ProcessRunner, SystemRunner};
pub use script::ScriptWriter;

use crate::error::{AdapterError, Result};
use crate::suite::{pipeline_body, EngineQuery, Suite};
use crate::{BatchRun, FrameworkAdapter};
use framebench_benchmarks::{BenchmarkResult, CalibrationConfig, PipelineStep, StepRunner};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// How repeated executions map onto processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BatchStrategy {
    /// N executions inlined into one script, one process.
    #[default]
    InlineBatch,
    /// One process per execution.
    ProcessPerCall,
}

/// External engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Framework name results are recorded under.
    pub framework: String,
    /// Binary path relative to the build directory.
    pub binary: PathBuf,
    /// Build directories probed in priority order, relative to the repo root.
    pub build_candidates: Vec<PathBuf>,
    /// Plugin directories probed in priority order, relative to the build.
    pub plugin_candidates: Vec<PathBuf>,
    /// Environment variable carrying the plugin directory.
    pub library_env: String,
    /// Case-insensitive output text marking a failed run. Empty disables.
    pub error_marker: String,
    /// Batch strategy.
    pub strategy: BatchStrategy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            framework: "ibex".to_string(),
            binary: PathBuf::from("tools/ibex"),
            build_candidates: vec![PathBuf::from("build-release"), PathBuf::from("build")],
            plugin_candidates: vec![PathBuf::from("libs/csv"), PathBuf::from("libraries")],
            library_env: "IBEX_LIBRARY_PATH".to_string(),
            error_marker: "error:".to_string(),
            strategy: BatchStrategy::InlineBatch,
        }
    }
}

/// Adapter driving the external engine as a subprocess.
pub struct ExternalEngineAdapter<R: ProcessRunner = SystemRunner> {
    config: EngineConfig,
    build: EngineBuild,
    repo_root: PathBuf,
    scripts: ScriptWriter,
    queries: Vec<EngineQuery>,
    runner: R,
}

impl ExternalEngineAdapter<SystemRunner> {
    /// Create an adapter spawning real processes. Scripts are written under
    /// `<work_dir>/scripts`.
    pub fn new(
        config: EngineConfig,
        build: EngineBuild,
        repo_root: impl Into<PathBuf>,
        work_dir: &Path,
        suite: &Suite,
    ) -> Self {
        Self::with_runner(config, build, repo_root, work_dir, suite, SystemRunner)
    }
}

impl<R: ProcessRunner> ExternalEngineAdapter<R> {
    /// Create an adapter with a custom process runner.
    pub fn with_runner(
        config: EngineConfig,
        build: EngineBuild,
        repo_root: impl Into<PathBuf>,
        work_dir: &Path,
        suite: &Suite,
        runner: R,
    ) -> Self {
        Self {
            config,
            build,
            repo_root: repo_root.into(),
            scripts: ScriptWriter::new(work_dir.join("scripts"), suite),
            queries: suite.engine_queries(),
            runner,
        }
    }

    /// The engine build in use.
    pub fn build(&self) -> &EngineBuild {
        &self.build
    }

    fn invocation(&self, script: &Path) -> Invocation {
        Invocation {
            program: self.build.binary.clone(),
            cwd: self.repo_root.clone(),
            env: vec![(
                self.config.library_env.clone(),
                self.build.plugin_dir.display().to_string(),
            )],
            stdin: format!(":load {}\n:quit\n", script.display()),
        }
    }

    /// Run one script to completion and apply the failure policy.
    pub fn run_script(&self, script: &Path, stage: &str) -> Result<ProcessOutput> {
        let output = self.runner.run(&self.invocation(script))?;
        check_output(&output, &self.config.error_marker, stage)?;
        debug!(
            script = %script.display(),
            stage,
            elapsed_s = output.elapsed.as_secs_f64(),
            "engine run"
        );
        Ok(output)
    }

    fn query(&self, name: &str) -> Result<&EngineQuery> {
        self.queries
            .iter()
            .find(|q| q.name == name)
            .ok_or_else(|| AdapterError::UnknownQuery(name.to_string()))
    }

    fn batch(&self, query: &EngineQuery, repeats: u64, stage: &str) -> Result<BatchRun> {
        let repeats = repeats.max(1);
        match self.config.strategy {
            BatchStrategy::InlineBatch => {
                let script = self
                    .scripts
                    .write(&query.name, &query.datasets, &query.body, repeats)?;
                let output = self.run_script(&script, stage)?;
                Ok(BatchRun {
                    elapsed: output.elapsed,
                    rows: parse_rows(&output.stdout),
                })
            }
            BatchStrategy::ProcessPerCall => {
                let script = self.scripts.write(&query.name, &query.datasets, &query.body, 1)?;
                let mut elapsed = Duration::ZERO;
                let mut rows = 0;
                for _ in 0..repeats {
                    let output = self.run_script(&script, stage)?;
                    elapsed += output.elapsed;
                    rows = parse_rows(&output.stdout);
                }
                Ok(BatchRun { elapsed, rows })
            }
        }
    }
}

impl<R: ProcessRunner> FrameworkAdapter for ExternalEngineAdapter<R> {
    fn framework(&self) -> &str {
        &self.config.framework
    }

    fn queries(&self) -> Vec<String> {
        self.queries.iter().map(|q| q.name.clone()).collect()
    }

    fn run_batch(&mut self, query: &str, repeats: u64) -> Result<BatchRun> {
        let query = self.query(query)?;
        self.batch(query, repeats, &format!("batch of {}", repeats.max(1)))
    }

    fn run_query(&mut self, query: &str, warmup: u64, iterations: u64) -> Result<BenchmarkResult> {
        let q = self.query(query)?;
        let iterations = iterations.max(1);

        // Inline warm-ups run the same script as the measurement; per-call
        // warm-ups are single spawns.
        let warmup_batch = match self.config.strategy {
            BatchStrategy::InlineBatch => iterations,
            BatchStrategy::ProcessPerCall => 1,
        };
        for _ in 0..warmup {
            self.batch(q, warmup_batch, "warmup")?;
        }
        let run = self.batch(q, iterations, "measure")?;

        let result =
            BenchmarkResult::from_batch(&self.config.framework, query, run.elapsed, iterations, run.rows);
        info!(
            framework = %result.framework,
            query = %result.query,
            avg_ms = result.avg_latency_ms,
            rows = result.result_rows,
            "query measured"
        );
        Ok(result)
    }

    fn calibration(&self) -> CalibrationConfig {
        CalibrationConfig::for_batched_process()
    }
}

impl<R: ProcessRunner> StepRunner for ExternalEngineAdapter<R> {
    type Error = AdapterError;

    fn run_steps(&mut self, steps: &[PipelineStep], repeat: u64) -> Result<Duration> {
        let name = format!("profile_{}", steps.len());
        let script = self.scripts.write(
            &name,
            &self.scripts.dataset_names(),
            &pipeline_body(steps),
            repeat,
        )?;
        let output = self.run_script(&script, &format!("step profile (step {})", steps.len()))?;
        Ok(output.elapsed)
    }
}
