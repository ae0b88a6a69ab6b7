// Copyright 2025 Framebench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Command implementations.

use crate::config::HarnessConfig;
use anyhow::{bail, Context, Result};
use colored::Colorize;
use framebench_adapters::engine::{EngineBuild, ExternalEngineAdapter};
use framebench_adapters::registry::in_process_frameworks;
use framebench_adapters::{
    create_adapter, resolve_frameworks, run_calibrated, AdapterContext, FrameworkAdapter, Suite,
};
use framebench_benchmarks::{
    io, markdown, store, CalibratedRun, CalibrationConfig, Calibrator, ComparisonReporter,
    ResultMatrix, ResultStore, StepProfiler,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Load the configured suite with dataset paths resolved and scaled.
fn load_suite(config: &HarnessConfig, scale: u32) -> Result<Suite> {
    let path = config.resolve(&config.suite);
    let suite = Suite::load(&path)
        .with_context(|| format!("failed to load suite {}", path.display()))?
        .with_root(&config.repo_root);
    suite
        .scaled(scale, &config.work_dir().join("data"))
        .with_context(|| format!("failed to scale datasets by {}", scale))
}

/// Benchmark every query on every configured framework.
///
/// All adapters are built before anything is measured, so a bad framework
/// name or a missing engine build fails without partial output. After
/// that, the first failing query stops the run; results gathered up to it
/// are still written.
pub fn run(config: &HarnessConfig) -> Result<()> {
    let suite = load_suite(config, config.scale)?;
    let frameworks = resolve_frameworks(&config.frameworks, config.single_thread)?;
    let work_dir = config.work_dir();

    let ctx = AdapterContext {
        suite: &suite,
        repo_root: &config.repo_root,
        work_dir: &work_dir,
        build_dir: config.build_dir.as_deref(),
        engine: &config.engine,
    };
    let mut adapters = frameworks
        .iter()
        .map(|name| {
            create_adapter(name, &ctx).with_context(|| format!("cannot run framework '{}'", name))
        })
        .collect::<Result<Vec<_>>>()?;

    info!(
        frameworks = ?frameworks,
        scale = config.scale,
        min_seconds = config.min_seconds,
        "starting run"
    );

    let mut results = ResultStore::new();
    let mut calibrated = Vec::new();
    let outcome = measure_all(config, &mut adapters, &mut results, &mut calibrated);
    if let Err(e) = &outcome {
        warn!(error = %e, completed = results.len(), "run stopped early");
    }

    persist(config, &results)?;

    let reporter = ComparisonReporter::default();
    let comparison = reporter.compare(&ResultMatrix::from_store(&results));
    println!();
    print!("{}", markdown::render_comparison(&comparison));
    if !calibrated.is_empty() {
        println!();
        print!(
            "{}",
            markdown::render_calibrated(&calibrated, &reporter.layout().baseline)
        );
    }

    outcome
}

fn measure_all(
    config: &HarnessConfig,
    adapters: &mut [Box<dyn FrameworkAdapter>],
    results: &mut ResultStore,
    calibrated: &mut Vec<CalibratedRun>,
) -> Result<()> {
    for adapter in adapters.iter_mut() {
        let framework = adapter.framework().to_string();
        println!("\n{}", format!("▶ {}", framework).bold().green());

        for query in adapter.queries() {
            if config.min_seconds > 0.0 {
                let calibrator = Calibrator::new(CalibrationConfig {
                    probe_count: config.probe_count,
                    min_op_ms: config.min_probe_ms,
                    ..adapter.calibration()
                });
                let run = run_calibrated(adapter.as_mut(), &query, &calibrator, config.min_seconds)
                    .with_context(|| format!("{} failed on query '{}'", framework, query))?;
                println!(
                    "  {:<28} {:>12} ms  rows={:<8} repeats={}",
                    query,
                    format!("{:.3}", run.result.avg_latency_ms).cyan(),
                    run.result.result_rows,
                    run.repeats
                );
                results.append(run.result.clone());
                calibrated.push(run);
            } else {
                let result = adapter
                    .run_query(&query, config.warmup, config.iterations)
                    .with_context(|| format!("{} failed on query '{}'", framework, query))?;
                println!(
                    "  {:<28} {:>12} ms  rows={}",
                    query,
                    format!("{:.3}", result.avg_latency_ms).cyan(),
                    result.result_rows
                );
                results.append(result);
            }
        }
    }
    Ok(())
}

/// Write the result file and any requested exports. Nothing is written
/// for an empty run.
fn persist(config: &HarnessConfig, results: &ResultStore) -> Result<()> {
    if results.is_empty() {
        return Ok(());
    }

    let output = config.resolve(&config.output);
    results
        .serialize(&output)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!("\n{} {}", "Results written to".bold(), output.display());

    if let Some(json) = &config.json {
        let json = config.resolve(json);
        io::write_results_json(results, &json)?;
        println!("{} {}", "JSON written to".bold(), json.display());
    }
    if let Some(summary) = &config.summary {
        let summary = config.resolve(summary);
        io::write_summary(results, &summary)?;
        println!("{} {}", "Summary written to".bold(), summary.display());
    }
    Ok(())
}

/// Time the suite pipeline on the external engine one prefix at a time.
pub fn profile(config: &HarnessConfig) -> Result<()> {
    let suite = load_suite(config, config.scale)?;
    if suite.pipeline.is_empty() {
        bail!(
            "suite {} defines no pipeline steps",
            config.suite.display()
        );
    }

    let build = EngineBuild::discover(
        &config.repo_root,
        config.build_dir.as_deref(),
        &config.engine,
    )?;
    let mut engine = ExternalEngineAdapter::new(
        config.engine.clone(),
        build,
        &config.repo_root,
        &config.work_dir(),
        &suite,
    );

    info!(
        steps = suite.pipeline.len(),
        runs = config.profile_runs,
        repeat = config.profile_repeat,
        "profiling pipeline"
    );
    let profiler = StepProfiler::new(config.profile_runs, config.profile_repeat);
    let rows = profiler
        .profile(&mut engine, &suite.pipeline)
        .context("pipeline profile failed")?;

    println!();
    print!(
        "{}",
        markdown::render_step_profile(&rows, profiler.runs_per_step(), profiler.inner_repeat())
    );
    Ok(())
}

/// Result files in `dir` with a `.tsv` extension, sorted by name.
fn result_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("cannot read results directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "tsv"))
        .collect();
    paths.sort();
    Ok(paths)
}

/// Print the comparison of the given result files, or of every result
/// file in the results directory.
pub fn report(config: &HarnessConfig, paths: &[PathBuf]) -> Result<()> {
    let paths = if paths.is_empty() {
        let dir = config.resolve(&config.results_dir);
        let found = result_files(&dir)?;
        if found.is_empty() {
            bail!("no result files in {}", dir.display());
        }
        found
    } else {
        paths.to_vec()
    };

    let matrix = store::load(paths.as_slice())?;
    let comparison = ComparisonReporter::default().compare(&matrix);
    print!("{}", markdown::render_comparison(&comparison));
    Ok(())
}

/// Print the resolved configuration, the engine build, and the compiled-in
/// libraries.
pub fn status(config: &HarnessConfig, detailed: bool) -> Result<()> {
    println!("{}", "framebench".bold());
    println!("Version: {}", env!("CARGO_PKG_VERSION"));

    println!("\n{}", "Configuration:".bold());
    print!("{}", toml::to_string_pretty(config)?);

    println!("\n{}", "Engine:".bold());
    match EngineBuild::discover(&config.repo_root, config.build_dir.as_deref(), &config.engine) {
        Ok(build) => {
            println!("  {} {}", "found".green(), build.binary.display());
            println!("  plugins: {}", build.plugin_dir.display());
        }
        Err(e) => println!("  {} {}", "unavailable:".red(), e),
    }

    let libraries = in_process_frameworks();
    println!("\n{}", "In-process libraries:".bold());
    if libraries.is_empty() {
        println!("  none (build with --features polars,duckdb)");
    } else {
        println!("  {}", libraries.join(", "));
    }

    if detailed {
        let path = config.resolve(&config.suite);
        let suite = Suite::load(&path)
            .with_context(|| format!("failed to load suite {}", path.display()))?;
        println!("\n{} {}", "Suite:".bold(), path.display());
        for q in &suite.queries {
            let scope = if q.engine_only { "engine only" } else { "all" };
            println!("  - {} ({}, {})", q.name, q.dataset, scope);
        }
        if !suite.pipeline.is_empty() {
            println!(
                "  - {} ({} steps)",
                suite.pipeline_name(),
                suite.pipeline.len()
            );
        }
    }
    Ok(())
}
