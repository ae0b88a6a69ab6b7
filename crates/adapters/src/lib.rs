// Copyright 2025 Framebench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Framework adapters.
//!
//! This crate provides the canonical [`FrameworkAdapter`] trait and its
//! implementations: the out-of-process [`engine::ExternalEngineAdapter`]
//! and the in-process [`inprocess::InProcessAdapter`] over a
//! [`inprocess::TableEngine`] (polars and duckdb behind cargo features).

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod dataset;
pub mod engine;
pub mod error;
pub mod inprocess;
pub mod query;
pub mod registry;
pub mod suite;

#[cfg(feature = "duckdb")]
pub mod duckdb_engine;
#[cfg(feature = "polars")]
pub mod polars_engine;

pub use error::{AdapterError, Result};
pub use registry::{create_adapter, resolve_frameworks, AdapterContext};
pub use suite::Suite;

use framebench_benchmarks::{BenchmarkResult, CalibratedRun, CalibrationConfig, Calibrator};
use std::time::Duration;
use tracing::info;

/// Elapsed time and result cardinality of one batch of executions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchRun {
    /// Wall clock for the whole batch.
    pub elapsed: Duration,
    /// Rows produced by the last execution.
    pub rows: u64,
}

/// Canonical framework adapter trait.
///
/// Implement this trait for any framework that should be benchmarkable
/// through the uniform timing protocol.
pub trait FrameworkAdapter {
    /// Framework name results are recorded under.
    fn framework(&self) -> &str;

    /// Queries this adapter can run, in suite order.
    fn queries(&self) -> Vec<String>;

    /// Execute `query` `repeats` times (at least once) as one timed batch.
    fn run_batch(&mut self, query: &str, repeats: u64) -> Result<BatchRun>;

    /// Warm up `warmup` times, then measure `iterations` executions.
    fn run_query(&mut self, query: &str, warmup: u64, iterations: u64) -> Result<BenchmarkResult>;

    /// Calibration settings suited to this adapter.
    fn calibration(&self) -> CalibrationConfig {
        CalibrationConfig::default()
    }
}

/// Calibrate a repeat count for `query` so the measured batch lasts at
/// least `min_seconds`, and return the measurement taken at that count.
pub fn run_calibrated<A: FrameworkAdapter + ?Sized>(
    adapter: &mut A,
    query: &str,
    calibrator: &Calibrator,
    min_seconds: f64,
) -> Result<CalibratedRun> {
    let framework = adapter.framework().to_string();
    let mut rows = 0;
    let calibration = calibrator.calibrate(
        |repeats| -> Result<Duration> {
            let run = adapter.run_batch(query, repeats)?;
            rows = run.rows;
            Ok(run.elapsed)
        },
        min_seconds,
    )?;

    let result = BenchmarkResult::new(&framework, query, calibration.avg_ms, rows);
    info!(
        framework = %framework,
        query,
        repeats = calibration.repeats,
        total_s = calibration.total.as_secs_f64(),
        avg_ms = calibration.avg_ms,
        "calibrated run"
    );
    Ok(CalibratedRun {
        result,
        repeats: calibration.repeats,
        total_seconds: calibration.total.as_secs_f64(),
    })
}
