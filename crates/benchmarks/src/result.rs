// Copyright 2025 Framebench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Benchmark result types.
//!
//! This module provides the records produced by a benchmark run: one
//! [`BenchmarkResult`] per (framework, query) measurement, the ephemeral
//! [`CalibrationProbe`], and the [`StepProfileRow`] emitted by step profiling.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One averaged measurement of a query on a framework.
///
/// `avg_latency_ms` is always a batch total divided by the repeat count,
/// never a single-shot timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    /// Framework identifier (e.g. `ibex`, `polars-st`).
    pub framework: String,
    /// Query identifier.
    pub query: String,
    /// Average latency per execution in milliseconds.
    pub avg_latency_ms: f64,
    /// Row count of the last result produced.
    pub result_rows: u64,
}

impl BenchmarkResult {
    /// Create a new BenchmarkResult.
    pub fn new(
        framework: impl Into<String>,
        query: impl Into<String>,
        avg_latency_ms: f64,
        result_rows: u64,
    ) -> Self {
        Self {
            framework: framework.into(),
            query: query.into(),
            avg_latency_ms: avg_latency_ms.max(0.0),
            result_rows,
        }
    }

    /// Build a result from a batch total and the number of executions in it.
    pub fn from_batch(
        framework: impl Into<String>,
        query: impl Into<String>,
        total: Duration,
        repeats: u64,
        result_rows: u64,
    ) -> Self {
        Self::new(framework, query, average_ms(total, repeats), result_rows)
    }
}

/// Milliseconds per execution for `repeats` executions taking `total`.
pub fn average_ms(total: Duration, repeats: u64) -> f64 {
    total.as_secs_f64() * 1000.0 / repeats.max(1) as f64
}

/// Result of a calibration probe. Consumed immediately, never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationProbe {
    /// Number of executions in the probe batch (at least 1).
    pub repeats_tried: u64,
    /// Wall-clock seconds the probe batch took.
    pub elapsed_seconds: f64,
}

impl CalibrationProbe {
    /// Estimated milliseconds per execution, floored at `min_op_ms`.
    pub fn per_op_ms(&self, min_op_ms: f64) -> f64 {
        let raw = self.elapsed_seconds * 1000.0 / self.repeats_tried.max(1) as f64;
        raw.max(min_op_ms)
    }
}

/// One row of a cumulative step profile.
///
/// `delta_ms` can be slightly negative when measurement noise outweighs the
/// marginal cost of a cheap step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepProfileRow {
    /// 1-based number of pipeline steps included.
    pub step_index: usize,
    /// Label of the step added at this index.
    pub label: String,
    /// Average cost of running steps `1..=step_index`, in milliseconds.
    pub cumulative_ms: f64,
    /// `cumulative_ms` minus the previous row's `cumulative_ms`.
    pub delta_ms: f64,
}

/// Outcome of a calibrated benchmark: the repeat count settled on and the
/// measurement taken at that count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibratedRun {
    /// The averaged result.
    pub result: BenchmarkResult,
    /// Executions in the final measured batch.
    pub repeats: u64,
    /// Total seconds of the final measured batch.
    pub total_seconds: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_batch_divides_by_repeats() {
        let result = BenchmarkResult::from_batch("ibex", "q", Duration::from_millis(500), 10, 3);
        assert!((result.avg_latency_ms - 50.0).abs() < 1e-9);
        assert_eq!(result.result_rows, 3);
    }

    #[test]
    fn test_probe_floor_applies_to_instant_probes() {
        let probe = CalibrationProbe {
            repeats_tried: 3,
            elapsed_seconds: 0.0,
        };
        assert_eq!(probe.per_op_ms(1.0), 1.0);

        let probe = CalibrationProbe {
            repeats_tried: 4,
            elapsed_seconds: 0.2,
        };
        assert!((probe.per_op_ms(1.0) - 50.0).abs() < 1e-9);
    }
}
