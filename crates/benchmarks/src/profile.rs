// Copyright 2025 Framebench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Incremental step profiling of a multi-step pipeline.
//!
//! For k = 1..=N the first k steps are run as one independent load, each
//! load repeating its k-step block `inner_repeat` times, and the load is
//! executed `runs_per_step` times. The averaged cost of the k-step prefix
//! minus the (k-1)-step prefix is the marginal cost of step k.
//!
//! Every prefix is a fresh load; nothing carries over from the previous
//! prefix.

use crate::result::StepProfileRow;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// One labelled step of a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStep {
    /// Short display label.
    pub label: String,
    /// Step source text as understood by the runner.
    #[serde(alias = "engine")]
    pub text: String,
}

impl PipelineStep {
    /// Create a new step.
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }
}

/// Something that can run a prefix of a pipeline in one load.
pub trait StepRunner {
    /// Error raised by a failed load.
    type Error;

    /// Run `steps` as one load with the whole block repeated `repeat`
    /// times, returning the wall-clock time of the load.
    fn run_steps(&mut self, steps: &[PipelineStep], repeat: u64) -> Result<Duration, Self::Error>;
}

/// Cumulative per-step cost profiler.
#[derive(Debug, Clone, Copy)]
pub struct StepProfiler {
    runs_per_step: u64,
    inner_repeat: u64,
}

impl StepProfiler {
    /// Create a profiler. Both counts are clamped to at least 1.
    pub fn new(runs_per_step: u64, inner_repeat: u64) -> Self {
        Self {
            runs_per_step: runs_per_step.max(1),
            inner_repeat: inner_repeat.max(1),
        }
    }

    /// Loads executed per prefix.
    pub fn runs_per_step(&self) -> u64 {
        self.runs_per_step
    }

    /// Block repeats inside each load.
    pub fn inner_repeat(&self) -> u64 {
        self.inner_repeat
    }

    /// Profile `steps` in order. Any failed load aborts the profile.
    pub fn profile<R: StepRunner>(
        &self,
        runner: &mut R,
        steps: &[PipelineStep],
    ) -> Result<Vec<StepProfileRow>, R::Error> {
        let mut rows = Vec::with_capacity(steps.len());
        let mut previous_ms = 0.0;

        for step_count in 1..=steps.len() {
            let prefix = &steps[..step_count];
            let mut total = Duration::ZERO;
            for run in 0..self.runs_per_step {
                let elapsed = runner.run_steps(prefix, self.inner_repeat)?;
                debug!(step_count, run, elapsed_s = elapsed.as_secs_f64(), "profile load");
                total += elapsed;
            }

            let cumulative_ms = 1000.0 * total.as_secs_f64()
                / (self.runs_per_step * self.inner_repeat) as f64;
            let row = StepProfileRow {
                step_index: step_count,
                label: prefix[step_count - 1].label.clone(),
                cumulative_ms,
                delta_ms: cumulative_ms - previous_ms,
            };
            info!(
                step = row.step_index,
                label = %row.label,
                cumulative_ms = row.cumulative_ms,
                delta_ms = row.delta_ms,
                "profiled step"
            );
            previous_ms = cumulative_ms;
            rows.push(row);
        }

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Runner charging a fixed cost per step plus a deterministic wobble.
    struct CostedRunner {
        costs_us: Vec<u64>,
        wobble_us: Vec<i64>,
        loads: Vec<(usize, u64)>,
        fail_at: Option<usize>,
    }

    impl CostedRunner {
        fn new(costs_us: Vec<u64>) -> Self {
            Self {
                costs_us,
                wobble_us: Vec::new(),
                loads: Vec::new(),
                fail_at: None,
            }
        }
    }

    impl StepRunner for CostedRunner {
        type Error = String;

        fn run_steps(&mut self, steps: &[PipelineStep], repeat: u64) -> Result<Duration, String> {
            self.loads.push((steps.len(), repeat));
            if self.fail_at == Some(steps.len()) {
                return Err(format!("load failed at step {}", steps.len()));
            }
            let block: u64 = self.costs_us[..steps.len()].iter().sum();
            let wobble = self
                .wobble_us
                .get(self.loads.len() - 1)
                .copied()
                .unwrap_or(0);
            let micros = (block * repeat) as i64 + wobble;
            Ok(Duration::from_micros(micros.max(0) as u64))
        }
    }

    fn steps(n: usize) -> Vec<PipelineStep> {
        (1..=n)
            .map(|i| PipelineStep::new(format!("step {i}"), format!("let s{i} = t;")))
            .collect()
    }

    #[test]
    fn test_deltas_recover_step_costs() {
        let mut runner = CostedRunner::new(vec![5_000, 10_000, 0, 20_000]);
        let rows = StepProfiler::new(2, 4)
            .profile(&mut runner, &steps(4))
            .unwrap();

        let deltas: Vec<f64> = rows.iter().map(|r| r.delta_ms).collect();
        for (got, want) in deltas.iter().zip([5.0, 10.0, 0.0, 20.0]) {
            assert!((got - want).abs() < 1e-9, "delta {got} != {want}");
        }
        assert_eq!(rows[3].step_index, 4);
        assert_eq!(rows[3].label, "step 4");
        assert!((rows[3].cumulative_ms - 35.0).abs() < 1e-9);
        // Two loads per prefix, each with the block repeated 4 times.
        assert_eq!(runner.loads.len(), 8);
        assert!(runner.loads.iter().all(|&(_, repeat)| repeat == 4));
    }

    #[test]
    fn test_cumulative_cost_is_monotonic_within_noise() {
        let mut runner = CostedRunner::new(vec![3_000, 1_000, 2_000, 50, 4_000]);
        runner.wobble_us = vec![120, -80, 40, -150, 90, 0, -60, 30, 100, -20];
        let rows = StepProfiler::new(2, 1)
            .profile(&mut runner, &steps(5))
            .unwrap();

        // A step cheaper than the noise may show a small negative delta.
        let noise_ms = 0.2;
        for pair in rows.windows(2) {
            assert!(
                pair[1].cumulative_ms >= pair[0].cumulative_ms - noise_ms,
                "step {} dropped from {} to {}",
                pair[1].step_index,
                pair[0].cumulative_ms,
                pair[1].cumulative_ms
            );
        }
    }

    #[test]
    fn test_failure_aborts_whole_profile() {
        let mut runner = CostedRunner::new(vec![1_000, 1_000, 1_000, 1_000]);
        runner.fail_at = Some(3);
        let err = StepProfiler::new(1, 1)
            .profile(&mut runner, &steps(4))
            .unwrap_err();

        assert_eq!(err, "load failed at step 3");
        assert!(runner.loads.iter().all(|&(len, _)| len <= 3));
    }

    #[test]
    fn test_counts_clamp_to_one() {
        let profiler = StepProfiler::new(0, 0);
        assert_eq!(profiler.runs_per_step(), 1);
        assert_eq!(profiler.inner_repeat(), 1);
        let mut runner = CostedRunner::new(vec![]);
        assert!(profiler.profile(&mut runner, &[]).unwrap().is_empty());
    }
}
