// Copyright 2025 Framebench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Repeat-count calibration.
//!
//! A calibrator is handed a batch runner, `FnMut(repeats) -> elapsed`, and
//! picks the number of repeats needed for the measured batch to last at
//! least `min_seconds`:
//!
//! 1. one warm-up execution, then a probe batch of `probe_count`;
//! 2. per-execution cost = probe elapsed / probe_count, floored at
//!    `min_op_ms`;
//! 3. repeats = ceil(min_seconds / cost), never below `probe_count`;
//! 4. measure at that count, and with `refine` set, scale the count by
//!    ceil(min_seconds / actual) once if the batch still came in short.
//!
//! Step 4's correction matters for runners with a fixed cost per batch
//! (process spawn), which the linear estimate in step 3 underweights.

use crate::result::{average_ms, CalibrationProbe};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Lowest per-execution estimate ever used, whatever the configuration.
const ABSOLUTE_MIN_OP_MS: f64 = 1e-6;

/// Calibration tuning knobs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Executions in the probe batch.
    pub probe_count: u64,
    /// Floor for the per-execution cost estimate, in milliseconds.
    pub min_op_ms: f64,
    /// Apply the second-order scale-up when the measured batch is short.
    pub refine: bool,
    /// Run each full-size batch once unmeasured before measuring it.
    pub rewarm: bool,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            probe_count: 3,
            min_op_ms: 1.0,
            refine: false,
            rewarm: false,
        }
    }
}

impl CalibrationConfig {
    /// Settings for runners that pay a fixed cost per batch.
    pub fn for_batched_process() -> Self {
        Self {
            refine: true,
            rewarm: true,
            ..Self::default()
        }
    }
}

/// Final repeat count and the measurement taken at it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    /// Executions in the final measured batch.
    pub repeats: u64,
    /// Wall-clock total of the final measured batch.
    pub total: Duration,
    /// Milliseconds per execution.
    pub avg_ms: f64,
}

/// Probe-then-scale repeat-count estimator.
#[derive(Debug, Clone, Default)]
pub struct Calibrator {
    config: CalibrationConfig,
}

impl Calibrator {
    /// Create a calibrator with the given settings.
    pub fn new(config: CalibrationConfig) -> Self {
        Self { config }
    }

    /// Warm up once, then time a probe batch.
    pub fn probe<E, F>(&self, run: &mut F) -> Result<CalibrationProbe, E>
    where
        F: FnMut(u64) -> Result<Duration, E>,
    {
        run(1)?;
        let repeats_tried = self.config.probe_count.max(1);
        let elapsed = run(repeats_tried)?;
        debug!(
            repeats = repeats_tried,
            elapsed_s = elapsed.as_secs_f64(),
            "calibration probe"
        );
        Ok(CalibrationProbe {
            repeats_tried,
            elapsed_seconds: elapsed.as_secs_f64(),
        })
    }

    /// Repeat count whose estimated total reaches `min_seconds`.
    ///
    /// A non-positive target yields the probe count, so a measurement is
    /// still taken.
    pub fn target_repeats(&self, probe: &CalibrationProbe, min_seconds: f64) -> u64 {
        let floor = probe.repeats_tried.max(1);
        if !(min_seconds > 0.0) || !min_seconds.is_finite() {
            return floor;
        }

        let per_op_ms = probe.per_op_ms(self.config.min_op_ms.max(ABSOLUTE_MIN_OP_MS));
        let target = (min_seconds * 1000.0 / per_op_ms).ceil() as u64;
        target.max(floor)
    }

    /// Probe, pick a repeat count, and measure at it.
    pub fn calibrate<E, F>(&self, mut run: F, min_seconds: f64) -> Result<Calibration, E>
    where
        F: FnMut(u64) -> Result<Duration, E>,
    {
        let probe = self.probe(&mut run)?;
        let mut repeats = self.target_repeats(&probe, min_seconds);
        let mut total = self.measure_at(&mut run, repeats)?;

        if self.config.refine && min_seconds > 0.0 {
            let actual = total.as_secs_f64();
            if actual > 0.0 && actual < min_seconds {
                let scale_up = ((min_seconds / actual).ceil() as u64).max(1);
                debug!(
                    repeats,
                    actual_s = actual,
                    min_seconds,
                    scale_up,
                    "batch came in short, scaling repeat count"
                );
                repeats = repeats.saturating_mul(scale_up);
                total = self.measure_at(&mut run, repeats)?;
            }
        }

        Ok(Calibration {
            repeats,
            total,
            avg_ms: average_ms(total, repeats),
        })
    }

    fn measure_at<E, F>(&self, run: &mut F, repeats: u64) -> Result<Duration, E>
    where
        F: FnMut(u64) -> Result<Duration, E>,
    {
        if self.config.rewarm {
            run(repeats)?;
        }
        run(repeats)
    }
}
