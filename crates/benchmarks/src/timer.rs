// Copyright 2025 Framebench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Warm-up-then-batch timing.
//!
//! The clock is read once before and once after the measured batch, never
//! per call. Any error, warm-up included, is returned immediately: there is
//! no averaging over the calls that happened to succeed.

use crate::result::average_ms;
use std::time::{Duration, Instant};

/// Averaged measurement of a batch of executions.
#[derive(Debug, Clone)]
pub struct Measurement<T> {
    /// Milliseconds per execution.
    pub avg_ms: f64,
    /// Wall-clock total for the batch.
    pub total: Duration,
    /// Executions in the batch.
    pub iterations: u64,
    /// Value returned by the final execution.
    pub last: T,
}

/// Run `op` `repeats` times (at least once) under a single pair of clock
/// readings. Returns the elapsed time and the last value produced.
pub fn time_batch<T, E, F>(mut op: F, repeats: u64) -> Result<(Duration, T), E>
where
    F: FnMut() -> Result<T, E>,
{
    let repeats = repeats.max(1);
    let start = Instant::now();
    let mut last = op()?;
    for _ in 1..repeats {
        last = op()?;
    }
    Ok((start.elapsed(), last))
}

/// Run `op` `warmup` times discarding the results, then time `iterations`
/// executions as one batch.
///
/// `iterations` is clamped to at least 1.
pub fn measure<T, E, F>(mut op: F, warmup: u64, iterations: u64) -> Result<Measurement<T>, E>
where
    F: FnMut() -> Result<T, E>,
{
    for _ in 0..warmup {
        op()?;
    }

    let iterations = iterations.max(1);
    let (total, last) = time_batch(&mut op, iterations)?;

    Ok(Measurement {
        avg_ms: average_ms(total, iterations),
        total,
        iterations,
        last,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn fixed_delay(delay: Duration) -> impl FnMut() -> Result<usize, String> {
        move || {
            thread::sleep(delay);
            Ok(7)
        }
    }

    #[test]
    fn test_measure_counts_warmup_and_iterations() {
        let mut calls = 0;
        let m = measure(
            || {
                calls += 1;
                Ok::<_, String>(calls)
            },
            2,
            5,
        )
        .unwrap();

        assert_eq!(calls, 7);
        assert_eq!(m.iterations, 5);
        assert_eq!(m.last, 7);
    }

    #[test]
    fn test_measure_average_tracks_fixed_delay() {
        let delay = Duration::from_millis(2);
        for (warmup, iterations) in [(0, 1), (1, 5), (3, 20)] {
            let m = measure(fixed_delay(delay), warmup, iterations).unwrap();
            assert!(m.avg_ms >= 2.0, "avg_ms {} below delay", m.avg_ms);
            assert!(m.avg_ms < 50.0, "avg_ms {} far above delay", m.avg_ms);
            assert_eq!(m.last, 7);
        }
    }

    #[test]
    fn test_measure_zero_iterations_runs_once() {
        let m = measure(fixed_delay(Duration::ZERO), 0, 0).unwrap();
        assert_eq!(m.iterations, 1);
    }

    #[test]
    fn test_warmup_failure_propagates() {
        let mut calls = 0;
        let err = measure(
            || {
                calls += 1;
                Err::<(), _>("boom")
            },
            1,
            10,
        )
        .unwrap_err();

        assert_eq!(err, "boom");
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_batch_failure_stops_immediately() {
        let mut calls = 0;
        let result = time_batch(
            || {
                calls += 1;
                if calls == 3 {
                    Err("third call failed")
                } else {
                    Ok(calls)
                }
            },
            10,
        );

        assert_eq!(result.unwrap_err(), "third call failed");
        assert_eq!(calls, 3);
    }
}
