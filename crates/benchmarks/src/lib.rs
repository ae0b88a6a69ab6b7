// Copyright 2025 Framebench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Timing, calibration and comparison core for framebench.
//!
//! This crate holds everything about measuring and reporting that does not
//! depend on a particular framework: the warm-up-then-batch [`timer`], the
//! probe-then-scale [`calibrate`]r, the incremental step [`profile`]r, the
//! ordered [`store`] with its tab-separated file format, and the
//! geometric-mean [`report`]er.
//!
//! # Quick Start
//!
//! ```
//! use framebench_benchmarks::{timer, BenchmarkResult, ResultStore};
//!
//! let data: Vec<u64> = (0..10_000).collect();
//! let m = timer::measure(|| Ok::<_, ()>(data.iter().filter(|v| *v % 7 == 0).count()), 1, 5)
//!     .unwrap();
//!
//! let mut store = ResultStore::new();
//! store.append(BenchmarkResult::new("native", "filter_mod7", m.avg_ms, m.last as u64));
//! assert_eq!(store.len(), 1);
//! ```
//!
//! # Modules
//!
//! - [`timer`] - warm-up then single-clock batch timing
//! - [`calibrate`] - repeat-count calibration
//! - [`profile`] - cumulative per-step cost profiling
//! - [`store`] - ordered results and the result file format
//! - [`report`] - cross-framework comparison
//! - [`markdown`] - text rendering
//! - [`io`] - JSON and markdown exports

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod calibrate;
pub mod catalog;
pub mod error;
pub mod io;
pub mod markdown;
pub mod profile;
pub mod report;
pub mod result;
pub mod store;
pub mod timer;

pub use calibrate::{Calibration, CalibrationConfig, Calibrator};
pub use error::{BenchError, Result};
pub use profile::{PipelineStep, StepProfiler, StepRunner};
pub use report::{Comparison, ComparisonReporter, ReportLayout};
pub use result::{BenchmarkResult, CalibratedRun, CalibrationProbe, StepProfileRow};
pub use store::{ResultMatrix, ResultStore};
