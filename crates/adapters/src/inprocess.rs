// Copyright 2025 Framebench Contributors
// SPDX-License-Identifier: Apache-2.0

//! In-process library adapter.
//!
//! The operation being timed is a direct call into a library over a dataset
//! that was loaded before timing began. Loading is never measured.

use crate::error::{AdapterError, Result};
use crate::query::QuerySpec;
use crate::suite::Suite;
use crate::{BatchRun, FrameworkAdapter};
use framebench_benchmarks::{timer, BenchmarkResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A data-frame library the harness can drive in-process.
pub trait TableEngine {
    /// Loaded dataset handle.
    type Dataset;

    /// Framework name results are recorded under.
    fn name(&self) -> &str;

    /// Load a CSV file.
    fn load(&self, path: &Path) -> Result<Self::Dataset>;

    /// Execute a query and return the number of result rows.
    fn execute(&self, dataset: &Self::Dataset, query: &QuerySpec) -> Result<usize>;
}

/// [`FrameworkAdapter`] over a [`TableEngine`].
pub struct InProcessAdapter<E: TableEngine> {
    engine: E,
    paths: HashMap<String, PathBuf>,
    loaded: HashMap<String, E::Dataset>,
    queries: Vec<QuerySpec>,
}

impl<E: TableEngine> InProcessAdapter<E> {
    /// Create an adapter for every in-process query of `suite`.
    pub fn new(engine: E, suite: &Suite) -> Self {
        Self {
            engine,
            paths: suite
                .datasets
                .iter()
                .map(|d| (d.name.clone(), d.path.clone()))
                .collect(),
            loaded: HashMap::new(),
            queries: suite.in_process_queries(),
        }
    }

    /// The wrapped engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    fn prepare(&mut self, query: &str) -> Result<usize> {
        let index = self
            .queries
            .iter()
            .position(|q| q.name == query)
            .ok_or_else(|| AdapterError::UnknownQuery(query.to_string()))?;

        let dataset = self.queries[index].dataset.clone();
        if !self.loaded.contains_key(&dataset) {
            let path = self
                .paths
                .get(&dataset)
                .ok_or_else(|| AdapterError::UnknownDataset(dataset.clone()))?;
            debug!(framework = self.engine.name(), dataset = %dataset, "loading dataset");
            let handle = self.engine.load(path)?;
            self.loaded.insert(dataset, handle);
        }
        Ok(index)
    }

    fn operation(&self, index: usize) -> impl FnMut() -> Result<usize> + '_ {
        let query = &self.queries[index];
        let dataset = &self.loaded[&query.dataset];
        move || self.engine.execute(dataset, query)
    }
}

impl<E: TableEngine> FrameworkAdapter for InProcessAdapter<E> {
    fn framework(&self) -> &str {
        self.engine.name()
    }

    fn queries(&self) -> Vec<String> {
        self.queries.iter().map(|q| q.name.clone()).collect()
    }

    fn run_batch(&mut self, query: &str, repeats: u64) -> Result<BatchRun> {
        let index = self.prepare(query)?;
        let (elapsed, rows) = timer::time_batch(self.operation(index), repeats)?;
        Ok(BatchRun {
            elapsed,
            rows: rows as u64,
        })
    }

    fn run_query(&mut self, query: &str, warmup: u64, iterations: u64) -> Result<BenchmarkResult> {
        let index = self.prepare(query)?;
        let m = timer::measure(self.operation(index), warmup, iterations)?;

        let result = BenchmarkResult::new(self.engine.name(), query, m.avg_ms, m.last as u64);
        info!(
            framework = %result.framework,
            query = %result.query,
            avg_ms = result.avg_latency_ms,
            rows = result.result_rows,
            "query measured"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::time::Duration;

    /// Engine over in-memory row counts that sleeps a fixed time per call.
    struct SleepEngine {
        loads: Cell<u32>,
        delay: Duration,
    }

    impl TableEngine for SleepEngine {
        type Dataset = usize;

        fn name(&self) -> &str {
            "sleepy"
        }

        fn load(&self, path: &Path) -> Result<usize> {
            self.loads.set(self.loads.get() + 1);
            Ok(path.to_string_lossy().len())
        }

        fn execute(&self, dataset: &usize, query: &QuerySpec) -> Result<usize> {
            if query.name == "broken" {
                return Err(AdapterError::Engine("column not found".into()));
            }
            std::thread::sleep(self.delay);
            Ok(*dataset)
        }
    }

    fn suite() -> Suite {
        Suite::parse(
            r#"
[[datasets]]
name = "d"
path = "12345.csv"

[[queries]]
name = "all_rows"
dataset = "d"

[[queries]]
name = "broken"
dataset = "d"

[[queries]]
name = "engine_side"
dataset = "d"
engine = "d;"
engine_only = true
"#,
        )
        .unwrap()
    }

    fn adapter() -> InProcessAdapter<SleepEngine> {
        InProcessAdapter::new(
            SleepEngine {
                loads: Cell::new(0),
                delay: Duration::from_millis(2),
            },
            &suite(),
        )
    }

    #[test]
    fn test_run_query_measures_and_counts_rows() {
        let mut a = adapter();
        let result = a.run_query("all_rows", 1, 3).unwrap();
        assert_eq!(result.framework, "sleepy");
        assert_eq!(result.result_rows, 9);
        assert!(result.avg_latency_ms >= 2.0);
    }

    #[test]
    fn test_dataset_loaded_once() {
        let mut a = adapter();
        a.run_query("all_rows", 0, 1).unwrap();
        a.run_batch("all_rows", 2).unwrap();
        assert_eq!(a.engine().loads.get(), 1);
    }

    #[test]
    fn test_engine_error_propagates() {
        let mut a = adapter();
        assert!(matches!(
            a.run_query("broken", 1, 1),
            Err(AdapterError::Engine(_))
        ));
    }

    #[test]
    fn test_engine_only_queries_are_skipped() {
        let a = adapter();
        assert_eq!(a.queries(), vec!["all_rows", "broken"]);
    }
}
