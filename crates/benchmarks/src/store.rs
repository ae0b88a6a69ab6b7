// Copyright 2025 Framebench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Ordered result storage and the tab-separated result file format.
//!
//! The file format is the contract between a benchmark run and the
//! reporter: a `framework\tquery\tavg_ms\trows` header, then one row per
//! measurement with `avg_ms` fixed to three decimals. Files from several
//! runs may be merged; loading skips malformed rows instead of failing.

use crate::error::{BenchError, Result};
use crate::result::BenchmarkResult;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Column names of the result file, in order.
pub const HEADER: [&str; 4] = ["framework", "query", "avg_ms", "rows"];

/// Insertion-ordered collection of benchmark results.
///
/// Duplicate (framework, query) pairs are kept; consumers take the latest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultStore {
    results: Vec<BenchmarkResult>,
}

/// Raw row as read from disk, before validation.
#[derive(Debug, Deserialize)]
struct RawRow {
    framework: String,
    query: String,
    avg_ms: String,
    #[serde(default)]
    rows: String,
}

impl ResultStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a result at the end.
    pub fn append(&mut self, result: BenchmarkResult) {
        self.results.push(result);
    }

    /// Append every result of `other`, preserving its order.
    pub fn merge(&mut self, other: ResultStore) {
        self.results.extend(other.results);
    }

    /// All results in insertion order.
    pub fn results(&self) -> &[BenchmarkResult] {
        &self.results
    }

    /// Number of stored results.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Most recently appended result for a (framework, query) pair.
    pub fn latest(&self, framework: &str, query: &str) -> Option<&BenchmarkResult> {
        self.results
            .iter()
            .rev()
            .find(|r| r.framework == framework && r.query == query)
    }

    /// Write the store as a tab-separated file, replacing any existing file
    /// and creating parent directories.
    pub fn serialize(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tsv_err = |source| BenchError::Tsv {
            path: path.to_path_buf(),
            source,
        };
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_path(path)
            .map_err(tsv_err)?;

        writer.write_record(HEADER).map_err(tsv_err)?;
        for r in &self.results {
            let avg_ms = format!("{:.3}", r.avg_latency_ms);
            let rows = r.result_rows.to_string();
            writer
                .write_record([
                    r.framework.as_str(),
                    r.query.as_str(),
                    avg_ms.as_str(),
                    rows.as_str(),
                ])
                .map_err(tsv_err)?;
        }
        writer.flush()?;

        debug!(path = %path.display(), rows = self.results.len(), "wrote results");
        Ok(())
    }

    /// Read one result file. Rows whose `avg_ms` is not a finite,
    /// non-negative number are skipped; an unparsable `rows` reads as 0.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let tsv_err = |source| BenchError::Tsv {
            path: path.to_path_buf(),
            source,
        };
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .flexible(true)
            .from_path(path)
            .map_err(tsv_err)?;

        let mut store = Self::new();
        for (line, record) in reader.deserialize::<RawRow>().enumerate() {
            let raw = match record {
                Ok(raw) => raw,
                Err(e) if e.is_io_error() => return Err(tsv_err(e)),
                Err(e) => {
                    warn!(path = %path.display(), line = line + 2, error = %e, "skipping malformed row");
                    continue;
                }
            };

            let avg_ms = match raw.avg_ms.trim().parse::<f64>() {
                Ok(v) if v.is_finite() && v >= 0.0 => v,
                _ => {
                    warn!(
                        path = %path.display(),
                        line = line + 2,
                        avg_ms = %raw.avg_ms,
                        "skipping row with non-numeric avg_ms"
                    );
                    continue;
                }
            };
            let rows = raw.rows.trim().parse::<u64>().unwrap_or(0);
            store.append(BenchmarkResult::new(raw.framework, raw.query, avg_ms, rows));
        }

        Ok(store)
    }

    /// Read and concatenate several result files in the order given.
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        if paths.is_empty() {
            return Err(BenchError::NoInputs);
        }
        let mut store = Self::new();
        for path in paths {
            store.merge(Self::read(path)?);
        }
        Ok(store)
    }
}

impl Extend<BenchmarkResult> for ResultStore {
    fn extend<I: IntoIterator<Item = BenchmarkResult>>(&mut self, iter: I) {
        self.results.extend(iter);
    }
}

impl FromIterator<BenchmarkResult> for ResultStore {
    fn from_iter<I: IntoIterator<Item = BenchmarkResult>>(iter: I) -> Self {
        Self {
            results: iter.into_iter().collect(),
        }
    }
}

/// Query → framework → avg_ms lookup built from stored results.
///
/// Later results override earlier ones for the same pair. Queries and
/// frameworks keep their first-seen order.
#[derive(Debug, Clone, Default)]
pub struct ResultMatrix {
    cells: HashMap<String, HashMap<String, f64>>,
    queries: Vec<String>,
    frameworks: Vec<String>,
}

impl ResultMatrix {
    /// Build the matrix from a store.
    pub fn from_store(store: &ResultStore) -> Self {
        let mut matrix = Self::default();
        for r in store.results() {
            matrix.insert(&r.framework, &r.query, r.avg_latency_ms);
        }
        matrix
    }

    /// Set one cell, overriding any previous value.
    pub fn insert(&mut self, framework: &str, query: &str, avg_ms: f64) {
        if !self.queries.iter().any(|q| q == query) {
            self.queries.push(query.to_string());
        }
        if !self.frameworks.iter().any(|f| f == framework) {
            self.frameworks.push(framework.to_string());
        }
        self.cells
            .entry(query.to_string())
            .or_default()
            .insert(framework.to_string(), avg_ms);
    }

    /// Look up one cell.
    pub fn get(&self, query: &str, framework: &str) -> Option<f64> {
        self.cells.get(query)?.get(framework).copied()
    }

    /// Queries in first-seen order.
    pub fn queries(&self) -> &[String] {
        &self.queries
    }

    /// Frameworks in first-seen order.
    pub fn frameworks(&self) -> &[String] {
        &self.frameworks
    }

    /// Whether `framework` has a value for any query.
    pub fn has_framework(&self, framework: &str) -> bool {
        self.frameworks.iter().any(|f| f == framework)
    }

    /// Whether the matrix holds no values.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Read result files and build the comparison lookup in one step.
pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<ResultMatrix> {
    let store = ResultStore::load(paths)?;
    Ok(ResultMatrix::from_store(&store))
}
