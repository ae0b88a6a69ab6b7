// Copyright 2025 Framebench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Cross-framework comparison.
//!
//! A [`ComparisonReporter`] turns a [`ResultMatrix`] into a [`Comparison`]:
//! the frameworks present (canonical order, absent ones dropped, unknown
//! ones ignored), one row per query with an explicit gap where a framework
//! has no value, and a geometric-mean speedup for every non-baseline
//! framework over the queries where both it and the baseline have data.

use crate::catalog;
use crate::store::ResultMatrix;
use serde::{Deserialize, Serialize};

/// Ordering preferences and baseline for a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportLayout {
    /// Preferred framework order; frameworks outside it are not reported.
    pub framework_order: Vec<String>,
    /// Preferred query order as (id, label) pairs.
    pub query_order: Vec<(String, String)>,
    /// Framework all speedups are relative to.
    pub baseline: String,
    /// Frameworks with no speedup line.
    pub speedup_exclusions: Vec<String>,
}

impl Default for ReportLayout {
    fn default() -> Self {
        Self {
            framework_order: catalog::FRAMEWORK_ORDER.iter().map(|s| s.to_string()).collect(),
            query_order: catalog::QUERY_ORDER
                .iter()
                .map(|(id, label)| (id.to_string(), label.to_string()))
                .collect(),
            baseline: catalog::BASELINE.to_string(),
            speedup_exclusions: catalog::SPEEDUP_EXCLUSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// One query row of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    /// Query id.
    pub query: String,
    /// Display label.
    pub label: String,
    /// avg_ms per present framework, `None` where there is no data.
    pub cells: Vec<Option<f64>>,
}

/// Aggregate speedup of one framework over the baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Speedup {
    /// Framework compared.
    pub framework: String,
    /// Geometric mean of baseline_ms / framework_ms. Above 1 means the
    /// framework is faster than the baseline.
    pub geomean: f64,
    /// Number of ratios in the mean.
    pub queries: usize,
}

/// Full comparison, ready to render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    /// Baseline framework.
    pub baseline: String,
    /// Present frameworks, in column order.
    pub frameworks: Vec<String>,
    /// Query rows.
    pub rows: Vec<ComparisonRow>,
    /// One entry per framework that had at least one ratio.
    pub speedups: Vec<Speedup>,
}

impl Comparison {
    /// Speedup entry for a framework, if one was computed.
    pub fn speedup(&self, framework: &str) -> Option<&Speedup> {
        self.speedups.iter().find(|s| s.framework == framework)
    }

    /// Cell for a (query, framework) pair.
    pub fn cell(&self, query: &str, framework: &str) -> Option<f64> {
        let column = self.frameworks.iter().position(|f| f == framework)?;
        self.rows
            .iter()
            .find(|r| r.query == query)
            .and_then(|r| r.cells[column])
    }
}

/// Geometric mean, `exp(mean(ln x))`. `None` for an empty slice or any
/// non-positive value.
pub fn geometric_mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() || values.iter().any(|v| !(*v > 0.0) || !v.is_finite()) {
        return None;
    }
    let sum_log: f64 = values.iter().map(|v| v.ln()).sum();
    Some((sum_log / values.len() as f64).exp())
}

/// Builds comparisons according to a [`ReportLayout`].
#[derive(Debug, Clone, Default)]
pub struct ComparisonReporter {
    layout: ReportLayout,
}

impl ComparisonReporter {
    /// Create a reporter with the given layout.
    pub fn new(layout: ReportLayout) -> Self {
        Self { layout }
    }

    /// Get the layout.
    pub fn layout(&self) -> &ReportLayout {
        &self.layout
    }

    /// Frameworks from the preferred order that have any value.
    pub fn present_frameworks(&self, matrix: &ResultMatrix) -> Vec<String> {
        self.layout
            .framework_order
            .iter()
            .filter(|f| matrix.has_framework(f))
            .cloned()
            .collect()
    }

    /// Queries to report: preferred order first, then any others in
    /// first-seen order.
    pub fn query_rows(&self, matrix: &ResultMatrix) -> Vec<(String, String)> {
        let observed = matrix.queries();
        let mut rows: Vec<(String, String)> = self
            .layout
            .query_order
            .iter()
            .filter(|(id, _)| observed.contains(id))
            .cloned()
            .collect();
        for query in observed {
            if !rows.iter().any(|(id, _)| id == query) {
                rows.push((query.clone(), query.clone()));
            }
        }
        rows
    }

    /// Build the comparison.
    pub fn compare(&self, matrix: &ResultMatrix) -> Comparison {
        let frameworks = self.present_frameworks(matrix);
        let rows: Vec<ComparisonRow> = self
            .query_rows(matrix)
            .into_iter()
            .map(|(query, label)| {
                let cells = frameworks.iter().map(|f| matrix.get(&query, f)).collect();
                ComparisonRow {
                    query,
                    label,
                    cells,
                }
            })
            .collect();

        let baseline = &self.layout.baseline;
        let speedups = frameworks
            .iter()
            .filter(|f| *f != baseline && !self.layout.speedup_exclusions.contains(*f))
            .filter_map(|f| {
                let ratios: Vec<f64> = rows
                    .iter()
                    .filter_map(|row| {
                        let base = matrix.get(&row.query, baseline)?;
                        let value = matrix.get(&row.query, f)?;
                        (base > 0.0 && value > 0.0).then(|| base / value)
                    })
                    .collect();
                geometric_mean(&ratios).map(|geomean| Speedup {
                    framework: f.clone(),
                    geomean,
                    queries: ratios.len(),
                })
            })
            .collect();

        Comparison {
            baseline: baseline.clone(),
            frameworks,
            rows,
            speedups,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(entries: &[(&str, &str, f64)]) -> ResultMatrix {
        let mut m = ResultMatrix::default();
        for (framework, query, avg_ms) in entries {
            m.insert(framework, query, *avg_ms);
        }
        m
    }

    #[test]
    fn test_uniform_ratio_geomean() {
        let m = matrix(&[
            ("ibex", "mean_by_symbol", 10.0),
            ("ibex", "ohlc_by_symbol", 20.0),
            ("ibex", "update_price_x2", 40.0),
            ("polars", "mean_by_symbol", 5.0),
            ("polars", "ohlc_by_symbol", 10.0),
            ("polars", "update_price_x2", 20.0),
        ]);
        let comparison = ComparisonReporter::default().compare(&m);
        let speedup = comparison.speedup("polars").unwrap();
        assert!((speedup.geomean - 2.0).abs() < 1e-12);
        assert_eq!(speedup.queries, 3);
    }

    #[test]
    fn test_missing_cell_is_gap_and_excluded_from_ratio() {
        let m = matrix(&[
            ("ibex", "mean_by_symbol", 10.0),
            ("ibex", "ohlc_by_symbol", 20.0),
            ("pandas", "mean_by_symbol", 40.0),
        ]);
        let comparison = ComparisonReporter::default().compare(&m);

        assert_eq!(comparison.cell("ohlc_by_symbol", "pandas"), None);
        assert_eq!(comparison.cell("mean_by_symbol", "pandas"), Some(40.0));
        let speedup = comparison.speedup("pandas").unwrap();
        assert_eq!(speedup.queries, 1);
        assert!((speedup.geomean - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_no_common_queries_yields_no_speedup() {
        let m = matrix(&[
            ("ibex", "mean_by_symbol", 10.0),
            ("polars", "ohlc_by_symbol", 5.0),
            ("duckdb", "mean_by_symbol", 0.0),
        ]);
        let comparison = ComparisonReporter::default().compare(&m);
        assert!(comparison.speedup("polars").is_none());
        assert!(comparison.speedup("duckdb").is_none());
        assert!(comparison.speedups.iter().all(|s| s.geomean.is_finite()));
    }

    #[test]
    fn test_present_frameworks_follow_canonical_order() {
        let m = matrix(&[
            ("pandas", "mean_by_symbol", 3.0),
            ("my-engine", "mean_by_symbol", 1.0),
            ("ibex", "mean_by_symbol", 2.0),
            ("polars-st", "mean_by_symbol", 2.5),
        ]);
        let reporter = ComparisonReporter::default();
        assert_eq!(
            reporter.present_frameworks(&m),
            vec!["ibex", "polars-st", "pandas"]
        );
    }

    #[test]
    fn test_baseline_and_exclusions_have_no_speedup() {
        let m = matrix(&[
            ("ibex", "mean_by_symbol", 10.0),
            ("ibex+parse", "mean_by_symbol", 12.0),
            ("ibex-compiled", "mean_by_symbol", 5.0),
        ]);
        let comparison = ComparisonReporter::default().compare(&m);
        assert!(comparison.speedup("ibex").is_none());
        assert!(comparison.speedup("ibex+parse").is_none());
        assert!(comparison.speedup("ibex-compiled").is_some());
    }

    #[test]
    fn test_unlisted_queries_follow_canonical_ones() {
        let m = matrix(&[
            ("ibex", "zeta", 1.0),
            ("ibex", "ohlc_by_symbol", 1.0),
            ("ibex", "mean_by_symbol", 1.0),
        ]);
        let rows: Vec<String> = ComparisonReporter::default()
            .query_rows(&m)
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(rows, vec!["mean_by_symbol", "ohlc_by_symbol", "zeta"]);
    }

    #[test]
    fn test_geometric_mean_rejects_empty_and_non_positive() {
        assert_eq!(geometric_mean(&[]), None);
        assert_eq!(geometric_mean(&[1.0, 0.0]), None);
        let gm = geometric_mean(&[1.0, 4.0]).unwrap();
        assert!((gm - 2.0).abs() < 1e-12);
    }
}
