// Copyright 2025 Framebench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Text and markdown rendering of benchmark results.
//!
//! Rendering is a thin consumer of [`Comparison`], [`ResultStore`] and the
//! profiling/calibration records; the display precision policy in
//! [`format_ms`] is never used for computation.

use crate::report::Comparison;
use crate::result::{CalibratedRun, StepProfileRow};
use crate::store::ResultStore;
use std::fmt::Write;

/// Cell text for a framework with no measurement for a query.
pub const NO_DATA: &str = "—";

/// Format a latency for display: seconds with 2 decimals from 1000 ms,
/// 1 decimal from 10 ms, 2 decimals below that.
pub fn format_ms(value: Option<f64>) -> String {
    match value {
        None => NO_DATA.to_string(),
        Some(v) if v >= 1000.0 => format!("{:.2} s", v / 1000.0),
        Some(v) if v >= 10.0 => format!("{:.1} ms", v),
        Some(v) => format!("{:.2} ms", v),
    }
}

fn width(s: &str) -> usize {
    s.chars().count()
}

/// Render the per-query table and the speedup summary.
pub fn render_comparison(comparison: &Comparison) -> String {
    let mut output = String::new();

    if comparison.frameworks.is_empty() {
        writeln!(output, "No results found.").unwrap();
        return output;
    }

    let cells: Vec<Vec<String>> = comparison
        .rows
        .iter()
        .map(|row| row.cells.iter().map(|c| format_ms(*c)).collect())
        .collect();

    let label_w = comparison
        .rows
        .iter()
        .map(|r| width(&r.label))
        .chain(std::iter::once(width("query")))
        .max()
        .unwrap_or(5);
    let fw_w: Vec<usize> = comparison
        .frameworks
        .iter()
        .enumerate()
        .map(|(i, fw)| {
            cells
                .iter()
                .map(|row| width(&row[i]))
                .chain([width(fw), 8])
                .max()
                .unwrap_or(8)
        })
        .collect();

    writeln!(output).unwrap();
    writeln!(
        output,
        "## Results — avg execution time per query (lower is better)"
    )
    .unwrap();
    writeln!(output).unwrap();

    let header: Vec<String> = comparison
        .frameworks
        .iter()
        .zip(&fw_w)
        .map(|(fw, w)| format!("{:>w$}", fw, w = *w))
        .collect();
    writeln!(output, "{:<w$} | {}", "query", header.join(" | "), w = label_w).unwrap();
    let rules: Vec<String> = fw_w.iter().map(|w| "-".repeat(*w)).collect();
    writeln!(output, "{}-+-{}", "-".repeat(label_w), rules.join("-+-")).unwrap();

    for (row, row_cells) in comparison.rows.iter().zip(&cells) {
        let rendered: Vec<String> = row_cells
            .iter()
            .zip(&fw_w)
            .map(|(c, w)| format!("{:>w$}", c, w = *w))
            .collect();
        writeln!(output, "{:<w$} | {}", row.label, rendered.join(" | "), w = label_w).unwrap();
    }
    writeln!(output).unwrap();

    if comparison.speedups.is_empty() {
        return output;
    }

    writeln!(
        output,
        "## Speedup over {} (geometric mean across available queries)",
        comparison.baseline
    )
    .unwrap();
    writeln!(output).unwrap();
    for s in &comparison.speedups {
        let verdict = if s.geomean > 1.0 {
            format!("{} is {:.1}× faster than {}", s.framework, s.geomean, comparison.baseline)
        } else {
            format!(
                "{} is {:.1}× faster than {}",
                comparison.baseline,
                1.0 / s.geomean,
                s.framework
            )
        };
        writeln!(
            output,
            "  {:<14}  {}  (over {} queries)",
            s.framework, verdict, s.queries
        )
        .unwrap();
    }
    writeln!(output).unwrap();

    output
}

/// Render calibrated runs as a table with each run's ratio to the
/// baseline's average on the same query.
pub fn render_calibrated(runs: &[CalibratedRun], baseline: &str) -> String {
    let mut output = String::new();
    let baseline_avg = |query: &str| {
        runs.iter()
            .find(|b| b.result.framework == baseline && b.result.query == query)
            .map(|b| b.result.avg_latency_ms)
    };

    let ratio_header = format!("vs_{}", baseline);
    writeln!(
        output,
        "{:<12} {:>16} {:>7} {:>10} {:>10} {:>10}",
        "framework", "query", "iters", "total_s", "avg_ms", ratio_header
    )
    .unwrap();
    writeln!(output, "{}", "-".repeat(70)).unwrap();

    for run in runs {
        let r = &run.result;
        let ratio = match baseline_avg(&r.query) {
            _ if r.framework == baseline => "1.00x".to_string(),
            Some(base) if base > 0.0 => format!("{:.2}x", r.avg_latency_ms / base),
            _ => "n/a".to_string(),
        };
        writeln!(
            output,
            "{:<12} {:>16} {:>7} {:>10.3} {:>10.2} {:>10}",
            r.framework, r.query, run.repeats, run.total_seconds, r.avg_latency_ms, ratio
        )
        .unwrap();
    }

    output
}

/// Render a step profile.
pub fn render_step_profile(rows: &[StepProfileRow], runs: u64, repeat: u64) -> String {
    let mut output = String::new();

    writeln!(
        output,
        "step profile (avg over {} runs, {} repeats/load)",
        runs, repeat
    )
    .unwrap();
    writeln!(
        output,
        "{:>4} {:<22} {:>14} {:>10}",
        "step", "label", "cumulative_ms", "delta_ms"
    )
    .unwrap();
    writeln!(output, "{}", "-".repeat(60)).unwrap();
    for row in rows {
        writeln!(
            output,
            "{:>4} {:<22} {:>14.2} {:>10.2}",
            row.step_index, row.label, row.cumulative_ms, row.delta_ms
        )
        .unwrap();
    }

    output
}

/// Generate a markdown summary of every stored result.
pub fn generate_summary(store: &ResultStore) -> String {
    let mut output = String::new();

    writeln!(output, "# Benchmark Summary").unwrap();
    writeln!(output).unwrap();
    writeln!(output, "Generated: {}", chrono::Utc::now().to_rfc3339()).unwrap();
    writeln!(output).unwrap();
    writeln!(output, "| Framework | Query | avg | rows |").unwrap();
    writeln!(output, "|-----------|-------|-----|------|").unwrap();

    for r in store.results() {
        writeln!(
            output,
            "| {} | {} | {} | {} |",
            r.framework,
            r.query,
            format_ms(Some(r.avg_latency_ms)),
            r.result_rows
        )
        .unwrap();
    }

    writeln!(output).unwrap();
    writeln!(output, "---").unwrap();
    writeln!(output, "Total measurements: {}", store.len()).unwrap();

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ComparisonReporter;
    use crate::result::BenchmarkResult;
    use crate::store::ResultMatrix;

    #[test]
    fn test_format_ms_precision_policy() {
        assert_eq!(format_ms(None), NO_DATA);
        assert_eq!(format_ms(Some(0.456)), "0.46 ms");
        assert_eq!(format_ms(Some(9.999)), "10.00 ms");
        assert_eq!(format_ms(Some(12.34)), "12.3 ms");
        assert_eq!(format_ms(Some(1234.5)), "1.23 s");
    }

    #[test]
    fn test_render_comparison_marks_gaps() {
        let mut m = ResultMatrix::default();
        m.insert("ibex", "mean_by_symbol", 10.0);
        m.insert("ibex", "ohlc_by_symbol", 20.0);
        m.insert("polars", "mean_by_symbol", 5.0);
        let text = render_comparison(&ComparisonReporter::default().compare(&m));

        assert!(text.contains("mean by symbol"));
        let ohlc_line = text.lines().find(|l| l.starts_with("OHLC by symbol")).unwrap();
        assert!(ohlc_line.contains(NO_DATA));
        assert!(text.contains("polars is 2.0× faster than ibex  (over 1 queries)"));
    }

    #[test]
    fn test_render_comparison_empty() {
        let text = render_comparison(&ComparisonReporter::default().compare(&ResultMatrix::default()));
        assert_eq!(text.trim(), "No results found.");
    }

    #[test]
    fn test_render_calibrated_ratio_column() {
        let runs = vec![
            CalibratedRun {
                result: BenchmarkResult::new("ibex", "quant_pipeline", 40.0, 0),
                repeats: 30,
                total_seconds: 1.2,
            },
            CalibratedRun {
                result: BenchmarkResult::new("polars", "quant_pipeline", 20.0, 0),
                repeats: 60,
                total_seconds: 1.2,
            },
        ];
        let text = render_calibrated(&runs, "ibex");
        assert!(text.contains("vs_ibex"));
        assert!(text.lines().any(|l| l.starts_with("ibex") && l.ends_with("1.00x")));
        assert!(text.lines().any(|l| l.starts_with("polars") && l.ends_with("0.50x")));
    }

    #[test]
    fn test_render_calibrated_ratio_per_query() {
        let run = |framework: &str, query: &str, avg_ms: f64| CalibratedRun {
            result: BenchmarkResult::new(framework, query, avg_ms, 0),
            repeats: 10,
            total_seconds: 1.0,
        };
        let runs = vec![
            run("ibex", "q_fast", 1.0),
            run("ibex", "q_slow", 100.0),
            run("polars", "q_fast", 2.0),
            run("polars", "q_slow", 100.0),
            run("duckdb", "q_other", 5.0),
        ];
        let text = render_calibrated(&runs, "ibex");

        let line = |framework: &str, query: &str| {
            text.lines()
                .find(|l| l.starts_with(framework) && l.contains(query))
                .unwrap()
                .to_string()
        };
        assert!(line("polars", "q_fast").ends_with("2.00x"));
        assert!(line("polars", "q_slow").ends_with("1.00x"));
        assert!(line("duckdb", "q_other").ends_with("n/a"));
    }

    #[test]
    fn test_generate_summary_counts() {
        let mut store = ResultStore::new();
        store.append(BenchmarkResult::new("ibex", "q", 1.5, 3));
        let summary = generate_summary(&store);
        assert!(summary.contains("| ibex | q | 1.50 ms | 3 |"));
        assert!(summary.contains("Total measurements: 1"));
    }
}
