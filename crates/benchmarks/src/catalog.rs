// Copyright 2025 Framebench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Canonical framework and query orderings used when reporting.

/// Framework every speedup is expressed against.
pub const BASELINE: &str = "ibex";

/// Preferred column order of frameworks in comparison tables.
pub const FRAMEWORK_ORDER: &[&str] = &[
    "ibex",
    "ibex+parse",
    "ibex-compiled",
    "polars",
    "polars-st",
    "duckdb",
    "duckdb-st",
    "pandas",
    "data.table",
    "dplyr",
];

/// Frameworks left out of the speedup summary.
pub const SPEEDUP_EXCLUSIONS: &[&str] = &["ibex", "ibex+parse"];

/// Preferred row order of queries, with display labels.
pub const QUERY_ORDER: &[(&str, &str)] = &[
    ("mean_by_symbol", "mean by symbol"),
    ("ohlc_by_symbol", "OHLC by symbol"),
    ("update_price_x2", "update price×2"),
    ("count_by_symbol_day", "count by symbol×day"),
    ("mean_by_symbol_day", "mean by symbol×day"),
    ("ohlc_by_symbol_day", "OHLC by symbol×day"),
    ("filter_simple", "filter price>500"),
    ("filter_and", "filter price>500 & qty<100"),
    ("filter_arith", "filter price×qty>50000"),
    ("filter_or", "filter price>900 | qty<10"),
    ("sum_by_user", "sum by user"),
    ("filter_events", "filter events"),
    ("null_left_join", "left join (nulls)"),
    ("quant_pipeline", "quant pipeline"),
];

/// Display label for a query id, falling back to the id itself.
pub fn query_label(query: &str) -> &str {
    QUERY_ORDER
        .iter()
        .find(|(id, _)| *id == query)
        .map(|(_, label)| *label)
        .unwrap_or(query)
}
