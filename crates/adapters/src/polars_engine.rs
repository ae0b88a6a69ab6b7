// Copyright 2025 Framebench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Polars engine.
//!
//! Queries are built with the lazy API over an eagerly loaded frame and
//! collected once per execution.

use crate::error::{AdapterError, Result};
use crate::inprocess::TableEngine;
use crate::query::{AggFunc, Aggregation, CmpOp, Predicate, QuerySpec};
use polars::prelude::*;
use std::path::Path;

/// Variable read by polars when its thread pool starts.
pub const MAX_THREADS_ENV: &str = "POLARS_MAX_THREADS";

/// Polars, multi-threaded or pinned to one thread.
#[derive(Debug, Clone)]
pub struct PolarsEngine {
    name: &'static str,
}

impl PolarsEngine {
    /// Multi-threaded engine, recorded as `polars`.
    pub fn new() -> Self {
        Self { name: "polars" }
    }

    /// Single-threaded engine, recorded as `polars-st`.
    ///
    /// Sets `POLARS_MAX_THREADS=1`, which only takes effect if no polars
    /// work has run in this process yet.
    pub fn single_threaded() -> Self {
        std::env::set_var(MAX_THREADS_ENV, "1");
        Self { name: "polars-st" }
    }
}

impl Default for PolarsEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn engine_err(e: PolarsError) -> AdapterError {
    AdapterError::Engine(e.to_string())
}

fn predicate_expr(predicate: &Predicate) -> Expr {
    match predicate {
        Predicate::Compare {
            column,
            times,
            op,
            value,
        } => {
            let lhs = match times {
                Some(other) => col(column.as_str()) * col(other.as_str()),
                None => col(column.as_str()),
            };
            let rhs = lit(*value);
            match op {
                CmpOp::Gt => lhs.gt(rhs),
                CmpOp::Ge => lhs.gt_eq(rhs),
                CmpOp::Lt => lhs.lt(rhs),
                CmpOp::Le => lhs.lt_eq(rhs),
                CmpOp::Eq => lhs.eq(rhs),
                CmpOp::Ne => lhs.neq(rhs),
            }
        }
        Predicate::All { all } => all
            .iter()
            .map(predicate_expr)
            .reduce(|a, b| a.and(b))
            .unwrap_or_else(|| lit(true)),
        Predicate::Any { any } => any
            .iter()
            .map(predicate_expr)
            .reduce(|a, b| a.or(b))
            .unwrap_or_else(|| lit(false)),
    }
}

fn agg_expr(agg: &Aggregation) -> Expr {
    let column = || col(agg.column.as_deref().unwrap_or_default());
    let expr = match agg.func {
        AggFunc::Mean => column().mean(),
        AggFunc::Sum => column().sum(),
        AggFunc::Min => column().min(),
        AggFunc::Max => column().max(),
        AggFunc::First => column().first(),
        AggFunc::Last => column().last(),
        AggFunc::Count => len(),
    };
    expr.alias(agg.alias.as_str())
}

/// Lazy plan for `query` over `df`.
pub fn plan(df: &DataFrame, query: &QuerySpec) -> LazyFrame {
    let mut lf = df.clone().lazy();
    if let Some(filter) = &query.filter {
        lf = lf.filter(predicate_expr(filter));
    }
    if !query.derive.is_empty() {
        let derived: Vec<Expr> = query
            .derive
            .iter()
            .map(|d| (col(d.column.as_str()) * lit(d.factor)).alias(d.alias.as_str()))
            .collect();
        lf = lf.with_columns(derived);
    }
    if query.is_aggregate() {
        let aggs: Vec<Expr> = query.aggregations.iter().map(agg_expr).collect();
        lf = if query.group_by.is_empty() {
            lf.select(aggs)
        } else {
            let keys: Vec<Expr> = query.group_by.iter().map(|k| col(k.as_str())).collect();
            lf.group_by(keys).agg(aggs)
        };
    }
    lf
}

impl TableEngine for PolarsEngine {
    type Dataset = DataFrame;

    fn name(&self) -> &str {
        self.name
    }

    fn load(&self, path: &Path) -> Result<DataFrame> {
        CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .map_err(engine_err)?
            .finish()
            .map_err(engine_err)
    }

    fn execute(&self, dataset: &DataFrame, query: &QuerySpec) -> Result<usize> {
        let out = plan(dataset, query).collect().map_err(engine_err)?;
        Ok(out.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Derived;

    fn trades() -> DataFrame {
        df!(
            "symbol" => ["A", "A", "B", "C"],
            "price" => [100.0, 600.0, 950.0, 700.0],
            "qty" => [5i64, 150, 20, 90]
        )
        .unwrap()
    }

    #[test]
    fn test_filters() {
        let engine = PolarsEngine::new();
        let mut q = QuerySpec::new("filter_simple", "trades");
        q.filter = Some(Predicate::compare("price", CmpOp::Gt, 500.0));
        assert_eq!(engine.execute(&trades(), &q).unwrap(), 3);

        q.filter = Some(Predicate::All {
            all: vec![
                Predicate::compare("price", CmpOp::Gt, 500.0),
                Predicate::compare("qty", CmpOp::Lt, 100.0),
            ],
        });
        assert_eq!(engine.execute(&trades(), &q).unwrap(), 2);

        q.filter = Some(Predicate::Compare {
            column: "price".into(),
            times: Some("qty".into()),
            op: CmpOp::Gt,
            value: 50000.0,
        });
        assert_eq!(engine.execute(&trades(), &q).unwrap(), 2);
    }

    #[test]
    fn test_group_and_derive() {
        let engine = PolarsEngine::new();
        let mut q = QuerySpec::new("ohlc_by_symbol", "trades");
        q.group_by = vec!["symbol".into()];
        q.aggregations = vec![
            Aggregation::new(AggFunc::First, "price", "open"),
            Aggregation::new(AggFunc::Max, "price", "high"),
            Aggregation::count("n"),
        ];
        assert_eq!(engine.execute(&trades(), &q).unwrap(), 3);

        let mut d = QuerySpec::new("update_price_x2", "trades");
        d.derive = vec![Derived {
            alias: "price_x2".into(),
            column: "price".into(),
            factor: 2.0,
        }];
        let out = plan(&trades(), &d).collect().unwrap();
        assert_eq!(out.height(), 4);
        assert_eq!(out.width(), 4);
    }

    #[test]
    fn test_load_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prices.csv");
        std::fs::write(&path, "symbol,price\nA,1.0\nB,2.0\n").unwrap();
        let df = PolarsEngine::new().load(&path).unwrap();
        assert_eq!(df.height(), 2);
    }
}
