// Copyright 2025 Framebench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Declarative query descriptions for in-process engines.
//!
//! A [`QuerySpec`] is evaluated in a fixed order: filter, derived columns,
//! then aggregation (grouped when `group_by` is non-empty). A query with no
//! aggregations returns the filtered, derived rows.

use crate::error::{AdapterError, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Comparison operator of a [`Predicate::Compare`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CmpOp {
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `=`
    Eq,
    /// `<>`
    Ne,
}

impl CmpOp {
    /// SQL spelling of the operator.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Eq => "=",
            Self::Ne => "<>",
        }
    }
}

/// Row filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Predicate {
    /// `column [* times] <op> value`
    Compare {
        /// Left-hand column.
        column: String,
        /// Optional second column multiplied into the left-hand side.
        #[serde(default)]
        times: Option<String>,
        /// Operator.
        op: CmpOp,
        /// Right-hand constant.
        value: f64,
    },
    /// Conjunction.
    All {
        /// Operands.
        all: Vec<Predicate>,
    },
    /// Disjunction.
    Any {
        /// Operands.
        any: Vec<Predicate>,
    },
}

impl Predicate {
    /// Convenience constructor for a single-column comparison.
    pub fn compare(column: impl Into<String>, op: CmpOp, value: f64) -> Self {
        Self::Compare {
            column: column.into(),
            times: None,
            op,
            value,
        }
    }

    /// Render as a SQL boolean expression.
    pub fn to_sql(&self) -> String {
        match self {
            Self::Compare {
                column,
                times,
                op,
                value,
            } => {
                let lhs = match times {
                    Some(other) => format!("({} * {})", quote(column), quote(other)),
                    None => quote(column),
                };
                format!("{} {} {}", lhs, op.as_sql(), sql_number(*value))
            }
            Self::All { all } => join_sql(all, " AND "),
            Self::Any { any } => join_sql(any, " OR "),
        }
    }

    fn validate(&self) -> std::result::Result<(), String> {
        match self {
            Self::Compare { .. } => Ok(()),
            Self::All { all: parts } | Self::Any { any: parts } => {
                if parts.is_empty() {
                    return Err("empty predicate combinator".to_string());
                }
                parts.iter().try_for_each(Predicate::validate)
            }
        }
    }
}

fn join_sql(parts: &[Predicate], sep: &str) -> String {
    let rendered: Vec<String> = parts.iter().map(Predicate::to_sql).collect();
    format!("({})", rendered.join(sep))
}

/// Aggregation function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggFunc {
    /// Arithmetic mean.
    Mean,
    /// Sum.
    Sum,
    /// Minimum.
    Min,
    /// Maximum.
    Max,
    /// First value in input order.
    First,
    /// Last value in input order.
    Last,
    /// Row count; takes no column.
    Count,
}

/// One output column of an aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    /// Function applied.
    pub func: AggFunc,
    /// Input column, absent for `count`.
    #[serde(default)]
    pub column: Option<String>,
    /// Output column name.
    pub alias: String,
}

impl Aggregation {
    /// Create an aggregation over `column`.
    pub fn new(func: AggFunc, column: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            func,
            column: Some(column.into()),
            alias: alias.into(),
        }
    }

    /// Create a row count.
    pub fn count(alias: impl Into<String>) -> Self {
        Self {
            func: AggFunc::Count,
            column: None,
            alias: alias.into(),
        }
    }

    /// Render as a SQL select item.
    pub fn to_sql(&self) -> String {
        let column = self.column.as_deref().map(quote).unwrap_or_default();
        let call = match self.func {
            AggFunc::Mean => format!("avg({})", column),
            AggFunc::Sum => format!("sum({})", column),
            AggFunc::Min => format!("min({})", column),
            AggFunc::Max => format!("max({})", column),
            AggFunc::First => format!("first({})", column),
            AggFunc::Last => format!("last({})", column),
            AggFunc::Count => "count(*)".to_string(),
        };
        format!("{} AS {}", call, quote(&self.alias))
    }
}

/// Derived column `alias = column * factor`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Derived {
    /// Output column name.
    pub alias: String,
    /// Input column.
    pub column: String,
    /// Multiplier.
    pub factor: f64,
}

/// Declarative description of one benchmark query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySpec {
    /// Query identifier, as reported in results.
    pub name: String,
    /// Dataset the query runs against.
    pub dataset: String,
    /// Optional row filter.
    #[serde(default)]
    pub filter: Option<Predicate>,
    /// Group keys.
    #[serde(default)]
    pub group_by: Vec<String>,
    /// Aggregated output columns.
    #[serde(default)]
    pub aggregations: Vec<Aggregation>,
    /// Derived columns.
    #[serde(default)]
    pub derive: Vec<Derived>,
}

impl QuerySpec {
    /// Create an empty query that returns every row of `dataset`.
    pub fn new(name: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dataset: dataset.into(),
            filter: None,
            group_by: Vec::new(),
            aggregations: Vec::new(),
            derive: Vec::new(),
        }
    }

    /// True when the query produces one row per group or a single row.
    pub fn is_aggregate(&self) -> bool {
        !self.aggregations.is_empty()
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| AdapterError::Suite(format!("query {}: {}", self.name, msg));

        if !self.group_by.is_empty() && self.aggregations.is_empty() {
            return Err(invalid("group_by requires at least one aggregation".into()));
        }
        for agg in &self.aggregations {
            if agg.func != AggFunc::Count && agg.column.is_none() {
                return Err(invalid(format!("aggregation {} needs a column", agg.alias)));
            }
        }
        if let Some(filter) = &self.filter {
            filter.validate().map_err(invalid)?;
        }
        Ok(())
    }

    /// Render the query as SQL against `table`.
    pub fn to_sql(&self, table: &str) -> String {
        let where_clause = self
            .filter
            .as_ref()
            .map(|p| format!(" WHERE {}", p.to_sql()))
            .unwrap_or_default();
        let derived: Vec<String> = self
            .derive
            .iter()
            .map(|d| {
                format!(
                    "{} * {} AS {}",
                    quote(&d.column),
                    sql_number(d.factor),
                    quote(&d.alias)
                )
            })
            .collect();

        if !self.is_aggregate() {
            let mut select = String::from("*");
            for d in &derived {
                write!(select, ", {}", d).unwrap();
            }
            return format!("SELECT {} FROM {}{}", select, table, where_clause);
        }

        let source = if derived.is_empty() {
            format!("{}{}", table, where_clause)
        } else {
            format!(
                "(SELECT *, {} FROM {}{}) AS derived",
                derived.join(", "),
                table,
                where_clause
            )
        };

        let keys: Vec<String> = self.group_by.iter().map(|k| quote(k)).collect();
        let items: Vec<String> = keys
            .iter()
            .cloned()
            .chain(self.aggregations.iter().map(Aggregation::to_sql))
            .collect();

        let mut sql = format!("SELECT {} FROM {}", items.join(", "), source);
        if !keys.is_empty() {
            write!(sql, " GROUP BY {}", keys.join(", ")).unwrap();
        }
        sql
    }
}

fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn sql_number(value: f64) -> String {
    format!("{:?}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grouped_mean_sql() {
        let mut q = QuerySpec::new("mean_by_symbol", "prices");
        q.group_by = vec!["symbol".into()];
        q.aggregations = vec![Aggregation::new(AggFunc::Mean, "price", "avg_price")];
        assert_eq!(
            q.to_sql("prices"),
            r#"SELECT "symbol", avg("price") AS "avg_price" FROM prices GROUP BY "symbol""#
        );
    }

    #[test]
    fn test_filter_and_product_sql() {
        let mut q = QuerySpec::new("filter_arith", "trades");
        q.filter = Some(Predicate::Compare {
            column: "price".into(),
            times: Some("qty".into()),
            op: CmpOp::Gt,
            value: 50000.0,
        });
        assert_eq!(
            q.to_sql("trades"),
            r#"SELECT * FROM trades WHERE ("price" * "qty") > 50000.0"#
        );

        q.filter = Some(Predicate::Any {
            any: vec![
                Predicate::compare("price", CmpOp::Gt, 900.0),
                Predicate::compare("qty", CmpOp::Lt, 10.0),
            ],
        });
        assert_eq!(
            q.to_sql("trades"),
            r#"SELECT * FROM trades WHERE ("price" > 900.0 OR "qty" < 10.0)"#
        );
    }

    #[test]
    fn test_derive_sql() {
        let mut q = QuerySpec::new("update_price_x2", "prices");
        q.derive = vec![Derived {
            alias: "price_x2".into(),
            column: "price".into(),
            factor: 2.0,
        }];
        assert_eq!(
            q.to_sql("prices"),
            r#"SELECT *, "price" * 2.0 AS "price_x2" FROM prices"#
        );
    }

    #[test]
    fn test_count_by_two_keys_sql() {
        let mut q = QuerySpec::new("count_by_symbol_day", "prices_multi");
        q.group_by = vec!["symbol".into(), "day".into()];
        q.aggregations = vec![Aggregation::count("n")];
        assert_eq!(
            q.to_sql("t"),
            r#"SELECT "symbol", "day", count(*) AS "n" FROM t GROUP BY "symbol", "day""#
        );
    }

    #[test]
    fn test_validate_rejects_inconsistent_specs() {
        let mut q = QuerySpec::new("bad", "prices");
        q.group_by = vec!["symbol".into()];
        assert!(q.validate().is_err());

        q.aggregations = vec![Aggregation {
            func: AggFunc::Sum,
            column: None,
            alias: "total".into(),
        }];
        assert!(q.validate().is_err());

        q.aggregations = vec![Aggregation::count("n")];
        q.filter = Some(Predicate::All { all: vec![] });
        assert!(q.validate().is_err());

        q.filter = None;
        assert!(q.validate().is_ok());
    }

    #[test]
    fn test_predicate_deserializes_from_toml() {
        let text = r#"
            kind = "all"
            all = [
                { kind = "compare", column = "price", op = "gt", value = 500.0 },
                { kind = "compare", column = "qty", op = "lt", value = 100.0 },
            ]
        "#;
        let p: Predicate = toml::from_str(text).unwrap();
        assert_eq!(p.to_sql(), r#"("price" > 500.0 AND "qty" < 100.0)"#);
    }
}
