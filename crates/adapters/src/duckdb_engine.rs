// Copyright 2025 Framebench Contributors
// SPDX-License-Identifier: Apache-2.0

//! DuckDB engine.
//!
//! Each dataset gets its own in-memory connection holding one table named
//! `data`; queries are rendered to SQL with [`QuerySpec::to_sql`].

use crate::error::{AdapterError, Result};
use crate::inprocess::TableEngine;
use crate::query::QuerySpec;
use duckdb::Connection;
use std::path::Path;

const TABLE: &str = "data";

/// DuckDB, multi-threaded or pinned to one thread.
#[derive(Debug, Clone)]
pub struct DuckDbEngine {
    name: &'static str,
    single_thread: bool,
}

impl DuckDbEngine {
    /// Multi-threaded engine, recorded as `duckdb`.
    pub fn new() -> Self {
        Self {
            name: "duckdb",
            single_thread: false,
        }
    }

    /// Single-threaded engine, recorded as `duckdb-st`.
    pub fn single_threaded() -> Self {
        Self {
            name: "duckdb-st",
            single_thread: true,
        }
    }
}

impl Default for DuckDbEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn engine_err(context: &str, e: duckdb::Error) -> AdapterError {
    AdapterError::Engine(format!("DuckDB {}: {}", context, e))
}

impl TableEngine for DuckDbEngine {
    type Dataset = Connection;

    fn name(&self) -> &str {
        self.name
    }

    fn load(&self, path: &Path) -> Result<Connection> {
        let conn = Connection::open_in_memory().map_err(|e| engine_err("open", e))?;
        if self.single_thread {
            conn.execute_batch("SET threads TO 1;")
                .map_err(|e| engine_err("config", e))?;
        }
        let source = path.display().to_string().replace('\'', "''");
        conn.execute_batch(&format!(
            "CREATE TABLE {} AS SELECT * FROM read_csv_auto('{}');",
            TABLE, source
        ))
        .map_err(|e| engine_err("load", e))?;
        Ok(conn)
    }

    fn execute(&self, dataset: &Connection, query: &QuerySpec) -> Result<usize> {
        let sql = query.to_sql(TABLE);
        let mut stmt = dataset.prepare(&sql).map_err(|e| engine_err("prepare", e))?;
        let mut rows = stmt.query([]).map_err(|e| engine_err("query", e))?;
        let mut count = 0;
        while rows.next().map_err(|e| engine_err("next", e))?.is_some() {
            count += 1;
        }
        Ok(count)
    }
}
