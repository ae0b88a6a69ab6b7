// Copyright 2025 Framebench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Benchmark suites.
//!
//! A suite is a TOML file naming the datasets, the queries (both the
//! in-process description and the external engine text) and an optional
//! multi-step pipeline:
//!
//! ```toml
//! engine_prelude = 'extern fn read_csv(path: String) -> DataFrame from "csv.hpp";'
//!
//! [[datasets]]
//! name = "prices"
//! path = "data/prices.csv"
//!
//! [[queries]]
//! name = "mean_by_symbol"
//! dataset = "prices"
//! engine = "prices[select { avg_price = mean(price) }, by symbol];"
//! group_by = ["symbol"]
//! aggregations = [{ func = "mean", column = "price", alias = "avg_price" }]
//! ```

use crate::dataset::ensure_scaled_csv;
use crate::error::{AdapterError, Result};
use crate::query::{Aggregation, Derived, Predicate, QuerySpec};
use framebench_benchmarks::PipelineStep;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Query id under which the whole pipeline is benchmarked.
pub const DEFAULT_PIPELINE_NAME: &str = "quant_pipeline";

/// A named CSV dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetDef {
    /// Name used by queries and as the engine variable.
    pub name: String,
    /// CSV path; relative paths resolve against the repository root.
    pub path: PathBuf,
    /// Whether the row-count scale factor applies to this dataset.
    #[serde(default)]
    pub scale: bool,
}

/// A suite query: the in-process description plus the engine text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteQuery {
    /// Query identifier.
    pub name: String,
    /// Dataset name.
    pub dataset: String,
    /// External engine statement(s); the engine does not run the query when
    /// absent.
    #[serde(default)]
    pub engine: Option<String>,
    /// Row filter.
    #[serde(default)]
    pub filter: Option<Predicate>,
    /// Group keys.
    #[serde(default)]
    pub group_by: Vec<String>,
    /// Aggregations.
    #[serde(default)]
    pub aggregations: Vec<Aggregation>,
    /// Derived columns.
    #[serde(default)]
    pub derive: Vec<Derived>,
    /// Set when the query has no in-process description.
    #[serde(default)]
    pub engine_only: bool,
}

impl SuiteQuery {
    /// The in-process description of this query.
    pub fn spec(&self) -> QuerySpec {
        QuerySpec {
            name: self.name.clone(),
            dataset: self.dataset.clone(),
            filter: self.filter.clone(),
            group_by: self.group_by.clone(),
            aggregations: self.aggregations.clone(),
            derive: self.derive.clone(),
        }
    }
}

/// A query as run by the external engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineQuery {
    /// Query identifier.
    pub name: String,
    /// Datasets the script must load before the body.
    pub datasets: Vec<String>,
    /// Body repeated once per execution.
    pub body: String,
}

/// A complete benchmark suite.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Suite {
    /// Line prepended to every engine script.
    #[serde(default)]
    pub engine_prelude: Option<String>,
    /// Query id of the whole pipeline.
    #[serde(default)]
    pub pipeline_name: Option<String>,
    /// Datasets.
    #[serde(default)]
    pub datasets: Vec<DatasetDef>,
    /// Queries.
    #[serde(default)]
    pub queries: Vec<SuiteQuery>,
    /// Ordered pipeline steps, profiled one prefix at a time.
    #[serde(default)]
    pub pipeline: Vec<PipelineStep>,
}

impl Suite {
    /// Load and validate a suite file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            AdapterError::Suite(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::parse(&text)
    }

    /// Parse and validate suite text.
    pub fn parse(text: &str) -> Result<Self> {
        let suite: Suite = toml::from_str(text)?;
        suite.validate()?;
        Ok(suite)
    }

    /// Check names are unique and every reference resolves.
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for dataset in &self.datasets {
            if !names.insert(dataset.name.as_str()) {
                return Err(AdapterError::Suite(format!(
                    "duplicate dataset {}",
                    dataset.name
                )));
            }
        }

        let mut query_names = HashSet::new();
        for query in &self.queries {
            if !query_names.insert(query.name.as_str()) {
                return Err(AdapterError::Suite(format!("duplicate query {}", query.name)));
            }
            if !names.contains(query.dataset.as_str()) {
                return Err(AdapterError::UnknownDataset(query.dataset.clone()));
            }
            if query.engine_only && query.engine.is_none() {
                return Err(AdapterError::Suite(format!(
                    "query {} is engine_only but has no engine text",
                    query.name
                )));
            }
            query.spec().validate()?;
        }

        if !self.pipeline.is_empty() && query_names.contains(self.pipeline_name()) {
            return Err(AdapterError::Suite(format!(
                "query {} collides with the pipeline name",
                self.pipeline_name()
            )));
        }
        Ok(())
    }

    /// Query id of the whole pipeline.
    pub fn pipeline_name(&self) -> &str {
        self.pipeline_name.as_deref().unwrap_or(DEFAULT_PIPELINE_NAME)
    }

    /// Look up a dataset.
    pub fn dataset(&self, name: &str) -> Result<&DatasetDef> {
        self.datasets
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| AdapterError::UnknownDataset(name.to_string()))
    }

    /// Resolve relative dataset paths against `root`.
    pub fn with_root(mut self, root: &Path) -> Self {
        for dataset in &mut self.datasets {
            if dataset.path.is_relative() {
                dataset.path = root.join(&dataset.path);
            }
        }
        self
    }

    /// Point scalable datasets at copies with their rows repeated `scale`
    /// times, generating the copies under `scratch_dir` when missing.
    pub fn scaled(mut self, scale: u32, scratch_dir: &Path) -> Result<Self> {
        if scale < 1 {
            return Err(AdapterError::InvalidScale(scale));
        }
        if scale == 1 {
            return Ok(self);
        }

        let dir = scratch_dir.join(format!("scale_{}", scale));
        for dataset in self.datasets.iter_mut().filter(|d| d.scale) {
            let file_name = dataset
                .path
                .file_name()
                .map(|n| n.to_os_string())
                .unwrap_or_else(|| format!("{}.csv", dataset.name).into());
            let dst = dir.join(file_name);
            ensure_scaled_csv(&dataset.path, &dst, scale)?;
            dataset.path = dst;
        }
        Ok(self)
    }

    /// In-process descriptions of every query that has one.
    pub fn in_process_queries(&self) -> Vec<QuerySpec> {
        self.queries
            .iter()
            .filter(|q| !q.engine_only)
            .map(SuiteQuery::spec)
            .collect()
    }

    /// Engine queries: every query with engine text, then the pipeline as a
    /// whole when one is defined.
    pub fn engine_queries(&self) -> Vec<EngineQuery> {
        let mut queries: Vec<EngineQuery> = self
            .queries
            .iter()
            .filter_map(|q| {
                q.engine.as_ref().map(|body| EngineQuery {
                    name: q.name.clone(),
                    datasets: vec![q.dataset.clone()],
                    body: body.trim().to_string(),
                })
            })
            .collect();

        if !self.pipeline.is_empty() {
            queries.push(EngineQuery {
                name: self.pipeline_name().to_string(),
                datasets: self.datasets.iter().map(|d| d.name.clone()).collect(),
                body: pipeline_body(&self.pipeline),
            });
        }
        queries
    }
}

/// Step texts joined into one block.
pub fn pipeline_body(steps: &[PipelineStep]) -> String {
    steps
        .iter()
        .map(|s| s.text.trim())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUITE: &str = r#"
engine_prelude = 'extern fn read_csv(path: String) -> DataFrame from "csv.hpp";'

[[datasets]]
name = "ohlcv"
path = "data/ohlcv.csv"
scale = true

[[datasets]]
name = "fund"
path = "data/fundamentals.csv"

[[queries]]
name = "mean_by_symbol"
dataset = "ohlcv"
engine = "ohlcv[select { m = mean(close) }, by symbol];"
group_by = ["symbol"]
aggregations = [{ func = "mean", column = "close", alias = "m" }]

[[queries]]
name = "filter_events"
dataset = "ohlcv"
engine = "ohlcv[filter close > 1.0];"
engine_only = true

[[pipeline]]
label = "daily update"
engine = "let daily = ohlcv[update { ret = (close - open) / open }];"

[[pipeline]]
label = "annual"
engine = "let annual = daily[select { hi = max(high) }, by symbol];"
"#;

    #[test]
    fn test_parse_and_split_queries() {
        let suite = Suite::parse(SUITE).unwrap();
        assert_eq!(suite.datasets.len(), 2);

        let in_process: Vec<String> = suite.in_process_queries().into_iter().map(|q| q.name).collect();
        assert_eq!(in_process, vec!["mean_by_symbol"]);

        let engine = suite.engine_queries();
        assert_eq!(engine.len(), 3);
        assert_eq!(engine[2].name, DEFAULT_PIPELINE_NAME);
        assert_eq!(engine[2].datasets, vec!["ohlcv", "fund"]);
        assert!(engine[2].body.contains("ret = (close - open) / open }];\n\nlet annual"));
        assert_eq!(suite.pipeline[0].label, "daily update");
    }

    #[test]
    fn test_unknown_dataset_rejected() {
        let text = r#"
[[queries]]
name = "q"
dataset = "missing"
engine = "x;"
"#;
        assert!(matches!(
            Suite::parse(text),
            Err(AdapterError::UnknownDataset(name)) if name == "missing"
        ));
    }

    #[test]
    fn test_duplicate_query_rejected() {
        let text = r#"
[[datasets]]
name = "d"
path = "d.csv"

[[queries]]
name = "q"
dataset = "d"

[[queries]]
name = "q"
dataset = "d"
"#;
        assert!(matches!(Suite::parse(text), Err(AdapterError::Suite(_))));
    }

    #[test]
    fn test_scaled_rewrites_only_scalable_paths() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("data")).unwrap();
        fs::write(dir.path().join("data/ohlcv.csv"), "symbol,close\nA,1\n").unwrap();
        fs::write(dir.path().join("data/fundamentals.csv"), "symbol,beta\nA,1\n").unwrap();

        let suite = Suite::parse(SUITE)
            .unwrap()
            .with_root(dir.path())
            .scaled(2, &dir.path().join("scratch"))
            .unwrap();

        let ohlcv = suite.dataset("ohlcv").unwrap();
        assert_eq!(ohlcv.path, dir.path().join("scratch/scale_2/ohlcv.csv"));
        assert_eq!(fs::read_to_string(&ohlcv.path).unwrap(), "symbol,close\nA,1\nA,1\n");
        assert_eq!(
            suite.dataset("fund").unwrap().path,
            dir.path().join("data/fundamentals.csv")
        );
    }

    #[test]
    fn test_scale_one_is_identity() {
        let suite = Suite::parse(SUITE).unwrap();
        let same = suite.clone().scaled(1, Path::new("/nonexistent")).unwrap();
        assert_eq!(same, suite);
        assert!(suite.clone().scaled(0, Path::new("/nonexistent")).is_err());
    }

    #[test]
    fn test_bundled_suites_parse() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../suites");

        let prices = Suite::load(root.join("prices.toml")).unwrap();
        assert_eq!(prices.queries.len(), 10);
        assert_eq!(prices.in_process_queries().len(), 10);
        assert!(prices.pipeline.is_empty());

        let quant = Suite::load(root.join("quant.toml")).unwrap();
        assert_eq!(quant.pipeline.len(), 12);
        assert_eq!(quant.pipeline[8].label, "enrich + sym_stats");
        let engine = quant.engine_queries();
        assert_eq!(engine.len(), 1);
        assert_eq!(engine[0].name, DEFAULT_PIPELINE_NAME);
        assert_eq!(engine[0].datasets, vec!["ohlcv", "fund"]);
    }
}
