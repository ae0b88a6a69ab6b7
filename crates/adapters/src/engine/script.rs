// Copyright 2025 Framebench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Engine script materialization.

use crate::error::{AdapterError, Result};
use crate::suite::Suite;
use std::fs;
use std::path::PathBuf;

/// Writes engine scripts: a prelude, one CSV load per dataset, then a body
/// repeated once per execution.
#[derive(Debug, Clone)]
pub struct ScriptWriter {
    dir: PathBuf,
    prelude: Option<String>,
    datasets: Vec<(String, PathBuf)>,
}

impl ScriptWriter {
    /// Create a writer placing scripts in `dir`, with the suite's prelude
    /// and dataset paths.
    pub fn new(dir: impl Into<PathBuf>, suite: &Suite) -> Self {
        Self {
            dir: dir.into(),
            prelude: suite.engine_prelude.clone(),
            datasets: suite
                .datasets
                .iter()
                .map(|d| (d.name.clone(), d.path.clone()))
                .collect(),
        }
    }

    /// Names of every known dataset.
    pub fn dataset_names(&self) -> Vec<String> {
        self.datasets.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Script text loading `datasets` then running `body` `repeats` times
    /// (at least once). Blocks are separated by blank lines.
    pub fn render(&self, datasets: &[String], body: &str, repeats: u64) -> Result<String> {
        let mut blocks: Vec<String> = Vec::new();
        if let Some(prelude) = &self.prelude {
            blocks.push(prelude.trim().to_string());
        }
        for name in datasets {
            let (_, path) = self
                .datasets
                .iter()
                .find(|(n, _)| n == name)
                .ok_or_else(|| AdapterError::UnknownDataset(name.clone()))?;
            blocks.push(format!("let {} = read_csv(\"{}\");", name, path.display()));
        }
        let body = body.trim();
        for _ in 0..repeats.max(1) {
            blocks.push(body.to_string());
        }
        Ok(blocks.join("\n\n") + "\n")
    }

    /// Render and write `<dir>/<name>_<repeats>.ibex`, returning its path.
    pub fn write(&self, name: &str, datasets: &[String], body: &str, repeats: u64) -> Result<PathBuf> {
        let text = self.render(datasets, body, repeats)?;
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!("{}_{}.ibex", name, repeats.max(1)));
        fs::write(&path, text)?;
        Ok(path)
    }
}
