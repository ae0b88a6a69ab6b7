// Copyright 2025 Framebench Contributors
// SPDX-License-Identifier: Apache-2.0

//! JSON and markdown exports of a result store.
//!
//! The tab-separated file written by [`ResultStore::serialize`] stays the
//! canonical artifact; these exports are conveniences for other tooling.

use crate::error::Result;
use crate::markdown;
use crate::result::BenchmarkResult;
use crate::store::ResultStore;
use std::fs;
use std::path::Path;

fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

/// Write benchmark results to a JSON file.
pub fn write_results_json(store: &ResultStore, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    ensure_parent(path)?;
    let json = serde_json::to_string_pretty(store.results())?;
    fs::write(path, json)?;
    Ok(())
}

/// Read results from a JSON file written by [`write_results_json`].
pub fn read_results_json(path: impl AsRef<Path>) -> Result<ResultStore> {
    let content = fs::read_to_string(path)?;
    let results: Vec<BenchmarkResult> = serde_json::from_str(&content)?;
    Ok(results.into_iter().collect())
}

/// Write the markdown summary file.
pub fn write_summary(store: &ResultStore, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    ensure_parent(path)?;
    fs::write(path, markdown::generate_summary(store))?;
    Ok(())
}
