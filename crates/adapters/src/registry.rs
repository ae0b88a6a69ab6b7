// Copyright 2025 Framebench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Adapter construction by framework name.

use crate::engine::{EngineBuild, EngineConfig, ExternalEngineAdapter};
use crate::error::{AdapterError, Result};
use crate::suite::Suite;
use crate::FrameworkAdapter;
use std::path::Path;

/// Everything needed to build any adapter.
#[derive(Debug, Clone, Copy)]
pub struct AdapterContext<'a> {
    /// Suite being run, with dataset paths already resolved.
    pub suite: &'a Suite,
    /// Repository root; the engine runs with this as working directory.
    pub repo_root: &'a Path,
    /// Scratch directory for generated scripts.
    pub work_dir: &'a Path,
    /// Explicit engine build directory.
    pub build_dir: Option<&'a Path>,
    /// External engine settings.
    pub engine: &'a EngineConfig,
}

/// Names of the in-process frameworks this build supports.
pub fn in_process_frameworks() -> Vec<&'static str> {
    let mut names = Vec::new();
    if cfg!(feature = "polars") {
        names.extend(["polars", "polars-st"]);
    }
    if cfg!(feature = "duckdb") {
        names.extend(["duckdb", "duckdb-st"]);
    }
    names
}

/// Resolve the requested names to the frameworks to build, applying the
/// single-thread mapping and rejecting combinations that cannot share one
/// process.
pub fn resolve_frameworks(requested: &[String], single_thread: bool) -> Result<Vec<String>> {
    let mut resolved: Vec<String> = Vec::new();
    for name in requested {
        let name = match name.as_str() {
            "polars" | "duckdb" if single_thread => format!("{}-st", name),
            other => other.to_string(),
        };
        if !resolved.contains(&name) {
            resolved.push(name);
        }
    }

    let has = |n: &str| resolved.iter().any(|r| r == n);
    if has("polars") && has("polars-st") {
        return Err(AdapterError::ConflictingFrameworks(
            "polars".into(),
            "polars-st".into(),
        ));
    }
    Ok(resolved)
}

/// Build the adapter for one framework. Every configuration check happens
/// here, before anything is measured.
pub fn create_adapter(name: &str, ctx: &AdapterContext<'_>) -> Result<Box<dyn FrameworkAdapter>> {
    if name == ctx.engine.framework {
        let build = EngineBuild::discover(ctx.repo_root, ctx.build_dir, ctx.engine)?;
        return Ok(Box::new(ExternalEngineAdapter::new(
            ctx.engine.clone(),
            build,
            ctx.repo_root,
            ctx.work_dir,
            ctx.suite,
        )));
    }

    match name {
        "polars" | "polars-st" => polars_adapter(name, ctx),
        "duckdb" | "duckdb-st" => duckdb_adapter(name, ctx),
        other => Err(AdapterError::UnknownFramework(other.to_string())),
    }
}

#[cfg(feature = "polars")]
fn polars_adapter(name: &str, ctx: &AdapterContext<'_>) -> Result<Box<dyn FrameworkAdapter>> {
    use crate::inprocess::InProcessAdapter;
    use crate::polars_engine::PolarsEngine;

    let engine = if name == "polars-st" {
        PolarsEngine::single_threaded()
    } else {
        PolarsEngine::new()
    };
    Ok(Box::new(InProcessAdapter::new(engine, ctx.suite)))
}

#[cfg(not(feature = "polars"))]
fn polars_adapter(name: &str, _ctx: &AdapterContext<'_>) -> Result<Box<dyn FrameworkAdapter>> {
    Err(AdapterError::FrameworkUnavailable {
        framework: name.to_string(),
        feature: "polars".to_string(),
    })
}

#[cfg(feature = "duckdb")]
fn duckdb_adapter(name: &str, ctx: &AdapterContext<'_>) -> Result<Box<dyn FrameworkAdapter>> {
    use crate::duckdb_engine::DuckDbEngine;
    use crate::inprocess::InProcessAdapter;

    let engine = if name == "duckdb-st" {
        DuckDbEngine::single_threaded()
    } else {
        DuckDbEngine::new()
    };
    Ok(Box::new(InProcessAdapter::new(engine, ctx.suite)))
}

#[cfg(not(feature = "duckdb"))]
fn duckdb_adapter(name: &str, _ctx: &AdapterContext<'_>) -> Result<Box<dyn FrameworkAdapter>> {
    Err(AdapterError::FrameworkUnavailable {
        framework: name.to_string(),
        feature: "duckdb".to_string(),
    })
}
