// Copyright 2025 Framebench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Engine build discovery.

use super::EngineConfig;
use crate::error::{AdapterError, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A located engine build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineBuild {
    /// Build directory the binary was found in.
    pub build_dir: PathBuf,
    /// Engine executable.
    pub binary: PathBuf,
    /// Plugin directory exported through the library path variable.
    pub plugin_dir: PathBuf,
}

impl EngineBuild {
    /// Locate the engine under `repo_root`.
    ///
    /// An explicit `build_dir` is used only if it contains the binary.
    /// Otherwise the configured candidates are probed in order and the
    /// first containing the binary wins. Relative paths resolve against
    /// `repo_root`.
    pub fn discover(
        repo_root: &Path,
        build_dir: Option<&Path>,
        config: &EngineConfig,
    ) -> Result<Self> {
        let candidates: Vec<PathBuf> = match build_dir {
            Some(dir) => vec![repo_root.join(dir)],
            None => config
                .build_candidates
                .iter()
                .map(|c| repo_root.join(c))
                .collect(),
        };

        let build_dir = candidates
            .iter()
            .find(|dir| dir.join(&config.binary).is_file())
            .cloned()
            .ok_or_else(|| AdapterError::NoBuildFound {
                searched: candidates.clone(),
            })?;

        let plugin_candidates: Vec<PathBuf> = config
            .plugin_candidates
            .iter()
            .map(|c| build_dir.join(c))
            .collect();
        let plugin_dir = plugin_candidates
            .iter()
            .find(|dir| dir.is_dir())
            .cloned()
            .ok_or(AdapterError::MissingPlugin {
                searched: plugin_candidates.clone(),
            })?;

        let binary = build_dir.join(&config.binary);
        debug!(
            build_dir = %build_dir.display(),
            plugin_dir = %plugin_dir.display(),
            "engine build found"
        );

        Ok(Self {
            build_dir,
            binary,
            plugin_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn fake_build(root: &Path, dir: &str, plugin: &str) {
        let tools = root.join(dir).join("tools");
        fs::create_dir_all(&tools).unwrap();
        fs::write(tools.join("ibex"), "").unwrap();
        fs::create_dir_all(root.join(dir).join(plugin)).unwrap();
    }

    #[test]
    fn test_candidates_probed_in_priority_order() {
        let root = tempfile::tempdir().unwrap();
        fake_build(root.path(), "build", "libs/csv");
        fake_build(root.path(), "build-release", "libraries");

        let build = EngineBuild::discover(root.path(), None, &EngineConfig::default()).unwrap();
        assert_eq!(build.build_dir, root.path().join("build-release"));
        assert_eq!(build.binary, root.path().join("build-release/tools/ibex"));
        assert_eq!(build.plugin_dir, root.path().join("build-release/libraries"));
    }

    #[test]
    fn test_falls_back_to_second_candidate() {
        let root = tempfile::tempdir().unwrap();
        fake_build(root.path(), "build", "libs/csv");
        fs::create_dir_all(root.path().join("build-release")).unwrap();

        let build = EngineBuild::discover(root.path(), None, &EngineConfig::default()).unwrap();
        assert_eq!(build.build_dir, root.path().join("build"));
        assert_eq!(build.plugin_dir, root.path().join("build/libs/csv"));
    }

    #[test]
    fn test_no_build_lists_searched_dirs() {
        let root = tempfile::tempdir().unwrap();
        let err = EngineBuild::discover(root.path(), None, &EngineConfig::default()).unwrap_err();
        match err {
            AdapterError::NoBuildFound { searched } => {
                assert_eq!(
                    searched,
                    vec![root.path().join("build-release"), root.path().join("build")]
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_explicit_build_dir_must_contain_binary() {
        let root = tempfile::tempdir().unwrap();
        fake_build(root.path(), "build", "libs/csv");

        let err = EngineBuild::discover(root.path(), Some(Path::new("custom")), &EngineConfig::default())
            .unwrap_err();
        assert!(matches!(err, AdapterError::NoBuildFound { .. }));

        let build =
            EngineBuild::discover(root.path(), Some(Path::new("build")), &EngineConfig::default())
                .unwrap();
        assert_eq!(build.build_dir, root.path().join("build"));
    }

    #[test]
    fn test_missing_plugin_dir() {
        let root = tempfile::tempdir().unwrap();
        let tools = root.path().join("build/tools");
        fs::create_dir_all(&tools).unwrap();
        fs::write(tools.join("ibex"), "").unwrap();

        let err = EngineBuild::discover(root.path(), None, &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, AdapterError::MissingPlugin { .. }));
        assert!(err.is_configuration());
    }
}
