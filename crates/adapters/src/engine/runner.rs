// Copyright 2025 Framebench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Subprocess invocation and output checks.

use crate::error::{AdapterError, Result};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::debug;

/// One engine process launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Executable.
    pub program: PathBuf,
    /// Working directory.
    pub cwd: PathBuf,
    /// Variables added to the inherited environment.
    pub env: Vec<(String, String)>,
    /// Text written to standard input, which is then closed.
    pub stdin: String,
}

/// Captured result of a finished process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` when terminated by a signal.
    pub exit_code: Option<i32>,
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
    /// Wall clock from spawn to exit.
    pub elapsed: Duration,
}

/// Launches processes. The seam tests replace with a fake.
#[cfg_attr(test, mockall::automock)]
pub trait ProcessRunner {
    /// Run to completion, blocking the caller. There is no timeout.
    fn run(&self, invocation: &Invocation) -> std::io::Result<ProcessOutput>;
}

/// Runs processes with [`std::process::Command`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> std::io::Result<ProcessOutput> {
        debug!(
            program = %invocation.program.display(),
            cwd = %invocation.cwd.display(),
            "spawning engine"
        );

        let start = Instant::now();
        let mut child = Command::new(&invocation.program)
            .current_dir(&invocation.cwd)
            .envs(invocation.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // An engine that exits or closes stdin early still has its exit
        // status and output collected below.
        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(invocation.stdin.as_bytes()) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                    debug!("engine closed stdin before reading all input");
                }
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(e);
                }
            }
        }
        let output = child.wait_with_output()?;
        let elapsed = start.elapsed();

        Ok(ProcessOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            elapsed,
        })
    }
}

/// Fail on a non-zero exit or on `marker` appearing, case-insensitively, in
/// either output stream. An empty marker disables the text check.
pub fn check_output(output: &ProcessOutput, marker: &str, stage: &str) -> Result<()> {
    let marker = marker.to_lowercase();
    let flagged = !marker.is_empty()
        && (output.stdout.to_lowercase().contains(&marker)
            || output.stderr.to_lowercase().contains(&marker));

    if output.exit_code == Some(0) && !flagged {
        return Ok(());
    }

    Err(AdapterError::EngineFailed {
        stage: stage.to_string(),
        exit_code: output.exit_code,
        stdout: output.stdout.clone(),
        stderr: output.stderr.clone(),
    })
}

/// Row count of the last table the engine printed (`rows: N`), 0 if none.
pub fn parse_rows(stdout: &str) -> u64 {
    stdout
        .lines()
        .rev()
        .find_map(|line| line.trim().strip_prefix("rows:"))
        .and_then(|n| n.trim().parse().ok())
        .unwrap_or(0)
}
