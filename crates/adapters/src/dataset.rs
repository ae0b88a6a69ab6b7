// Copyright 2025 Framebench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Dataset scaling.

use crate::error::{AdapterError, Result};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

/// Write `dst` as the header of `src` followed by its data rows repeated
/// `scale` times.
///
/// An existing `dst` is reused untouched, so a scaled file is generated once
/// per scale factor.
pub fn ensure_scaled_csv(src: &Path, dst: &Path, scale: u32) -> Result<()> {
    if scale < 1 {
        return Err(AdapterError::InvalidScale(scale));
    }
    if dst.exists() {
        debug!(path = %dst.display(), "reusing scaled dataset");
        return Ok(());
    }

    let text = fs::read_to_string(src)?;
    let (header, body) = match text.split_once('\n') {
        Some((header, body)) => (header, body),
        None if !text.is_empty() => (text.as_str(), ""),
        None => return Err(AdapterError::Suite(format!("empty CSV: {}", src.display()))),
    };

    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut out = BufWriter::new(fs::File::create(dst)?);
    writeln!(out, "{}", header.trim_end_matches('\r'))?;
    if !body.is_empty() {
        for _ in 0..scale {
            out.write_all(body.as_bytes())?;
            if !body.ends_with('\n') {
                out.write_all(b"\n")?;
            }
        }
    }
    out.flush()?;

    info!(
        src = %src.display(),
        dst = %dst.display(),
        scale,
        "wrote scaled dataset"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_repeated_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("ohlcv.csv");
        let dst = dir.path().join("scale_3/ohlcv.csv");
        fs::write(&src, "symbol,close\nA,1.0\nB,2.0").unwrap();

        ensure_scaled_csv(&src, &dst, 3).unwrap();
        let out = fs::read_to_string(&dst).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0], "symbol,close");
        assert_eq!(lines.iter().filter(|l| **l == "symbol,close").count(), 1);
        assert_eq!(lines[5], "A,1.0");
    }

    #[test]
    fn test_scale_zero_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = ensure_scaled_csv(&dir.path().join("a"), &dir.path().join("b"), 0).unwrap_err();
        assert!(matches!(err, AdapterError::InvalidScale(0)));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_existing_destination_reused() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.csv");
        let dst = dir.path().join("dst.csv");
        fs::write(&src, "a\n1\n").unwrap();
        fs::write(&dst, "already here\n").unwrap();

        ensure_scaled_csv(&src, &dst, 4).unwrap();
        assert_eq!(fs::read_to_string(&dst).unwrap(), "already here\n");
    }

    #[test]
    fn test_empty_source_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("empty.csv");
        fs::write(&src, "").unwrap();
        assert!(ensure_scaled_csv(&src, &dir.path().join("out.csv"), 2).is_err());
    }
}
