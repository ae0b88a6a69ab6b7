// Copyright 2025 Framebench Contributors
// SPDX-License-Identifier: Apache-2.0

//! framebench CLI entry point.

fn main() {
    if let Err(e) = framebench_cli::run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
