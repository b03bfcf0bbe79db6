// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the hgu-opc-client project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use anyhow::{Context, Result};
use std::env;
use std::process::Command;

/// Run a git command and return its trimmed standard output
fn git_output(args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(args)
        .output()
        .with_context(|| format!("Failed to execute git {}", args.join(" ")))?;

    if !output.status.success() {
        return Err(anyhow::anyhow!(
            "Git command failed: {}",
            String::from_utf8_lossy(&output.stderr)
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn get_git_info() -> Result<(String, String, String)> {
    let short_hash = git_output(&["rev-parse", "--short", "HEAD"])?;
    let full_hash = git_output(&["rev-parse", "HEAD"])?;
    let date = git_output(&["log", "-1", "--format=%ci"])?;

    // Add dirty marker if working directory has uncommitted changes
    let is_dirty = !git_output(&["status", "--porcelain"])?.is_empty();
    if is_dirty {
        Ok((
            format!("{}-dirty", short_hash),
            format!("{}-dirty", full_hash),
            date,
        ))
    } else {
        Ok((short_hash, full_hash, date))
    }
}

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs");
    println!("cargo:rerun-if-changed=resources/config.schema.json");

    match get_git_info() {
        Ok((short_hash, full_hash, commit_date)) => {
            println!("cargo:rustc-env=GIT_COMMIT_HASH_SHORT={}", short_hash);
            println!("cargo:rustc-env=GIT_COMMIT_HASH_FULL={}", full_hash);
            println!("cargo:rustc-env=GIT_COMMIT_DATE={}", commit_date);
        }
        Err(e) => {
            println!("cargo:warning=Failed to get Git information: {}", e);
            println!("cargo:rustc-env=GIT_COMMIT_HASH_SHORT=unknown");
            println!("cargo:rustc-env=GIT_COMMIT_HASH_FULL=unknown");
            println!("cargo:rustc-env=GIT_COMMIT_DATE=unknown");
        }
    }

    let build_timestamp = chrono::Utc::now()
        .format("%Y-%m-%d %H:%M:%S UTC")
        .to_string();
    println!("cargo:rustc-env=BUILD_TIMESTAMP={}", build_timestamp);

    let target = env::var("TARGET").unwrap_or_else(|_| "unknown".to_string());
    println!("cargo:rustc-env=BUILD_TARGET={}", target);
}
