// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the hgu-opc-client project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

// Load a configuration file and dump what the clients would use
use anyhow::Result;
use clap::Parser;
use hgu_opc_client::config::Config;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(author, version, about = "Check hgu.yaml for detecting errors", long_about = None)]
struct Args {
    /// Input file path (.yaml)
    ///
    /// The path where the configuration file is located.
    /// should be .yaml or .yml format.
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    // Loading a missing file would write a default one in its place
    if !Path::new(&args.input).exists() {
        eprintln!(
            "Error: Input file '{}' does not exist",
            args.input.display()
        );
        std::process::exit(1);
    }

    let path = args.input.as_path();
    println!("Testing file: {:?}", path);

    match Config::from_file(path) {
        Ok(config) => {
            println!("Validation succeeded");
            println!("  OPC gateway:    {}", config.backend.opc_base_url);
            println!("  Influx gateway: {}", config.backend.influx_base_url);
            println!("  Timeout:        {}ms", config.backend.request_timeout_ms);
            println!(
                "  Cache TTL:      {}ms (influx {}ms, guard {})",
                config.cache.ttl_ms, config.cache.influx_ttl_ms, config.cache.generation_guard
            );
            println!("  Token file:     {}", config.auth.token_file.display());
        }
        Err(e) => println!("Validation failed: {}", e),
    }

    Ok(())
}
