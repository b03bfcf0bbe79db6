// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the hgu-opc-client project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

// Command line front end for the HGU OPC gateway
use anyhow::{Context, Result};
use clap::Parser;
use hgu_opc_client::build_info;
use hgu_opc_client::client::{
    AuthEvent, AuthSession, BatchReadResponse, InfluxClient, OpcClient, OpcClientBuilder,
};
use hgu_opc_client::config::{self, Config};
use hgu_opc_client::opc::{variable_request_map, MotorIndex, PageId};
use log::{info, warn};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

/// Batch reads, writes and diagnostics against the HGU OPC gateway
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (YAML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Validate a configuration file and exit
    #[arg(long)]
    validate_config: Option<PathBuf>,

    /// Print the configuration JSON schema and exit
    #[arg(long)]
    show_config_schema: bool,

    /// Print build information and exit
    #[arg(long)]
    build_info: bool,

    /// Override the OPC gateway base URL
    #[arg(long)]
    opc_url: Option<String>,

    /// Override the Influx base URL
    #[arg(long)]
    influx_url: Option<String>,

    /// Override the request timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Override the read cache TTL in milliseconds
    #[arg(long)]
    cache_ttl_ms: Option<u64>,

    /// Override the credential file
    #[arg(long)]
    token_file: Option<PathBuf>,

    /// Store a bearer token before running the other actions
    #[arg(long, value_name = "TOKEN")]
    token: Option<String>,

    /// Forget the stored token and exit
    #[arg(long)]
    logout: bool,

    /// Print the variables requested by every page and exit
    #[arg(long)]
    list_pages: bool,

    /// Read one page (main, motors, logs, alarms, stats)
    #[arg(long)]
    page: Option<PageId>,

    /// Read every page's variables at once
    #[arg(long)]
    all: bool,

    /// Read the leak sensor of every motor
    #[arg(long)]
    leakage: bool,

    /// Repeat the selected read at the configured polling interval
    #[arg(long)]
    watch: bool,

    /// Write NAME=VALUE; VALUE is parsed as JSON when possible
    #[arg(long, value_name = "NAME=VALUE")]
    write: Vec<String>,

    /// Treat --write names as logical keys of this motor (1-7)
    #[arg(long)]
    motor: Option<u8>,

    /// Show the gateway connection status
    #[arg(long)]
    status: bool,

    /// Ask the gateway to reconnect to the PLC
    #[arg(long)]
    reconnect: bool,

    /// Ask the gateway to re-sample every variable
    #[arg(long)]
    refresh: bool,

    /// Show the Influx health report
    #[arg(long)]
    influx_health: bool,

    /// Print the performance summary before exiting
    #[arg(long)]
    perf: bool,

    /// Enable verbose logging (debug level)
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Disable all logging
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,
}

fn parse_assignment(raw: &str) -> Result<(String, Value)> {
    let (name, value) = raw
        .split_once('=')
        .with_context(|| format!("Expected NAME=VALUE, got '{}'", raw))?;
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((name.trim().to_string(), value))
}

fn print_batch(response: &BatchReadResponse) {
    println!(
        "success={} timestamp={}",
        response.success,
        response.timestamp.as_deref().unwrap_or("-")
    );
    let mut names: Vec<&String> = response.variables.keys().collect();
    names.sort();
    for name in names {
        let value = &response.variables[name];
        println!("  {:<45} {:<12} {:?}", name, value.value, value.quality);
    }
    for error in response.errors.iter().flatten() {
        println!("  error: {}", error);
    }
}

async fn read_selected(client: &OpcClient, args: &Args) -> Result<()> {
    if let Some(page) = args.page {
        print_batch(&client.read_page(page).await?);
    }
    if args.all {
        print_batch(&client.sync_all().await);
    }
    if args.leakage {
        print_batch(&client.read_leakage().await?);
    }
    Ok(())
}

async fn watch(client: &OpcClient, args: &Args, interval: Duration) -> Result<()> {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = read_selected(client, args).await {
                    warn!("Read failed: {}", e);
                }
            }
            _ = signal::ctrl_c() => {
                info!("Received shutdown signal, stopping watch");
                return Ok(());
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.quiet {
        log::LevelFilter::Off
    } else if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if args.show_config_schema {
        return config::output_config_schema();
    }

    if args.build_info {
        build_info::print_build_info();
        return Ok(());
    }

    if let Some(validate_path) = &args.validate_config {
        if !validate_path.exists() {
            anyhow::bail!(
                "Configuration file does not exist: {}",
                validate_path.display()
            );
        }
        Config::from_file(validate_path)
            .map_err(|err| anyhow::anyhow!("Configuration validation failed: {}", err))?;
        println!("Configuration file is valid: {}", validate_path.display());
        return Ok(());
    }

    if args.list_pages {
        for (page, names) in variable_request_map()? {
            println!("{} ({} variables)", page, names.len());
            for name in names {
                println!("  {}", name);
            }
        }
        return Ok(());
    }

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from("hgu.yaml"));
    let mut config = Config::from_file(&config_path)?;
    config.apply_args(
        args.opc_url.clone(),
        args.influx_url.clone(),
        args.timeout_ms,
        args.cache_ttl_ms,
        args.token_file.clone(),
    );
    config::validate_specific_rules(&config)?;

    let auth = Arc::new(AuthSession::from_config(&config.auth));
    if args.logout {
        auth.logout();
        println!("Logged out");
        return Ok(());
    }
    if let Some(token) = &args.token {
        auth.set_token(token.as_str(), None)?;
    }

    let mut auth_events = auth.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = auth_events.recv().await {
            if event == AuthEvent::AuthRequired {
                warn!("Gateway requires a new login; rerun with --token");
            }
        }
    });

    let client = OpcClientBuilder::from_config(&config)
        .auth(auth.clone())
        .build()?;

    if args.status {
        let status = client.check_connection().await?;
        println!("{}", serde_json::to_string_pretty(&status)?);
    }

    if args.reconnect {
        let outcome = client.reconnect().await?;
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    }

    if args.refresh {
        let outcome = client.refresh_now().await?;
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    }

    for raw in &args.write {
        let (name, value) = parse_assignment(raw)?;
        let outcome = match args.motor {
            Some(motor) => {
                let motor = MotorIndex::new(motor)?;
                client.write_motor_variable(&name, motor, value).await?
            }
            None => client.write_one(&name, value, None).await?,
        };
        println!(
            "{}: {}",
            name,
            if outcome.success { "ok" } else { "rejected" }
        );
    }

    if args.influx_health {
        let influx =
            InfluxClient::from_config(&config, auth.clone(), client.performance().clone())?;
        let health = influx.health().await?;
        println!("{}", serde_json::to_string_pretty(&health)?);
    }

    if args.watch {
        watch(
            &client,
            &args,
            Duration::from_millis(config.polling.interval_ms),
        )
        .await?;
    } else {
        read_selected(&client, &args).await?;
    }

    if args.perf {
        let summary = client.performance_summary();
        println!(
            "calls={} avg={}ms success={}%",
            summary.total_calls, summary.average_execution_ms, summary.success_rate
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment() {
        let (name, value) = parse_assignment("MOTOR_1_MOTOR_TARGET_RPM_EXECUTION=1450.5").unwrap();
        assert_eq!(name, "MOTOR_1_MOTOR_TARGET_RPM_EXECUTION");
        assert_eq!(value, serde_json::json!(1450.5));

        let (_, value) = parse_assignment("enableCommand=true").unwrap();
        assert_eq!(value, Value::Bool(true));

        let (_, value) = parse_assignment("NAME=auto").unwrap();
        assert_eq!(value, Value::String("auto".to_string()));

        assert!(parse_assignment("missing").is_err());
    }
}
