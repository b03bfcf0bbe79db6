// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the hgu-opc-client project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration utilities
//!
//! This module provides utility functions for working with configuration
//! settings, including validation and schema management.

use anyhow::{Context, Result};
use log::debug;
use url::Url;

use super::{Config, CONFIG_SCHEMA};

/// Output the embedded JSON schema to the console.
///
/// Called when the `--show-config-schema` flag is provided on the command
/// line.
///
/// # Example
///
/// ```bash
/// ./hgu-opc --show-config-schema > config_schema.json
/// ```
pub fn output_config_schema() -> Result<()> {
    let schema: serde_json::Value =
        serde_json::from_str(CONFIG_SCHEMA).context("Failed to parse JSON schema")?;

    let formatted_schema =
        serde_json::to_string_pretty(&schema).context("Failed to format JSON schema")?;

    println!("{}", formatted_schema);

    Ok(())
}

fn check_http_url(field: &str, value: &str) -> Result<()> {
    let url = Url::parse(value)
        .with_context(|| format!("{} is not a valid URL: {}", field, value))?;
    if !matches!(url.scheme(), "http" | "https") {
        anyhow::bail!("{} must use http or https: {}", field, value);
    }
    Ok(())
}

/// Validates the configuration against rules the JSON schema cannot express.
///
/// # Validation Rules
///
/// - **Gateway URLs**: both base URLs parse and use `http` or `https`
/// - **Timeout**: `request_timeout_ms` is within 100-60000
/// - **TTLs**: cache TTLs are strictly positive
/// - **Ring buffer**: performance capacity is strictly positive
/// - **Polling**: the watch interval is strictly positive
/// - **Storage keys**: token, legacy token and user keys are non-empty and distinct
pub fn validate_specific_rules(config: &Config) -> Result<()> {
    debug!("Performing additional validation checks");

    check_http_url("backend.opc_base_url", &config.backend.opc_base_url)?;
    check_http_url("backend.influx_base_url", &config.backend.influx_base_url)?;

    let timeout = config.backend.request_timeout_ms;
    if !(100..=60_000).contains(&timeout) {
        anyhow::bail!("Invalid request timeout: {}ms (expected 100-60000)", timeout);
    }

    if config.cache.ttl_ms == 0 {
        anyhow::bail!("cache.ttl_ms must be greater than 0");
    }
    if config.cache.influx_ttl_ms == 0 {
        anyhow::bail!("cache.influx_ttl_ms must be greater than 0");
    }

    if config.performance.capacity == 0 {
        anyhow::bail!("performance.capacity must be greater than 0");
    }

    if config.polling.interval_ms == 0 {
        anyhow::bail!("polling.interval_ms must be greater than 0");
    }

    let keys = [
        &config.auth.token_key,
        &config.auth.legacy_token_key,
        &config.auth.user_key,
    ];
    if keys.iter().any(|k| k.is_empty()) {
        anyhow::bail!("auth storage keys must not be empty");
    }
    if keys[0] == keys[1] || keys[0] == keys[2] || keys[1] == keys[2] {
        anyhow::bail!("auth storage keys must be distinct");
    }

    Ok(())
}
