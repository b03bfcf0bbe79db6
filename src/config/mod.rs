// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the hgu-opc-client project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration management for the HGU OPC client
//!
//! The configuration is backed by a YAML file and validated against an
//! embedded JSON schema before it is deserialized.
//!
//! ## Configuration Structure
//!
//! - `backend`: gateway URLs and request timeout
//! - `cache`: TTLs of the OPC and Influx read caches
//! - `auth`: token file location and storage keys
//! - `performance`: capacity of the performance ring buffer
//! - `polling`: interval of the CLI watch mode
//!
//! ## Usage
//!
//! ```no_run
//! use hgu_opc_client::config::Config;
//! use std::path::Path;
//!
//! // Load config from file, creates a default if not found
//! let mut config = Config::from_file(Path::new("hgu.yaml")).unwrap();
//!
//! // Apply command line overrides if needed
//! config.apply_args(
//!     Some("http://10.0.0.5:5000/api/Opc".to_string()), // OPC base URL
//!     None,                                             // Influx base URL
//!     Some(2000),                                       // Timeout (ms)
//!     None,                                             // Cache TTL (ms)
//!     None,                                             // Token file
//! );
//!
//! println!("Gateway: {}", config.backend.opc_base_url);
//! ```

pub mod auth;
pub mod backend;
pub mod cache;
pub mod performance;
pub mod utils;

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, error};
use serde::{Deserialize, Serialize};

pub use auth::AuthConfig;
pub use backend::BackendConfig;
pub use cache::CacheConfig;
pub use performance::{PerformanceConfig, PollingConfig};
pub use utils::{output_config_schema, validate_specific_rules};

/// Embedded JSON schema of the configuration file
pub(crate) const CONFIG_SCHEMA: &str = include_str!("../../resources/config.schema.json");

/// Root configuration structure.
///
/// Every section falls back to its defaults when absent from the file, so an
/// empty YAML document is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Gateway endpoints and request timeout.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Read cache TTLs and stale-response guard.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Token persistence.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Performance ring buffer.
    #[serde(default)]
    pub performance: PerformanceConfig,

    /// CLI watch mode.
    #[serde(default)]
    pub polling: PollingConfig,
}

impl Config {
    /// Write `<name>.sample.yaml` next to a rejected configuration file
    fn create_sample_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        let sample_path = path.with_extension("sample.yaml");
        debug!("Original path: {:?}, Sample path: {:?}", path, sample_path);

        if let Some(parent) = sample_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                debug!("Creating parent directory: {:?}", parent);
                fs::create_dir_all(parent).with_context(|| {
                    format!(
                        "Failed to create parent directory for sample config at {:?}",
                        parent
                    )
                })?;
            }
        }

        Self::default()
            .save_to_file(&sample_path)
            .with_context(|| format!("Failed to save sample config to {:?}", sample_path))?;

        error!(
            "Sample configuration file created at {:?}\nPlease edit and rename it",
            sample_path
        );
        Ok(())
    }

    /// Load configuration from a file
    ///
    /// A missing file is created with default values. A file that fails schema
    /// validation, deserialization or [`validate_specific_rules`] produces a
    /// sample file next to it and an error.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(
                "Configuration file not found at {:?}, creating default",
                path
            );
            let default_config = Self::default();
            default_config.save_to_file(path)?;
            return Ok(default_config);
        }

        debug!("Loading configuration from {:?}", path);
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file at {:?}", path))?;

        let yaml_value: serde_yml::Value = serde_yml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML configuration from {:?}", path))?;
        // An empty document parses as null; treat it as an empty mapping
        let json_value = match serde_json::to_value(&yaml_value).with_context(|| {
            format!("Failed to convert YAML to JSON for validation: {:?}", path)
        })? {
            serde_json::Value::Null => serde_json::Value::Object(Default::default()),
            other => other,
        };

        let schema: serde_json::Value =
            serde_json::from_str(CONFIG_SCHEMA).context("Failed to parse JSON schema")?;
        let validator = jsonschema::draft202012::options()
            .should_validate_formats(true)
            .build(&schema)?;

        debug!("Validating {} configuration against schema", path.display());
        if let Err(error) = validator.validate(&json_value) {
            error!("Configuration validation error before deserialization");
            Self::create_sample_config(path)?;
            anyhow::bail!("Configuration validation failed: {}", error);
        }

        let config: Config = match serde_json::from_value(json_value) {
            Ok(config) => config,
            Err(err) => {
                error!("Configuration deserialization error: {}", err);
                if let Err(e) = Self::create_sample_config(path) {
                    error!("Failed to create sample config: {}", e);
                }
                return Err(anyhow::anyhow!(
                    "Failed to deserialize configuration from {}: {}",
                    path.display(),
                    err
                ));
            }
        };

        if let Err(err) = validate_specific_rules(&config) {
            error!("Configuration specific validation error: {}", err);
            Self::create_sample_config(path)?;
            return Err(err);
        }

        Ok(config)
    }

    /// Save the configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml =
            serde_yml::to_string(self).context("Failed to serialize configuration to YAML")?;

        let mut file = File::create(path.as_ref())
            .with_context(|| format!("Failed to create config file at {:?}", path.as_ref()))?;

        file.write_all(yaml.as_bytes())
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Apply command line overrides
    ///
    /// Only the arguments that are `Some` replace the loaded values.
    ///
    /// # Parameters
    ///
    /// * `opc_base_url` - Root URL of the OPC endpoints
    /// * `influx_base_url` - Root URL of the Influx endpoints
    /// * `timeout_ms` - Request timeout in milliseconds
    /// * `cache_ttl_ms` - OPC cache TTL in milliseconds
    /// * `token_file` - Credential file location
    pub fn apply_args(
        &mut self,
        opc_base_url: Option<String>,
        influx_base_url: Option<String>,
        timeout_ms: Option<u64>,
        cache_ttl_ms: Option<u64>,
        token_file: Option<PathBuf>,
    ) {
        if let Some(url) = opc_base_url {
            debug!("Overriding OPC base URL from command line: {}", url);
            self.backend.opc_base_url = url;
        }
        if let Some(url) = influx_base_url {
            debug!("Overriding Influx base URL from command line: {}", url);
            self.backend.influx_base_url = url;
        }
        if let Some(timeout) = timeout_ms {
            debug!("Overriding request timeout from command line: {}ms", timeout);
            self.backend.request_timeout_ms = timeout;
        }
        if let Some(ttl) = cache_ttl_ms {
            debug!("Overriding cache TTL from command line: {}ms", ttl);
            self.cache.ttl_ms = ttl;
        }
        if let Some(file) = token_file {
            debug!("Overriding token file from command line: {:?}", file);
            self.auth.token_file = file;
        }
    }
}
