// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the hgu-opc-client project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Gateway endpoint configuration
//!
//! This module defines where the OPC and Influx endpoints live and how long a
//! request may take before it is treated as a transport failure.

use serde::{Deserialize, Serialize};

use crate::client::influx::DEFAULT_INFLUX_BASE_URL;
use crate::client::opc::DEFAULT_OPC_BASE_URL;
use crate::client::transport::DEFAULT_TIMEOUT_MS;

/// Configuration for the gateway endpoints.
///
/// # Fields
///
/// * `opc_base_url` - Root of the OPC endpoints (default: `http://localhost:5000/api/Opc`)
/// * `influx_base_url` - Root of the Influx endpoints (default: `http://localhost:5000/api/influx`)
/// * `request_timeout_ms` - Per-request timeout in milliseconds (default: 5000)
///
/// # Example
///
/// ```
/// use hgu_opc_client::config::BackendConfig;
///
/// let backend = BackendConfig {
///     opc_base_url: "http://plc-gateway:5000/api/Opc".to_string(),
///     ..Default::default()
/// };
/// assert_eq!(backend.request_timeout_ms, 5000);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Root URL of the OPC gateway endpoints (`/batch`, `/write`, ...).
    pub opc_base_url: String,

    /// Root URL of the Influx endpoints (`/health`, `/stats`, ...).
    pub influx_base_url: String,

    /// Requests still pending after this many milliseconds fail.
    ///
    /// Valid range is 100-60000.
    pub request_timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            opc_base_url: DEFAULT_OPC_BASE_URL.to_string(),
            influx_base_url: DEFAULT_INFLUX_BASE_URL.to_string(),
            request_timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}
