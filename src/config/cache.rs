// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the hgu-opc-client project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Response cache configuration

use serde::{Deserialize, Serialize};

use crate::client::influx::DEFAULT_INFLUX_TTL_MS;
use crate::client::opc::DEFAULT_CACHE_TTL_MS;

/// TTLs of the read caches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Lifetime of a cached OPC batch response, in milliseconds.
    pub ttl_ms: u64,

    /// Lifetime of cached Influx stats and series, in milliseconds.
    pub influx_ttl_ms: u64,

    /// Discard responses overtaken by a newer request or a cache clear.
    ///
    /// When disabled the last response to complete is stored, even if it
    /// was issued before a write.
    pub generation_guard: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_ms: DEFAULT_CACHE_TTL_MS,
            influx_ttl_ms: DEFAULT_INFLUX_TTL_MS,
            generation_guard: true,
        }
    }
}
