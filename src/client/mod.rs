// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the hgu-opc-client project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! HTTP clients for the HGU gateway
//!
//! - [`OpcClient`]: page-scoped batch reads, writes and connection helpers
//! - [`InfluxClient`]: time-series health, statistics and queries
//!
//! Both share an [`AuthSession`]; a 401 from either one clears the token,
//! both caches and notifies [`AuthSession::subscribe`] listeners.

pub mod auth;
pub mod cache;
pub mod error;
pub mod influx;
pub mod opc;
pub(crate) mod transport;
pub mod wire;

pub use auth::{AuthEvent, AuthKeys, AuthSession, FileTokenStore, MemoryTokenStore, TokenStore};
pub use cache::{FetchTicket, ResponseCache};
pub use error::ClientError;
pub use influx::{InfluxClient, InfluxHealth, MotorSeries, MotorSeriesQuery};
pub use opc::{OpcClient, OpcClientBuilder, ReadScope};
pub use transport::DEFAULT_TIMEOUT_MS;
pub use wire::{
    BatchReadResponse, BatchWriteOutcome, ConnectionStatus, Quality, ReconnectOutcome,
    RefreshOutcome, VariableValue, WriteOperation, WriteOutcome,
};
