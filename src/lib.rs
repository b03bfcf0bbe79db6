// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the hgu-opc-client project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! HGU OPC client library
//!
//! Client side of the hydraulic power unit gateway: derives OPC variable
//! names from logical signal keys, plans page-scoped batch reads, caches
//! their responses briefly and forwards writes, with bearer-token handling
//! and per-call performance tracking.

pub mod build_info;
pub mod client;
pub mod config;
pub mod opc;
pub mod utility;
