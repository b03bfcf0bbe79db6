// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the hgu-opc-client project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Errors returned by the gateway clients

use thiserror::Error;

use crate::opc::{NamingError, PlanError};

/// Failure of a gateway operation
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP 401: token and cache were cleared and `AuthEvent::AuthRequired` emitted
    #[error("Authentication required")]
    AuthRequired,

    /// Non-2xx response other than 401
    #[error("HTTP error {status}: {body}")]
    Http { status: u16, body: String },

    /// Network failure or request timeout
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body did not match the expected schema
    #[error("Invalid response from {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },

    /// 2xx response carrying `success: false`
    #[error("Backend reported failure: {0}")]
    Backend(String),

    /// Unresolvable logical key or page plan
    #[error("Configuration error: {0}")]
    Plan(#[from] PlanError),

    /// Durable token storage could not be read or written
    #[error("Token store error: {0}")]
    TokenStore(String),
}

impl From<NamingError> for ClientError {
    fn from(err: NamingError) -> Self {
        ClientError::Plan(PlanError::Naming(err))
    }
}

impl ClientError {
    /// Whether this error is the 401 special case
    pub fn is_auth_required(&self) -> bool {
        matches!(self, ClientError::AuthRequired)
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::AuthRequired => Some(401),
            ClientError::Http { status, .. } => Some(*status),
            ClientError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
