// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the hgu-opc-client project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Credential storage configuration
//!
//! The bearer token obtained at login is persisted in a small JSON file so
//! that it survives restarts. The storage keys are configurable to stay
//! compatible with files written by older front ends.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where and under which keys the token is stored
///
/// # Example
///
/// ```
/// use hgu_opc_client::config::AuthConfig;
///
/// let auth = AuthConfig::default();
/// assert_eq!(auth.token_key, "auth_token");
/// assert_eq!(auth.legacy_token_key, "token");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// JSON file holding the persisted credentials.
    pub token_file: PathBuf,

    /// Key of the current token.
    pub token_key: String,

    /// Fallback key read when `token_key` is absent.
    pub legacy_token_key: String,

    /// Key of the cached user profile, cleared with the token.
    pub user_key: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_file: PathBuf::from("hgu_auth.json"),
            token_key: "auth_token".to_string(),
            legacy_token_key: "token".to_string(),
            user_key: "auth_user".to_string(),
        }
    }
}
