// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the hgu-opc-client project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! JSON-over-HTTP plumbing shared by the OPC and Influx clients
//!
//! Every request carries `Authorization: Bearer <token>` when the
//! [`AuthSession`] has a token and nothing otherwise. A 401 is routed through
//! [`AuthSession::handle_unauthorized`] before surfacing as
//! [`ClientError::AuthRequired`]; other non-2xx statuses become
//! [`ClientError::Http`] with the response body.

use log::{debug, error};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use super::auth::AuthSession;
use super::error::ClientError;
use crate::build_info::BuildInfo;

/// Default request timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Clone)]
pub(crate) struct Transport {
    http: reqwest::Client,
    base_url: String,
    auth: Arc<AuthSession>,
}

impl Transport {
    pub(crate) fn new(
        base_url: &str,
        timeout: Duration,
        auth: Arc<AuthSession>,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(BuildInfo::get().user_agent())
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
        })
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn auth(&self) -> &Arc<AuthSession> {
        &self.auth
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let builder = self.http.request(method, url);
        match self.auth.current_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        path: &str,
        builder: RequestBuilder,
        accept: &[StatusCode],
    ) -> Result<T, ClientError> {
        let response = builder.send().await.map_err(|e| {
            error!("Request to {} failed: {}", path, e);
            ClientError::Transport(e)
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            self.auth.handle_unauthorized();
            return Err(ClientError::AuthRequired);
        }
        if !status.is_success() && !accept.contains(&status) {
            let body = response.text().await.unwrap_or_default();
            error!("{} answered HTTP {}: {}", path, status, body);
            return Err(ClientError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        debug!("{} answered HTTP {} ({} bytes)", path, status, bytes.len());
        serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode {
            endpoint: path.to_string(),
            reason: e.to_string(),
        })
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.execute(path, self.request(Method::GET, path), &[]).await
    }

    /// GET that also decodes the body of the listed error statuses
    pub(crate) async fn get_json_accepting<T: DeserializeOwned>(
        &self,
        path: &str,
        accept: &[StatusCode],
    ) -> Result<T, ClientError> {
        self.execute(path, self.request(Method::GET, path), accept)
            .await
    }

    pub(crate) async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(Method::POST, path).json(body);
        self.execute(path, builder, &[]).await
    }

    pub(crate) async fn post_empty<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, ClientError> {
        self.execute(path, self.request(Method::POST, path), &[])
            .await
    }
}
