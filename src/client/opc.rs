// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the hgu-opc-client project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Batch read/write client for the OPC gateway
//!
//! [`OpcClient`] turns page identifiers into batch reads, caches the responses
//! for a short TTL and forwards writes. It is cheap to clone; clones share the
//! HTTP connection pool, the response cache, the auth session and the
//! performance tracker.
//!
//! ### Cache keys
//!
//! | Read              | Cache key        | `pageContext`  |
//! |-------------------|------------------|----------------|
//! | `read_page(p)`    | `page_<p>`       | `<p>`          |
//! | `read_all()`      | `all_variables`  | `all`          |
//! | `read_leakage()`  | `leakage_only`   | `leakage_only` |
//!
//! The whole cache is dropped after any write attempt, after `refresh_now`,
//! after a 401 and whenever the auth session's token changes.
//!
//! ### Example
//!
//! ```no_run
//! use hgu_opc_client::client::OpcClient;
//! use hgu_opc_client::opc::PageId;
//!
//! # async fn run() -> Result<(), hgu_opc_client::client::ClientError> {
//! let client = OpcClient::builder()
//!     .base_url("http://localhost:5000/api/Opc")
//!     .build()?;
//! let motors = client.read_page(PageId::Motors).await?;
//! println!("{} variables", motors.variables.len());
//! # Ok(())
//! # }
//! ```

use log::{debug, info, warn};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use super::auth::{AuthSession, AuthWatch};
use super::cache::ResponseCache;
use super::error::ClientError;
use super::transport::{Transport, DEFAULT_TIMEOUT_MS};
use super::wire::{
    BatchReadRequest, BatchReadResponse, BatchWriteOutcome, BatchWriteRequest, ConnectionStatus,
    ReconnectOutcome, RefreshOutcome, WriteOperation, WriteOutcome, WriteRequest,
};
use crate::config::Config;
use crate::opc::registry::find_motor_scoped;
use crate::opc::{
    generate_motor_variable_name, resolve_all_pages, resolve_motor_key, resolve_page,
    validate_page_plans, DataType, MotorIndex, PageId, PlanError,
};
use crate::utility::{instrument, Clock, PerformanceSummary, PerformanceTracker, SystemClock};

/// Default gateway base URL
pub const DEFAULT_OPC_BASE_URL: &str = "http://localhost:5000/api/Opc";

/// Default read cache TTL in milliseconds
pub const DEFAULT_CACHE_TTL_MS: u64 = 500;

const ALL_CONTEXT: &str = "all";
const LEAKAGE_CONTEXT: &str = "leakage_only";

/// What a batch read covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadScope {
    Page(PageId),
    All,
    Leakage,
}

impl ReadScope {
    pub fn cache_key(&self) -> String {
        match self {
            ReadScope::Page(page) => format!("page_{}", page.as_str()),
            ReadScope::All => "all_variables".to_string(),
            ReadScope::Leakage => "leakage_only".to_string(),
        }
    }

    /// Value sent as `pageContext`
    pub fn context(&self) -> &'static str {
        match self {
            ReadScope::Page(page) => page.as_str(),
            ReadScope::All => ALL_CONTEXT,
            ReadScope::Leakage => LEAKAGE_CONTEXT,
        }
    }

    /// Wire names requested by this scope
    pub fn variables(&self) -> Result<Vec<String>, PlanError> {
        match self {
            ReadScope::Page(page) => resolve_page(*page),
            ReadScope::All => resolve_all_pages(),
            ReadScope::Leakage => {
                let motors: Vec<MotorIndex> = MotorIndex::all().collect();
                resolve_motor_key("leak", &motors)
            }
        }
    }
}

/// Builder for [`OpcClient`]
#[derive(Debug)]
pub struct OpcClientBuilder {
    base_url: String,
    timeout: Duration,
    ttl: Duration,
    generation_guard: bool,
    clock: Arc<dyn Clock>,
    auth: Option<Arc<AuthSession>>,
    tracker: Option<Arc<PerformanceTracker>>,
}

impl Default for OpcClientBuilder {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OPC_BASE_URL.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            ttl: Duration::from_millis(DEFAULT_CACHE_TTL_MS),
            generation_guard: true,
            clock: Arc::new(SystemClock),
            auth: None,
            tracker: None,
        }
    }
}

impl OpcClientBuilder {
    /// Builder preloaded with the backend, cache and performance sections
    pub fn from_config(config: &Config) -> Self {
        Self::default()
            .base_url(&config.backend.opc_base_url)
            .timeout(Duration::from_millis(config.backend.request_timeout_ms))
            .cache_ttl(Duration::from_millis(config.cache.ttl_ms))
            .generation_guard(config.cache.generation_guard)
            .tracker(Arc::new(PerformanceTracker::new(config.performance.capacity)))
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn generation_guard(mut self, enabled: bool) -> Self {
        self.generation_guard = enabled;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn auth(mut self, auth: Arc<AuthSession>) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn tracker(mut self, tracker: Arc<PerformanceTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    /// Validate the page plans and build the client
    ///
    /// # Errors
    ///
    /// [`ClientError::Plan`] if any page references an unknown key, or
    /// [`ClientError::Transport`] if the HTTP client cannot be created.
    pub fn build(self) -> Result<OpcClient, ClientError> {
        validate_page_plans()?;

        let auth = self
            .auth
            .unwrap_or_else(|| Arc::new(AuthSession::in_memory()));
        let auth_watch = AuthWatch::new(&auth);
        let transport = Transport::new(&self.base_url, self.timeout, auth)?;

        info!(
            "OPC client targeting {} (timeout {:?}, cache TTL {:?})",
            transport.base_url(),
            self.timeout,
            self.ttl
        );

        Ok(OpcClient {
            transport,
            cache: Arc::new(ResponseCache::new(self.ttl, self.clock, self.generation_guard)),
            tracker: self.tracker.unwrap_or_default(),
            auth_watch,
        })
    }
}

/// Client for the `/api/Opc` gateway
#[derive(Debug, Clone)]
pub struct OpcClient {
    transport: Transport,
    cache: Arc<ResponseCache<BatchReadResponse>>,
    tracker: Arc<PerformanceTracker>,
    auth_watch: AuthWatch,
}

impl OpcClient {
    pub fn builder() -> OpcClientBuilder {
        OpcClientBuilder::default()
    }

    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    pub fn auth(&self) -> &Arc<AuthSession> {
        self.transport.auth()
    }

    pub fn performance(&self) -> &Arc<PerformanceTracker> {
        &self.tracker
    }

    pub fn performance_summary(&self) -> PerformanceSummary {
        self.tracker.summary()
    }

    /// Drop every cached response
    pub fn clear_cache(&self) {
        debug!("Clearing OPC read cache");
        self.cache.clear();
    }

    /// Number of cache entries currently held
    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    /// Clear the cache if the auth session changed since last seen
    fn sync_auth_version(&self) {
        if self.auth_watch.changed(self.transport.auth()) {
            debug!("Auth session changed, clearing cache");
            self.cache.clear();
        }
    }

    async fn read_scope(&self, scope: ReadScope) -> Result<BatchReadResponse, ClientError> {
        self.sync_auth_version();

        let key = scope.cache_key();
        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached);
        }

        let request = BatchReadRequest {
            variables: scope.variables()?,
            page_context: scope.context().to_string(),
        };
        debug!(
            "Batch read {} ({} variables)",
            key,
            request.variables.len()
        );

        let ticket = self.cache.begin_fetch(&key);
        let result: Result<BatchReadResponse, ClientError> =
            self.transport.post_json("batch", &request).await;
        // A token change or 401 during the request invalidates its result
        self.sync_auth_version();

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                self.cache.abandon_fetch(ticket);
                return Err(e);
            }
        };
        if !response.success {
            warn!(
                "Batch read {} reported failure: {:?}",
                key,
                response.errors.as_deref().unwrap_or_default()
            );
        }
        self.cache.complete_fetch(ticket, response.clone());
        Ok(response)
    }

    /// Read the variables of one page
    pub async fn read_page(&self, page: PageId) -> Result<BatchReadResponse, ClientError> {
        instrument(&self.tracker, "read_page", self.read_scope(ReadScope::Page(page))).await
    }

    /// Read the union of every page's variables
    pub async fn read_all(&self) -> Result<BatchReadResponse, ClientError> {
        instrument(&self.tracker, "read_all", self.read_scope(ReadScope::All)).await
    }

    /// [`read_all`](Self::read_all) folded into a result that never fails
    ///
    /// Errors, 401 included, come back as `success: false` with the message
    /// in `errors`. The 401 side effects still happen.
    pub async fn sync_all(&self) -> BatchReadResponse {
        match self.read_all().await {
            Ok(response) => response,
            Err(e) => BatchReadResponse::failure(vec![e.to_string()]),
        }
    }

    /// Read the leak sensor of every motor
    pub async fn read_leakage(&self) -> Result<BatchReadResponse, ClientError> {
        instrument(
            &self.tracker,
            "read_leakage",
            self.read_scope(ReadScope::Leakage),
        )
        .await
    }

    /// Clear the cache after a write attempt, whatever its outcome
    fn finish_write<T>(&self, result: Result<T, ClientError>) -> Result<T, ClientError> {
        self.clear_cache();
        self.sync_auth_version();
        result
    }

    /// Write a single variable
    ///
    /// # Arguments
    ///
    /// * `wire_name` - Exact OPC variable name
    /// * `value` - JSON value to write
    /// * `data_type` - Optional type hint forwarded to the gateway
    pub async fn write_one(
        &self,
        wire_name: &str,
        value: impl Into<Value>,
        data_type: Option<DataType>,
    ) -> Result<WriteOutcome, ClientError> {
        let request = WriteRequest {
            display_name: wire_name.to_string(),
            value: value.into(),
            data_type,
        };
        instrument(&self.tracker, "write_one", async {
            info!("Writing {} = {}", request.display_name, request.value);
            let result = self.transport.post_json("write", &request).await;
            let outcome: WriteOutcome = self.finish_write(result)?;
            if !outcome.success {
                warn!(
                    "Write of {} rejected: {}",
                    request.display_name,
                    outcome.message.as_deref().unwrap_or("no message")
                );
            }
            Ok::<_, ClientError>(outcome)
        })
        .await
    }

    /// Write a motor-scoped variable by logical key
    ///
    /// The key is looked up among motor variables and motor commands; the
    /// registry data type is sent along.
    pub async fn write_motor_variable(
        &self,
        key: &str,
        motor: MotorIndex,
        value: impl Into<Value>,
    ) -> Result<WriteOutcome, ClientError> {
        let def = find_motor_scoped(key).ok_or_else(|| PlanError::UnknownMotorKey {
            page: "write".to_string(),
            key: key.to_string(),
        })?;
        let wire_name = generate_motor_variable_name(def.wire_name_template, motor)?;
        self.write_one(&wire_name, value, Some(def.data_type)).await
    }

    /// Forward several writes in one request
    pub async fn write_batch(
        &self,
        operations: Vec<WriteOperation>,
    ) -> Result<BatchWriteOutcome, ClientError> {
        let request = BatchWriteRequest { operations };
        instrument(&self.tracker, "write_batch", async {
            info!("Batch write of {} operations", request.operations.len());
            let result = self.transport.post_json("batch-write", &request).await;
            let outcome: BatchWriteOutcome = self.finish_write(result)?;
            if !outcome.success {
                warn!("Batch write reported errors: {:?}", outcome.errors);
            }
            Ok::<_, ClientError>(outcome)
        })
        .await
    }

    /// Gateway connection state
    pub async fn check_connection(&self) -> Result<ConnectionStatus, ClientError> {
        instrument(&self.tracker, "check_connection", async {
            let result = self.transport.get_json("status").await;
            self.sync_auth_version();
            result
        })
        .await
    }

    /// Ask the gateway to reconnect to the PLC
    pub async fn reconnect(&self) -> Result<ReconnectOutcome, ClientError> {
        instrument(&self.tracker, "reconnect", async {
            let result = self.transport.post_empty("connect").await;
            self.sync_auth_version();
            let outcome: ReconnectOutcome = result?;
            info!(
                "Reconnect requested: connected={} ({})",
                outcome.is_connected,
                outcome.message.as_deref().unwrap_or("")
            );
            Ok::<_, ClientError>(outcome)
        })
        .await
    }

    /// Force the gateway to re-sample every variable
    ///
    /// The cache is dropped so the next read reaches the network.
    pub async fn refresh_now(&self) -> Result<RefreshOutcome, ClientError> {
        instrument(&self.tracker, "refresh_now", async {
            let result = self.transport.post_empty("refresh").await;
            self.clear_cache();
            self.sync_auth_version();
            let outcome: RefreshOutcome = result?;
            info!("Gateway refreshed {} values", outcome.values_count);
            Ok::<_, ClientError>(outcome)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_keys_and_contexts() {
        assert_eq!(ReadScope::Page(PageId::Motors).cache_key(), "page_motors");
        assert_eq!(ReadScope::Page(PageId::Motors).context(), "motors");
        assert_eq!(ReadScope::All.cache_key(), "all_variables");
        assert_eq!(ReadScope::All.context(), "all");
        assert_eq!(ReadScope::Leakage.cache_key(), "leakage_only");
        assert_eq!(ReadScope::Leakage.context(), "leakage_only");
    }

    #[test]
    fn test_leakage_scope_covers_every_motor() {
        let names = ReadScope::Leakage.variables().unwrap();
        assert_eq!(names.len(), 7);
        assert_eq!(names[0], "MOTOR_1_PUMP_LEAK_EXECUTION");
        assert_eq!(names[6], "MOTOR_7_PUMP_LEAK_EXECUTION");
    }

    #[test]
    fn test_builder_defaults() {
        let client = OpcClient::builder().build().unwrap();
        assert_eq!(client.base_url(), DEFAULT_OPC_BASE_URL);
        assert_eq!(client.performance().capacity(), 1000);
        assert_eq!(client.cached_entries(), 0);
    }
}
