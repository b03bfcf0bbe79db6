// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the hgu-opc-client project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Client for the `/api/influx` time-series endpoints
//!
//! Shares the [`AuthSession`] (and therefore the 401 policy) with the OPC
//! client but keeps its own TTL cache. Statistics and motor series are
//! cached; health checks and raw Flux queries always hit the network.

use log::{debug, info};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use super::auth::{AuthSession, AuthWatch};
use super::cache::ResponseCache;
use super::error::ClientError;
use super::transport::Transport;
use crate::config::Config;
use crate::opc::MotorIndex;
use crate::utility::{instrument, Clock, PerformanceTracker, SystemClock};

pub const DEFAULT_INFLUX_BASE_URL: &str = "http://localhost:5000/api/influx";
pub const DEFAULT_INFLUX_TTL_MS: u64 = 5000;

/// Response of `GET /health`, also decoded from a 503 body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfluxHealth {
    #[serde(alias = "IsHealthy")]
    pub is_healthy: bool,
    #[serde(default, alias = "IsConnected")]
    pub is_connected: Option<bool>,
    #[serde(default, alias = "HasRecentData")]
    pub has_recent_data: Option<bool>,
    #[serde(default, alias = "Status")]
    pub status: Option<String>,
    #[serde(default, alias = "Message")]
    pub message: Option<String>,
    #[serde(default, alias = "Error")]
    pub error: Option<String>,
    #[serde(default, alias = "LastCheck")]
    pub last_check: Option<String>,
}

/// Body of `POST /motor-series`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MotorSeriesQuery {
    pub motors: Vec<u8>,
    pub metrics: Vec<String>,
    /// Flux duration literal, e.g. `30m`
    pub range: String,
    pub max_points: u32,
}

impl MotorSeriesQuery {
    /// Current, speed and temperature of one motor, 180 points
    pub fn new(motor: MotorIndex, range: impl Into<String>) -> Self {
        Self {
            motors: vec![motor.get()],
            metrics: ["current", "rpm", "temperature"]
                .into_iter()
                .map(String::from)
                .collect(),
            range: range.into(),
            max_points: 180,
        }
    }

    pub fn with_metrics<I, S>(mut self, metrics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metrics = metrics.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_max_points(mut self, max_points: u32) -> Self {
        self.max_points = max_points;
        self
    }

    fn cache_key(&self) -> String {
        let motors: Vec<String> = self.motors.iter().map(u8::to_string).collect();
        format!(
            "motor_series_{}_{}_{}_{}",
            motors.join("-"),
            self.metrics.join("-"),
            self.range,
            self.max_points
        )
    }
}

/// One timestamped sample of a motor series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    #[serde(default, alias = "Timestamp")]
    pub timestamp: Option<String>,
    #[serde(flatten)]
    pub metrics: BTreeMap<String, Value>,
}

impl SeriesPoint {
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).and_then(Value::as_f64)
    }
}

/// Response of `POST /motor-series`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotorSeries {
    #[serde(default, alias = "MotorSeries")]
    pub motor_series: Vec<SeriesPoint>,
}

/// Response of `POST /query`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FluxQueryResult {
    #[serde(default, alias = "Success")]
    pub success: bool,
    #[serde(default, alias = "Query")]
    pub query: Option<String>,
    /// Annotated CSV as returned by InfluxDB
    #[serde(default, alias = "Result")]
    pub result: Option<String>,
    #[serde(default, alias = "Timestamp")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Serialize)]
struct FluxQueryRequest<'a> {
    query: &'a str,
}

/// Client for the Influx endpoints of the gateway
#[derive(Debug, Clone)]
pub struct InfluxClient {
    transport: Transport,
    cache: Arc<ResponseCache<Value>>,
    tracker: Arc<PerformanceTracker>,
    auth_watch: AuthWatch,
}

impl InfluxClient {
    /// # Arguments
    ///
    /// * `base_url` - Root of the Influx endpoints
    /// * `timeout` - Per-request timeout
    /// * `ttl` - Cache TTL for stats and series
    /// * `auth` - Session shared with the OPC client
    pub fn new(
        base_url: &str,
        timeout: Duration,
        ttl: Duration,
        auth: Arc<AuthSession>,
    ) -> Result<Self, ClientError> {
        Self::with_parts(
            base_url,
            timeout,
            ttl,
            Arc::new(SystemClock),
            auth,
            Arc::default(),
        )
    }

    /// Fully injected constructor, with the generation guard enabled
    pub fn with_parts(
        base_url: &str,
        timeout: Duration,
        ttl: Duration,
        clock: Arc<dyn Clock>,
        auth: Arc<AuthSession>,
        tracker: Arc<PerformanceTracker>,
    ) -> Result<Self, ClientError> {
        let cache = ResponseCache::new(ttl, clock, true);
        Self::assemble(base_url, timeout, cache, auth, tracker)
    }

    /// Client for the configured Influx base URL, recording into `tracker`
    pub fn from_config(
        config: &Config,
        auth: Arc<AuthSession>,
        tracker: Arc<PerformanceTracker>,
    ) -> Result<Self, ClientError> {
        let cache = ResponseCache::new(
            Duration::from_millis(config.cache.influx_ttl_ms),
            Arc::new(SystemClock),
            config.cache.generation_guard,
        );
        Self::assemble(
            &config.backend.influx_base_url,
            Duration::from_millis(config.backend.request_timeout_ms),
            cache,
            auth,
            tracker,
        )
    }

    fn assemble(
        base_url: &str,
        timeout: Duration,
        cache: ResponseCache<Value>,
        auth: Arc<AuthSession>,
        tracker: Arc<PerformanceTracker>,
    ) -> Result<Self, ClientError> {
        let auth_watch = AuthWatch::new(&auth);
        let transport = Transport::new(base_url, timeout, auth)?;
        debug!("Influx client targeting {}", transport.base_url());
        Ok(Self {
            transport,
            cache: Arc::new(cache),
            tracker,
            auth_watch,
        })
    }

    pub fn generation_guard(&self) -> bool {
        self.cache.generation_guard()
    }

    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    fn sync_auth_version(&self) {
        if self.auth_watch.changed(self.transport.auth()) {
            debug!("Auth session changed, clearing Influx cache");
            self.cache.clear();
        }
    }

    async fn cached<T, F>(&self, key: &str, fetch: F) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        F: std::future::Future<Output = Result<Value, ClientError>>,
    {
        self.sync_auth_version();
        let raw = match self.cache.get(key) {
            Some(raw) => raw,
            None => {
                let ticket = self.cache.begin_fetch(key);
                let result = fetch.await;
                self.sync_auth_version();
                let raw = match result {
                    Ok(raw) => raw,
                    Err(e) => {
                        self.cache.abandon_fetch(ticket);
                        return Err(e);
                    }
                };
                self.cache.complete_fetch(ticket, raw.clone());
                raw
            }
        };
        serde_json::from_value(raw).map_err(|e| ClientError::Decode {
            endpoint: key.to_string(),
            reason: e.to_string(),
        })
    }

    /// Database health; a 503 still yields a decoded report
    pub async fn health(&self) -> Result<InfluxHealth, ClientError> {
        instrument(&self.tracker, "influx_health", async {
            let result = self
                .transport
                .get_json_accepting("health", &[StatusCode::SERVICE_UNAVAILABLE])
                .await;
            self.sync_auth_version();
            result
        })
        .await
    }

    /// Ingestion statistics, as returned by the gateway
    pub async fn stats(&self) -> Result<Value, ClientError> {
        instrument(
            &self.tracker,
            "influx_stats",
            self.cached("stats", self.transport.get_json("stats")),
        )
        .await
    }

    /// Historical samples of one or more motors
    pub async fn motor_series(&self, query: &MotorSeriesQuery) -> Result<MotorSeries, ClientError> {
        let key = query.cache_key();
        instrument(
            &self.tracker,
            "influx_motor_series",
            self.cached(&key, self.transport.post_json("motor-series", query)),
        )
        .await
    }

    /// Run a raw Flux query
    pub async fn query(&self, flux: &str) -> Result<FluxQueryResult, ClientError> {
        instrument(&self.tracker, "influx_query", async {
            info!("Running Flux query ({} chars)", flux.len());
            let result = self
                .transport
                .post_json("query", &FluxQueryRequest { query: flux })
                .await;
            self.sync_auth_version();
            result
        })
        .await
    }
}
