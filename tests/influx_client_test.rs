// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the hgu-opc-client project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use hgu_opc_client::client::{AuthSession, InfluxClient, MotorSeriesQuery, OpcClient};
use hgu_opc_client::opc::{MotorIndex, PageId};
use hgu_opc_client::utility::{ManualClock, PerformanceTracker};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    server: MockServer,
    clock: Arc<ManualClock>,
    auth: Arc<AuthSession>,
    influx: InfluxClient,
}

async fn harness() -> Harness {
    let server = MockServer::start().await;
    let clock = Arc::new(ManualClock::new());
    let auth = Arc::new(AuthSession::in_memory());
    let influx = InfluxClient::with_parts(
        &format!("{}/api/influx", server.uri()),
        Duration::from_secs(5),
        Duration::from_secs(5),
        clock.clone(),
        auth.clone(),
        Arc::new(PerformanceTracker::new(100)),
    )
    .unwrap();
    Harness {
        server,
        clock,
        auth,
        influx,
    }
}

#[tokio::test]
async fn test_health_decodes_unavailable_body() {
    let h = harness().await;
    Mock::given(method("GET"))
        .and(path("/api/influx/health"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "IsHealthy": false,
            "Status": "Unhealthy",
            "Error": "connection refused",
            "LastCheck": "2025-06-01T10:00:00"
        })))
        .mount(&h.server)
        .await;

    let health = h.influx.health().await.unwrap();
    assert!(!health.is_healthy);
    assert_eq!(health.status.as_deref(), Some("Unhealthy"));
}

#[tokio::test]
async fn test_stats_are_cached_for_ttl() {
    let h = harness().await;
    Mock::given(method("GET"))
        .and(path("/api/influx/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "DataPoints": {"Last24Hours": 86400, "EstimatedPerHour": 3600},
            "CollectionStatus": {"IsActive": true, "Status": "Active"}
        })))
        .expect(2)
        .mount(&h.server)
        .await;

    let first = h.influx.stats().await.unwrap();
    h.clock.advance(Duration::from_millis(4999));
    let second = h.influx.stats().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first["DataPoints"]["Last24Hours"], 86400);

    h.clock.advance(Duration::from_millis(1));
    h.influx.stats().await.unwrap();
}

#[tokio::test]
async fn test_motor_series_request_and_cache_key() {
    let h = harness().await;
    Mock::given(method("POST"))
        .and(path("/api/influx/motor-series"))
        .and(body_json(json!({
            "motors": [2],
            "metrics": ["current", "rpm", "temperature"],
            "range": "30m",
            "maxPoints": 180
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "motorSeries": [
                {
                    "timestamp": "2025-06-01T10:00:00Z",
                    "current": 121.0,
                    "rpm": 1475.0,
                    "temperature": 48.5
                },
                {
                    "timestamp": "2025-06-01T10:00:10Z",
                    "current": 122.5,
                    "rpm": 1480.0,
                    "temperature": 48.7
                }
            ]
        })))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/influx/motor-series"))
        .and(body_json(json!({
            "motors": [2],
            "metrics": ["current", "rpm", "temperature"],
            "range": "1h",
            "maxPoints": 180
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"motorSeries": []})))
        .expect(1)
        .mount(&h.server)
        .await;

    let motor = MotorIndex::new(2).unwrap();
    let recent = MotorSeriesQuery::new(motor, "30m");
    let series = h.influx.motor_series(&recent).await.unwrap();
    assert_eq!(series.motor_series.len(), 2);
    assert_eq!(series.motor_series[1].metric("rpm"), Some(1480.0));

    // Same query is served from cache, another range is not
    h.influx.motor_series(&recent).await.unwrap();
    let hour = h
        .influx
        .motor_series(&MotorSeriesQuery::new(motor, "1h"))
        .await
        .unwrap();
    assert!(hour.motor_series.is_empty());
}

#[tokio::test]
async fn test_query_is_forwarded_uncached() {
    let h = harness().await;
    let flux = r#"from(bucket: "hgu") |> range(start: -5m)"#;
    Mock::given(method("POST"))
        .and(path("/api/influx/query"))
        .and(body_json(json!({"query": flux})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Query": flux,
            "Result": ",result,table,_time,_value\n,_result,0,2025-06-01T10:00:00Z,121.5\n",
            "Success": true
        })))
        .expect(2)
        .mount(&h.server)
        .await;

    let first = h.influx.query(flux).await.unwrap();
    assert!(first.success);
    assert!(first.result.unwrap().contains("121.5"));
    h.influx.query(flux).await.unwrap();
}

#[tokio::test]
async fn test_influx_401_invalidates_opc_cache() {
    let h = harness().await;
    h.auth.set_token("shared", None).unwrap();

    Mock::given(method("POST"))
        .and(path("/api/Opc/batch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "variables": {}
        })))
        .expect(2)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/influx/stats"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&h.server)
        .await;

    let opc = OpcClient::builder()
        .base_url(format!("{}/api/Opc", h.server.uri()))
        .clock(h.clock.clone())
        .auth(h.auth.clone())
        .build()
        .unwrap();

    opc.read_page(PageId::Main).await.unwrap();
    let err = h.influx.stats().await.unwrap_err();
    assert!(err.is_auth_required());
    assert!(!h.auth.is_authenticated());

    // The OPC cache notices the session change on its next read
    opc.read_page(PageId::Main).await.unwrap();
}
