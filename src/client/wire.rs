// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the hgu-opc-client project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! JSON wire schema of the OPC gateway
//!
//! The gateway does not serialize field names consistently: depending on the
//! endpoint a field arrives as `isConnected` or `IsConnected`. Every response
//! type here accepts both spellings through serde aliases, so the casing is
//! normalized once at deserialization and the rest of the crate sees a
//! single schema.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::opc::DataType;

/// Body of `POST /batch`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReadRequest {
    pub variables: Vec<String>,
    /// Page identifier, `all` or `leakage_only`
    pub page_context: String,
}

/// Backend confidence tag of a sampled value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Quality {
    #[serde(alias = "good", alias = "GOOD")]
    Good,
    #[serde(alias = "bad", alias = "BAD")]
    Bad,
    #[serde(alias = "uncertain", alias = "UNCERTAIN")]
    Uncertain,
    #[default]
    #[serde(other)]
    Unknown,
}

/// One sampled variable in a batch response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableValue {
    #[serde(default, alias = "Value")]
    pub value: Value,
    #[serde(default, alias = "Quality")]
    pub quality: Quality,
    #[serde(default, alias = "Timestamp")]
    pub timestamp: Option<String>,
    #[serde(default, alias = "DataType", skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
}

impl VariableValue {
    pub fn is_good(&self) -> bool {
        self.quality == Quality::Good
    }

    /// Numeric view of the value; booleans map to 0/1
    pub fn as_f64(&self) -> Option<f64> {
        match &self.value {
            Value::Number(n) => n.as_f64(),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

/// Response of `POST /batch`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReadResponse {
    #[serde(alias = "Success")]
    pub success: bool,
    #[serde(default, alias = "Timestamp")]
    pub timestamp: Option<String>,
    #[serde(default, alias = "Variables")]
    pub variables: HashMap<String, VariableValue>,
    #[serde(default, alias = "Errors", skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    #[serde(default, alias = "PageContext", skip_serializing_if = "Option::is_none")]
    pub page_context: Option<String>,
}

impl BatchReadResponse {
    /// Failed result carrying the given error messages
    pub fn failure(errors: Vec<String>) -> Self {
        Self {
            success: false,
            timestamp: Some(chrono::Utc::now().to_rfc3339()),
            variables: HashMap::new(),
            errors: Some(errors),
            page_context: None,
        }
    }

    pub fn get(&self, wire_name: &str) -> Option<&VariableValue> {
        self.variables.get(wire_name)
    }

    /// Numeric value of a variable, ignoring bad-quality samples
    pub fn good_f64(&self, wire_name: &str) -> Option<f64> {
        self.get(wire_name)
            .filter(|v| v.is_good())
            .and_then(VariableValue::as_f64)
    }
}

/// Body of `POST /write`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct WriteRequest {
    pub display_name: String,
    pub value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_type: Option<DataType>,
}

/// One entry of `POST /batch-write`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteOperation {
    pub variable_name: String,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<DataType>,
}

impl WriteOperation {
    pub fn new(variable_name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            variable_name: variable_name.into(),
            value: value.into(),
            data_type: None,
        }
    }

    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = Some(data_type);
        self
    }
}

/// Body of `POST /batch-write`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchWriteRequest {
    pub operations: Vec<WriteOperation>,
}

/// Result of a single write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteOutcome {
    #[serde(alias = "Success")]
    pub success: bool,
    #[serde(default, alias = "Message")]
    pub message: Option<String>,
}

/// Aggregate result of a batch write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchWriteOutcome {
    #[serde(alias = "Success")]
    pub success: bool,
    #[serde(default, alias = "Errors")]
    pub errors: Vec<String>,
}

/// Response of `GET /status`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatus {
    #[serde(alias = "IsConnected", alias = "connected")]
    pub is_connected: bool,
    #[serde(default, alias = "LastConnected")]
    pub last_connected: Option<String>,
    #[serde(default, alias = "ReconnectAttempts")]
    pub reconnect_attempts: Option<u32>,
    #[serde(default, alias = "IsReconnecting")]
    pub is_reconnecting: Option<bool>,
    #[serde(default, alias = "Message")]
    pub message: Option<String>,
    #[serde(default, alias = "Timestamp")]
    pub timestamp: Option<String>,
}

/// Response of `POST /connect`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconnectOutcome {
    #[serde(alias = "Success")]
    pub success: bool,
    #[serde(default, alias = "IsConnected")]
    pub is_connected: bool,
    #[serde(default, alias = "Message")]
    pub message: Option<String>,
}

/// Response of `POST /refresh`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshOutcome {
    #[serde(alias = "Success")]
    pub success: bool,
    #[serde(default, alias = "Message")]
    pub message: Option<String>,
    #[serde(default, alias = "Timestamp")]
    pub timestamp: Option<String>,
    #[serde(default, alias = "ValuesCount")]
    pub values_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_accepts_both_casings() {
        let pascal: ConnectionStatus = serde_json::from_value(json!({
            "IsConnected": true,
            "ReconnectAttempts": 2,
            "Message": "OPC UA connected successfully"
        }))
        .unwrap();
        let camel: ConnectionStatus = serde_json::from_value(json!({
            "isConnected": true,
            "reconnectAttempts": 2,
            "message": "OPC UA connected successfully"
        }))
        .unwrap();
        assert_eq!(pascal, camel);
        assert_eq!(pascal.reconnect_attempts, Some(2));
    }

    #[test]
    fn test_batch_response_parsing() {
        let response: BatchReadResponse = serde_json::from_value(json!({
            "success": true,
            "timestamp": "2025-06-01T10:00:00",
            "variables": {
                "MOTOR_1_PUMP_PRESSURE_EXECUTION": {
                    "value": 121.5,
                    "quality": "Good",
                    "timestamp": "2025-06-01T10:00:00",
                    "dataType": "Float"
                },
                "MOTOR_1_ENABLED_EXECUTION": {"value": true, "quality": "Good"},
                "MOTOR_9_PUMP_PRESSURE_EXECUTION": {"value": null, "quality": "Bad"}
            },
            "errors": ["Variable 'MOTOR_9_PUMP_PRESSURE_EXECUTION' not found in collection"]
        }))
        .unwrap();

        assert!(response.success);
        assert_eq!(response.good_f64("MOTOR_1_PUMP_PRESSURE_EXECUTION"), Some(121.5));
        assert_eq!(response.good_f64("MOTOR_1_ENABLED_EXECUTION"), Some(1.0));
        assert_eq!(response.good_f64("MOTOR_9_PUMP_PRESSURE_EXECUTION"), None);
        assert_eq!(response.errors.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn test_unknown_quality_does_not_fail() {
        let value: VariableValue =
            serde_json::from_value(json!({"Value": 1, "Quality": "Stale"})).unwrap();
        assert_eq!(value.quality, Quality::Unknown);
    }

    #[test]
    fn test_request_bodies() {
        let write = WriteRequest {
            display_name: "MOTOR_2_PUMP_PRESSURE_SETPOINT".to_string(),
            value: json!(110.0),
            data_type: Some(DataType::Real),
        };
        assert_eq!(
            serde_json::to_value(&write).unwrap(),
            json!({
                "DisplayName": "MOTOR_2_PUMP_PRESSURE_SETPOINT",
                "Value": 110.0,
                "DataType": "REAL-Float"
            })
        );

        let batch = BatchWriteRequest {
            operations: vec![WriteOperation::new("MOTOR_1_ENABLE_CONTROL_EXECUTION", true)],
        };
        assert_eq!(
            serde_json::to_value(&batch).unwrap(),
            json!({"operations": [
                {"variableName": "MOTOR_1_ENABLE_CONTROL_EXECUTION", "value": true}
            ]})
        );

        let read = BatchReadRequest {
            variables: vec!["A".to_string()],
            page_context: "motors".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&read).unwrap(),
            json!({"variables": ["A"], "pageContext": "motors"})
        );
    }
}
