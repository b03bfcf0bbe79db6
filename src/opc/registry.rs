// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the hgu-opc-client project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Declarative OPC variable registry
//!
//! Each entry maps a logical signal (`frontend_key`) to the wire-level variable
//! name used by the PLC gateway. Motor-scoped entries carry a template with the
//! `X` placeholder segment (`MOTOR_X_PUMP_PRESSURE_EXECUTION`) that the
//! [name generator](super::naming) substitutes with a motor index.
//!
//! Three disjoint tables exist:
//!
//! - [`MOTOR_VARIABLES`]: per-motor measurements and setpoints
//! - [`SYSTEM_VARIABLES`]: plant-wide values (cooling loop, totals)
//! - [`MOTOR_COMMANDS`]: per-motor write-only control signals

use serde::{Deserialize, Serialize};
use std::fmt;

/// PLC data type of a variable, serialized with the gateway's spelling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// 32-bit float
    #[serde(rename = "REAL-Float")]
    Real,
    /// Boolean flag
    #[serde(rename = "Bool")]
    Bool,
    /// 8-bit signed integer (status and state codes)
    #[serde(rename = "ShortInt")]
    ShortInt,
    /// 32-bit signed integer
    #[serde(rename = "DINT-Int")]
    DInt,
}

impl DataType {
    /// Wire spelling of the data type
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Real => "REAL-Float",
            DataType::Bool => "Bool",
            DataType::ShortInt => "ShortInt",
            DataType::DInt => "DINT-Int",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable definition of one logical signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableDefinition {
    /// Stable identifier used by callers and page plans
    pub frontend_key: &'static str,
    /// Human label, never used for lookups
    pub display_name: &'static str,
    /// Wire name, or wire name template for motor-scoped signals
    pub wire_name_template: &'static str,
    pub data_type: DataType,
    /// Display unit, if any
    pub unit: Option<&'static str>,
    /// Whether the template needs a motor index to resolve
    pub is_motor_scoped: bool,
}

const fn motor(
    frontend_key: &'static str,
    display_name: &'static str,
    wire_name_template: &'static str,
    data_type: DataType,
    unit: Option<&'static str>,
) -> VariableDefinition {
    VariableDefinition {
        frontend_key,
        display_name,
        wire_name_template,
        data_type,
        unit,
        is_motor_scoped: true,
    }
}

const fn system(
    frontend_key: &'static str,
    display_name: &'static str,
    wire_name: &'static str,
    data_type: DataType,
    unit: Option<&'static str>,
) -> VariableDefinition {
    VariableDefinition {
        frontend_key,
        display_name,
        wire_name_template: wire_name,
        data_type,
        unit,
        is_motor_scoped: false,
    }
}

/// Per-motor measurements and setpoints
#[rustfmt::skip]
pub const MOTOR_VARIABLES: &[VariableDefinition] = &[
    motor("rpm", "Motor speed", "MOTOR_X_MOTOR_RPM_EXECUTION", DataType::Real, Some("RPM")),
    motor("pressure", "Pump pressure", "MOTOR_X_PUMP_PRESSURE_EXECUTION", DataType::Real, Some("Bar")),
    motor("flow", "Pump flow", "MOTOR_X_PUMP_FLOW_EXECUTION", DataType::Real, Some("L/Min")),
    motor("current", "Motor current", "MOTOR_X_MOTOR_CURRENT_EXECUTION", DataType::Real, Some("A")),
    motor("temperature", "Motor temperature", "MOTOR_X_MOTOR_TEMPERATURE_EXECUTION", DataType::Real, Some("C")),
    motor("status", "Motor status", "MOTOR_X_MOTOR_STATUS_EXECUTION", DataType::ShortInt, None),
    motor("enabled", "Motor enabled", "MOTOR_X_ENABLED_EXECUTION", DataType::Bool, None),
    motor("valve", "Valve state", "MOTOR_X_VALVE_EXECUTION", DataType::ShortInt, None),
    motor("lineFilter", "Line filter", "MOTOR_X_LINE_FILTER_EXECUTION", DataType::ShortInt, None),
    motor("suctionFilter", "Suction filter", "MOTOR_X_SUCTION_FILTER_EXECUTION", DataType::ShortInt, None),
    motor("targetRpm", "Target speed", "MOTOR_X_MOTOR_TARGET_RPM_EXECUTION", DataType::Real, Some("RPM")),
    motor("pressureSetpoint", "Pressure setpoint", "MOTOR_X_PUMP_PRESSURE_SETPOINT", DataType::Real, Some("Bar")),
    motor("flowSetpoint", "Flow setpoint", "MOTOR_X_PUMP_FLOW_SETPOINT", DataType::Real, Some("L/Min")),
    motor("leak", "Pump leakage", "MOTOR_X_PUMP_LEAK_EXECUTION", DataType::Real, Some("L/Min")),
];

/// Plant-wide values
#[rustfmt::skip]
pub const SYSTEM_VARIABLES: &[VariableDefinition] = &[
    system("totalFlow", "Total system flow", "SYSTEM_TOTAL_FLOW_SETPOINT", DataType::Real, Some("L/Min")),
    system("totalPressure", "Total system pressure", "SYSTEM_PRESSURE_SETPOINT", DataType::Real, Some("Bar")),
    system("oilTemperature", "Oil temperature", "COOLING_OIL_TEMPERATURE_EXECUTION", DataType::Real, Some("C")),
    system("tankLevel", "Tank level", "COOLING_OIL_LEVEL_PERCENT_EXECUTION", DataType::Real, Some("%")),
    system("aquaSensor", "Water-in-oil sensor", "COOLING_AQUA_SENSOR_EXECUTION", DataType::Real, Some("%")),
    system("waterTemperature", "Water temperature", "COOLING_WATER_TEMPERATURE_EXECUTION", DataType::Real, Some("C")),
    system("coolingFlowRate", "Cooling flow", "COOLING_FLOW_RATE_EXECUTION", DataType::Real, Some("L/Min")),
    system("coolingSystemStatus", "Cooling system status", "COOLING_SYSTEM_STATUS_EXECUTION", DataType::DInt, None),
    system("coolingPumpStatus", "Cooling pump status", "COOLING_PUMP_STATUS_EXECUTION", DataType::Bool, None),
    system("minOilTempSetpoint", "Min oil temperature setpoint", "COOLING_MIN_OIL_TEMP_SETPOINT", DataType::Real, Some("C")),
    system("maxOilTempSetpoint", "Max oil temperature setpoint", "COOLING_MAX_OIL_TEMP_SETPOINT", DataType::Real, Some("C")),
];

/// Per-motor control signals
#[rustfmt::skip]
pub const MOTOR_COMMANDS: &[VariableDefinition] = &[motor(
    "enableCommand",
    "Motor enable/disable",
    "MOTOR_X_ENABLE_CONTROL_EXECUTION",
    DataType::Bool,
    None,
)];

fn find_in(table: &'static [VariableDefinition], key: &str) -> Option<&'static VariableDefinition> {
    table.iter().find(|def| def.frontend_key == key)
}

/// Look up a motor measurement/setpoint by logical key
pub fn find_motor_variable(key: &str) -> Option<&'static VariableDefinition> {
    find_in(MOTOR_VARIABLES, key)
}

/// Look up a system variable by logical key
pub fn find_system_variable(key: &str) -> Option<&'static VariableDefinition> {
    find_in(SYSTEM_VARIABLES, key)
}

/// Look up a motor-scoped key in the measurement table, then the command table
pub fn find_motor_scoped(key: &str) -> Option<&'static VariableDefinition> {
    find_motor_variable(key).or_else(|| find_in(MOTOR_COMMANDS, key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_frontend_keys_are_unique_per_table() {
        for table in [MOTOR_VARIABLES, SYSTEM_VARIABLES, MOTOR_COMMANDS] {
            let keys: HashSet<_> = table.iter().map(|d| d.frontend_key).collect();
            assert_eq!(keys.len(), table.len());
        }
    }

    #[test]
    fn test_tables_are_disjoint() {
        let motor_keys: HashSet<_> = MOTOR_VARIABLES
            .iter()
            .chain(MOTOR_COMMANDS)
            .map(|d| d.frontend_key)
            .collect();
        for def in SYSTEM_VARIABLES {
            assert!(!motor_keys.contains(def.frontend_key), "{}", def.frontend_key);
        }
    }

    #[test]
    fn test_scope_flag_matches_template() {
        for def in MOTOR_VARIABLES.iter().chain(MOTOR_COMMANDS) {
            assert!(def.is_motor_scoped);
            assert!(def.wire_name_template.split('_').any(|s| s == "X"));
        }
        for def in SYSTEM_VARIABLES {
            assert!(!def.is_motor_scoped);
            assert!(!def.wire_name_template.split('_').any(|s| s == "X"));
        }
    }

    #[test]
    fn test_lookup() {
        assert_eq!(
            find_motor_variable("leak").map(|d| d.wire_name_template),
            Some("MOTOR_X_PUMP_LEAK_EXECUTION")
        );
        assert!(find_motor_variable("totalFlow").is_none());
        assert_eq!(
            find_system_variable("totalFlow").map(|d| d.data_type),
            Some(DataType::Real)
        );
        assert!(find_motor_scoped("enableCommand").is_some());
        assert!(find_motor_variable("enableCommand").is_none());
    }

    #[test]
    fn test_data_type_wire_spelling() {
        assert_eq!(serde_json::to_string(&DataType::Real).unwrap(), "\"REAL-Float\"");
        assert_eq!(DataType::DInt.to_string(), "DINT-Int");
        let parsed: DataType = serde_json::from_str("\"ShortInt\"").unwrap();
        assert_eq!(parsed, DataType::ShortInt);
    }
}
