// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the hgu-opc-client project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Motor variable name generation
//!
//! Expands a wire-name template such as `MOTOR_X_PUMP_PRESSURE_EXECUTION` into
//! the concrete name for one motor (`MOTOR_3_PUMP_PRESSURE_EXECUTION`). The
//! placeholder is any underscore-delimited segment equal to `X`.
//!
//! The generated name addresses a live signal on the hydraulic unit, so an
//! out-of-range motor or a template without placeholder is rejected instead of
//! producing a name that could collide with another signal.

use std::fmt;
use thiserror::Error;

/// Placeholder segment substituted by the motor index
pub const MOTOR_PLACEHOLDER: &str = "X";

/// Number of physical motor/pump groups on the unit
pub const MOTOR_COUNT: u8 = 7;

/// Errors raised while generating a motor variable name
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NamingError {
    #[error("Motor index {0} is outside 1..=7")]
    MotorOutOfRange(u8),
    #[error("Template '{0}' has no motor placeholder")]
    MissingPlaceholder(String),
}

/// Validated motor index in `1..=MOTOR_COUNT`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MotorIndex(u8);

impl MotorIndex {
    /// Build a motor index, rejecting values outside `1..=MOTOR_COUNT`
    pub fn new(index: u8) -> Result<Self, NamingError> {
        if (1..=MOTOR_COUNT).contains(&index) {
            Ok(Self(index))
        } else {
            Err(NamingError::MotorOutOfRange(index))
        }
    }

    pub fn get(&self) -> u8 {
        self.0
    }

    /// All physical motors in ascending order
    pub fn all() -> impl Iterator<Item = MotorIndex> {
        (1..=MOTOR_COUNT).map(MotorIndex)
    }
}

impl TryFrom<u8> for MotorIndex {
    type Error = NamingError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for MotorIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Substitute every placeholder segment of `template` with the motor index
///
/// # Arguments
///
/// * `template` - Wire-name template containing at least one `X` segment
/// * `motor` - Target motor
///
/// # Returns
///
/// The concrete wire variable name, or [`NamingError::MissingPlaceholder`]
/// when the template cannot be specialised.
///
/// # Example
///
/// ```
/// use hgu_opc_client::opc::naming::{generate_motor_variable_name, MotorIndex};
///
/// let motor = MotorIndex::new(3).unwrap();
/// let name = generate_motor_variable_name("PUMP_X_PRESSURE_ACTUAL", motor).unwrap();
/// assert_eq!(name, "PUMP_3_PRESSURE_ACTUAL");
/// ```
pub fn generate_motor_variable_name(
    template: &str,
    motor: MotorIndex,
) -> Result<String, NamingError> {
    let index = motor.to_string();
    let mut substituted = false;
    let segments: Vec<&str> = template
        .split('_')
        .map(|segment| {
            if segment == MOTOR_PLACEHOLDER {
                substituted = true;
                index.as_str()
            } else {
                segment
            }
        })
        .collect();

    if !substituted {
        return Err(NamingError::MissingPlaceholder(template.to_string()));
    }
    Ok(segments.join("_"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opc::registry::{MOTOR_COMMANDS, MOTOR_VARIABLES};
    use std::collections::HashSet;

    #[test]
    fn test_example_template() {
        let motor = MotorIndex::new(3).unwrap();
        assert_eq!(
            generate_motor_variable_name("PUMP_X_PRESSURE_ACTUAL", motor).unwrap(),
            "PUMP_3_PRESSURE_ACTUAL"
        );
    }

    #[test]
    fn test_every_placeholder_is_substituted() {
        let motor = MotorIndex::new(5).unwrap();
        assert_eq!(
            generate_motor_variable_name("X_LOOP_X", motor).unwrap(),
            "5_LOOP_5"
        );
        // Only whole segments count, not letters inside words
        assert_eq!(
            generate_motor_variable_name("MAX_X_EXEC", motor).unwrap(),
            "MAX_5_EXEC"
        );
    }

    #[test]
    fn test_registry_templates_for_all_motors() {
        for def in MOTOR_VARIABLES.iter().chain(MOTOR_COMMANDS) {
            let names: HashSet<String> = MotorIndex::all()
                .map(|m| generate_motor_variable_name(def.wire_name_template, m).unwrap())
                .collect();
            assert_eq!(names.len(), MOTOR_COUNT as usize);
            for name in &names {
                assert!(!name.split('_').any(|s| s == MOTOR_PLACEHOLDER), "{}", name);
            }
        }
    }

    #[test]
    fn test_out_of_range_motor_is_rejected() {
        assert_eq!(MotorIndex::new(0), Err(NamingError::MotorOutOfRange(0)));
        assert_eq!(MotorIndex::try_from(8), Err(NamingError::MotorOutOfRange(8)));
        assert_eq!(MotorIndex::all().count(), 7);
    }

    #[test]
    fn test_template_without_placeholder_is_rejected() {
        let motor = MotorIndex::new(1).unwrap();
        assert_eq!(
            generate_motor_variable_name("SYSTEM_TOTAL_FLOW", motor),
            Err(NamingError::MissingPlaceholder("SYSTEM_TOTAL_FLOW".to_string()))
        );
    }
}
