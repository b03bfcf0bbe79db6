// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the hgu-opc-client project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! OPC variable naming and page planning
//!
//! ```text
//! registry (logical key -> template) ─┐
//!                                     ├─> pages::resolve_page(page) -> [wire names]
//! naming (template + motor -> name) ──┘
//! ```

pub mod naming;
pub mod pages;
pub mod registry;

pub use naming::{generate_motor_variable_name, MotorIndex, NamingError, MOTOR_COUNT};
pub use pages::{
    resolve_all_pages, resolve_motor_key, resolve_page, validate_page_plans,
    variable_request_map, PageId, PagePlan, PlanError,
};
pub use registry::{DataType, VariableDefinition, MOTOR_COMMANDS, MOTOR_VARIABLES, SYSTEM_VARIABLES};
