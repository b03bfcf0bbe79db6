// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the hgu-opc-client project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Page-scoped variable set planning
//!
//! Each HMI page declares the subset of system and motor signals it displays.
//! [`resolve_page`] turns that declaration into the flat, ordered,
//! duplicate-free list of wire variable names sent in one batch read.
//!
//! Ordering is deterministic: system variables first in declaration order,
//! then for each declared motor (ascending as declared) every declared motor
//! key in declaration order.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::naming::{generate_motor_variable_name, MotorIndex, NamingError};
use super::registry::{find_motor_variable, find_system_variable};

/// Configuration errors in page plans or ad-hoc key lookups
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("Unknown page '{0}'")]
    UnknownPage(String),
    #[error("Page '{page}' references unknown system key '{key}'")]
    UnknownSystemKey { page: String, key: String },
    #[error("Page '{page}' references unknown motor key '{key}'")]
    UnknownMotorKey { page: String, key: String },
    #[error(transparent)]
    Naming(#[from] NamingError),
}

/// Identifier of an HMI page
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageId {
    Main,
    Motors,
    Logs,
    Alarms,
    Stats,
}

impl PageId {
    /// Every declared page, in declaration order
    pub const ALL: [PageId; 5] = [
        PageId::Main,
        PageId::Motors,
        PageId::Logs,
        PageId::Alarms,
        PageId::Stats,
    ];

    /// Page identifier as sent in the `pageContext` field
    pub fn as_str(&self) -> &'static str {
        match self {
            PageId::Main => "main",
            PageId::Motors => "motors",
            PageId::Logs => "logs",
            PageId::Alarms => "alarms",
            PageId::Stats => "stats",
        }
    }

    /// Static plan for this page
    pub fn plan(&self) -> &'static PagePlan {
        // PAGE_PLANS is declared in the same order as PageId::ALL
        &PAGE_PLANS[*self as usize]
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageId {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PageId::ALL
            .into_iter()
            .find(|page| page.as_str() == s)
            .ok_or_else(|| PlanError::UnknownPage(s.to_string()))
    }
}

/// Signals required by one page
#[derive(Debug, Clone, Copy)]
pub struct PagePlan {
    pub id: PageId,
    /// Human label
    pub name: &'static str,
    /// System `frontend_key`s
    pub system_variables: &'static [&'static str],
    /// Motor `frontend_key`s, resolved for every entry of `motors`
    pub motor_variables: &'static [&'static str],
    /// Motor indices (1..=7); empty for pages without motor data
    pub motors: &'static [u8],
}

const ALL_MOTORS: &[u8] = &[1, 2, 3, 4, 5, 6, 7];

/// Page plans, indexed by `PageId as usize`
pub static PAGE_PLANS: [PagePlan; 5] = [
    PagePlan {
        id: PageId::Main,
        name: "Main Dashboard",
        system_variables: &[
            "totalFlow",
            "totalPressure",
            "oilTemperature",
            "tankLevel",
            "aquaSensor",
            "waterTemperature",
            "coolingFlowRate",
            "coolingSystemStatus",
            "coolingPumpStatus",
            "minOilTempSetpoint",
            "maxOilTempSetpoint",
        ],
        motor_variables: &["status", "enabled", "pressure", "flow", "temperature"],
        motors: ALL_MOTORS,
    },
    PagePlan {
        id: PageId::Motors,
        name: "Motors Page",
        system_variables: &["totalFlow", "totalPressure"],
        motor_variables: &[
            "rpm",
            "targetRpm",
            "pressure",
            "pressureSetpoint",
            "flow",
            "flowSetpoint",
            "current",
            "temperature",
            "status",
            "enabled",
            "valve",
            "lineFilter",
            "suctionFilter",
            "leak",
        ],
        motors: ALL_MOTORS,
    },
    PagePlan {
        id: PageId::Logs,
        name: "Logs",
        system_variables: &["totalFlow", "totalPressure"],
        motor_variables: &["status", "enabled"],
        motors: ALL_MOTORS,
    },
    PagePlan {
        id: PageId::Alarms,
        name: "Alarms",
        system_variables: &[
            "totalFlow",
            "totalPressure",
            "oilTemperature",
            "tankLevel",
            "aquaSensor",
        ],
        motor_variables: &["status", "temperature", "lineFilter", "suctionFilter", "leak"],
        motors: ALL_MOTORS,
    },
    PagePlan {
        id: PageId::Stats,
        name: "Statistics",
        system_variables: &["totalFlow", "totalPressure", "oilTemperature"],
        motor_variables: &["rpm", "current", "pressure", "flow", "temperature", "status"],
        motors: ALL_MOTORS,
    },
];

/// Ordered list that ignores repeated names
#[derive(Default)]
struct UniqueNames {
    seen: HashSet<String>,
    names: Vec<String>,
}

impl UniqueNames {
    fn push(&mut self, name: String) {
        if self.seen.insert(name.clone()) {
            self.names.push(name);
        }
    }
}

/// Resolve an arbitrary plan into wire variable names
///
/// # Errors
///
/// Any key missing from its registry, or any motor outside `1..=7`, is a
/// configuration error and aborts the resolution.
pub fn resolve_plan(plan: &PagePlan) -> Result<Vec<String>, PlanError> {
    let mut out = UniqueNames::default();

    for key in plan.system_variables {
        let def = find_system_variable(key).ok_or_else(|| PlanError::UnknownSystemKey {
            page: plan.id.to_string(),
            key: key.to_string(),
        })?;
        out.push(def.wire_name_template.to_string());
    }

    for &motor in plan.motors {
        let motor = MotorIndex::new(motor)?;
        for key in plan.motor_variables {
            let def = find_motor_variable(key).ok_or_else(|| PlanError::UnknownMotorKey {
                page: plan.id.to_string(),
                key: key.to_string(),
            })?;
            out.push(generate_motor_variable_name(def.wire_name_template, motor)?);
        }
    }

    Ok(out.names)
}

/// Wire variable names for one page
///
/// # Example
///
/// ```
/// use hgu_opc_client::opc::pages::{resolve_page, PageId};
///
/// let names = resolve_page(PageId::Logs).unwrap();
/// assert_eq!(names[0], "SYSTEM_TOTAL_FLOW_SETPOINT");
/// assert_eq!(names[2], "MOTOR_1_MOTOR_STATUS_EXECUTION");
/// ```
pub fn resolve_page(page: PageId) -> Result<Vec<String>, PlanError> {
    resolve_plan(page.plan())
}

/// Union of every page's variables, for a full-system sync
///
/// The result is duplicate-free; names keep the order in which they first
/// appear when walking the pages in [`PageId::ALL`] order.
pub fn resolve_all_pages() -> Result<Vec<String>, PlanError> {
    let mut out = UniqueNames::default();
    for page in PageId::ALL {
        for name in resolve_page(page)? {
            out.push(name);
        }
    }
    Ok(out.names)
}

/// Wire names of one motor key across several motors
pub fn resolve_motor_key(key: &str, motors: &[MotorIndex]) -> Result<Vec<String>, PlanError> {
    let def = find_motor_variable(key).ok_or_else(|| PlanError::UnknownMotorKey {
        page: "ad-hoc".to_string(),
        key: key.to_string(),
    })?;
    motors
        .iter()
        .map(|&motor| {
            generate_motor_variable_name(def.wire_name_template, motor).map_err(PlanError::from)
        })
        .collect()
}

/// Resolved variable list of every page, keyed by page
pub fn variable_request_map() -> Result<BTreeMap<PageId, Vec<String>>, PlanError> {
    PageId::ALL
        .into_iter()
        .map(|page| resolve_page(page).map(|names| (page, names)))
        .collect()
}

/// Resolve every page plan once, failing on the first configuration error
pub fn validate_page_plans() -> Result<(), PlanError> {
    for page in PageId::ALL {
        resolve_page(page)?;
    }
    Ok(())
}
