// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the hgu-opc-client project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Utility module for common utilities used throughout the project

pub mod clock;
pub mod performance;

// Re-exports for use in other modules
pub use clock::{Clock, ManualClock, SystemClock};
pub use performance::{instrument, PerformanceRecord, PerformanceSummary, PerformanceTracker};
