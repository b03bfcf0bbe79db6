// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the hgu-opc-client project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Call performance tracking
//!
//! Every gateway operation goes through [`instrument`], which logs the call,
//! measures it and appends a [`PerformanceRecord`] to a bounded ring buffer.
//! Once the buffer is full the oldest record is dropped first.

use chrono::{DateTime, Utc};
use log::{debug, error};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt::Display;
use std::future::Future;
use std::sync::Mutex;
use std::time::Instant;

/// Default ring buffer capacity
pub const DEFAULT_CAPACITY: usize = 1000;

/// One measured operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    /// Operation name, e.g. `read_page` or `write_one`
    pub operation: String,
    /// Elapsed time in milliseconds
    pub elapsed_ms: f64,
    /// When the operation completed
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    /// Error message of a failed operation
    pub error: Option<String>,
}

/// Point-in-time aggregate over the buffered records
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub total_calls: usize,
    /// Mean elapsed time in milliseconds, rounded to 2 decimals
    pub average_execution_ms: f64,
    /// Percentage of successful calls (0-100), rounded to 2 decimals
    pub success_rate: f64,
}

/// Bounded FIFO of performance records
#[derive(Debug)]
pub struct PerformanceTracker {
    capacity: usize,
    records: Mutex<VecDeque<PerformanceRecord>>,
}

impl Default for PerformanceTracker {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl PerformanceTracker {
    /// Create a tracker holding at most `capacity` records (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            records: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a record, evicting the oldest ones beyond capacity
    pub fn record(
        &self,
        operation: impl Into<String>,
        elapsed_ms: f64,
        success: bool,
        error: Option<String>,
    ) {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.push_back(PerformanceRecord {
            operation: operation.into(),
            elapsed_ms,
            timestamp: Utc::now(),
            success,
            error,
        });
        while records.len() > self.capacity {
            records.pop_front();
        }
    }

    /// Count, mean elapsed time and success rate as of now
    pub fn summary(&self) -> PerformanceSummary {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        if records.is_empty() {
            return PerformanceSummary {
                total_calls: 0,
                average_execution_ms: 0.0,
                success_rate: 0.0,
            };
        }

        let total_calls = records.len();
        let successful = records.iter().filter(|r| r.success).count();
        let total_ms: f64 = records.iter().map(|r| r.elapsed_ms).sum();

        PerformanceSummary {
            total_calls,
            average_execution_ms: round2(total_ms / total_calls as f64),
            success_rate: round2(successful as f64 / total_calls as f64 * 100.0),
        }
    }

    /// Copy of the buffered records, oldest first
    pub fn records(&self) -> Vec<PerformanceRecord> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

/// Run `operation`, logging and recording its duration and outcome
///
/// The result is returned untouched; failures are recorded and then
/// propagated to the caller.
///
/// # Example
///
/// ```
/// use hgu_opc_client::utility::performance::{instrument, PerformanceTracker};
///
/// let tracker = PerformanceTracker::new(10);
/// let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
/// let value: Result<u32, String> = rt.block_on(instrument(&tracker, "answer", async { Ok(42) }));
/// assert_eq!(value, Ok(42));
/// assert_eq!(tracker.summary().total_calls, 1);
/// ```
pub async fn instrument<T, E, F>(
    tracker: &PerformanceTracker,
    name: &str,
    operation: F,
) -> Result<T, E>
where
    E: Display,
    F: Future<Output = Result<T, E>>,
{
    debug!("{} started", name);
    let start = Instant::now();
    let result = operation.await;
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    match &result {
        Ok(_) => {
            debug!("{} completed in {:.2}ms", name, elapsed_ms);
            tracker.record(name, elapsed_ms, true, None);
        }
        Err(e) => {
            error!("{} failed in {:.2}ms: {}", name, elapsed_ms, e);
            tracker.record(name, elapsed_ms, false, Some(e.to_string()));
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_summary() {
        let tracker = PerformanceTracker::new(5);
        let summary = tracker.summary();
        assert_eq!(summary.total_calls, 0);
        assert_eq!(summary.average_execution_ms, 0.0);
        assert_eq!(summary.success_rate, 0.0);
    }

    #[test]
    fn test_ring_buffer_keeps_most_recent() {
        let tracker = PerformanceTracker::new(3);
        for i in 0..10 {
            tracker.record(format!("op{}", i), i as f64, true, None);
        }
        assert_eq!(tracker.len(), 3);
        let names: Vec<_> = tracker.records().into_iter().map(|r| r.operation).collect();
        assert_eq!(names, vec!["op7", "op8", "op9"]);
    }

    #[test]
    fn test_summary_values() {
        let tracker = PerformanceTracker::new(10);
        tracker.record("a", 10.0, true, None);
        tracker.record("b", 20.0, false, Some("boom".to_string()));
        tracker.record("c", 30.5, true, None);

        let summary = tracker.summary();
        assert_eq!(summary.total_calls, 3);
        assert_eq!(summary.average_execution_ms, 20.17);
        assert_eq!(summary.success_rate, 66.67);
        assert_eq!(tracker.records()[1].error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let tracker = PerformanceTracker::new(0);
        tracker.record("a", 1.0, true, None);
        tracker.record("b", 1.0, true, None);
        assert_eq!(tracker.capacity(), 1);
        assert_eq!(tracker.records()[0].operation, "b");
    }

    #[tokio::test]
    async fn test_instrument_records_success_and_failure() {
        let tracker = PerformanceTracker::new(10);

        let ok: Result<u8, String> = instrument(&tracker, "ok_op", async { Ok(1) }).await;
        assert_eq!(ok, Ok(1));

        let err: Result<u8, String> =
            instrument(&tracker, "err_op", async { Err("nope".to_string()) }).await;
        assert_eq!(err, Err("nope".to_string()));

        let records = tracker.records();
        assert_eq!(records.len(), 2);
        assert!(records[0].success);
        assert!(!records[1].success);
        assert_eq!(records[1].error.as_deref(), Some("nope"));
        assert_eq!(tracker.summary().success_rate, 50.0);
    }
}
