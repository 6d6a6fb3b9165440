//! Provider query observation
//!
//! Every attempted provider call, retries included, is reported once to a
//! [`QueryObserver`] with its outcome and start time.

use crate::aws::ProviderError;
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

/// Operation names reported for each provider call
pub mod operations {
    pub const DESCRIBE_AUTO_SCALING_GROUPS: &str = "DescribeAutoScalingGroupsPages";
    pub const DESCRIBE_LAUNCH_CONFIGURATIONS: &str = "DescribeLaunchConfigurations";
    pub const DESCRIBE_TAGS: &str = "DescribeTagsPages";
}

/// Receives one observation per attempted provider call
pub trait QueryObserver: Send + Sync {
    fn observe_query(
        &self,
        provider: &str,
        operation: &str,
        error: Option<&ProviderError>,
        start: Instant,
    );
}

/// Emits each query as a tracing event
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl QueryObserver for TracingObserver {
    fn observe_query(
        &self,
        provider: &str,
        operation: &str,
        error: Option<&ProviderError>,
        start: Instant,
    ) {
        let elapsed_ms = start.elapsed().as_millis() as u64;
        match error {
            None => debug!(provider, operation, elapsed_ms, "Provider query succeeded"),
            Some(e) => debug!(provider, operation, elapsed_ms, error = %e, "Provider query failed"),
        }
    }
}

/// Aggregated counters for one operation
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OperationStats {
    pub calls: u64,
    pub errors: u64,
    pub throttled: u64,
    pub total_duration: Duration,
}

/// In-memory per-operation query counters
#[derive(Debug, Default)]
pub struct QueryStats {
    operations: Mutex<BTreeMap<String, OperationStats>>,
}

impl QueryStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counters for one operation (zero if never observed)
    pub fn get(&self, operation: &str) -> OperationStats {
        self.snapshot().get(operation).copied().unwrap_or_default()
    }

    /// Total attempts across all operations
    pub fn total_calls(&self) -> u64 {
        self.snapshot().values().map(|s| s.calls).sum()
    }

    pub fn snapshot(&self) -> BTreeMap<String, OperationStats> {
        self.operations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl QueryObserver for QueryStats {
    fn observe_query(
        &self,
        provider: &str,
        operation: &str,
        error: Option<&ProviderError>,
        start: Instant,
    ) {
        TracingObserver.observe_query(provider, operation, error, start);

        let mut operations = self
            .operations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let stats = operations.entry(operation.to_string()).or_default();
        stats.calls += 1;
        stats.total_duration += start.elapsed();
        if let Some(e) = error {
            stats.errors += 1;
            if e.is_throttled() {
                stats.throttled += 1;
            }
        }
    }
}
