//! Provider limits and default configuration values
//!
//! The Auto Scaling API caps how many names a single describe call accepts
//! and how many records a page may hold. Every caller batches against these.

/// Provider name reported to the query observer
pub const PROVIDER_NAME: &str = "aws";

/// Maximum group names accepted by one DescribeAutoScalingGroups call
pub const MAX_GROUP_NAMES_PER_DESCRIBE: usize = 50;

/// Maximum launch configuration names accepted by one DescribeLaunchConfigurations call
pub const MAX_LAUNCH_CONFIGS_PER_DESCRIBE: usize = 50;

/// Page size for DescribeTags
pub const MAX_RECORDS_RETURNED_BY_API: i32 = 100;

/// Default AWS region
pub const DEFAULT_REGION: &str = "us-east-1";

/// Retries granted to a throttled request before the error is surfaced
pub const THROTTLE_RETRIES: usize = 1;

/// Default delay before retrying a throttled request, in milliseconds
pub const DEFAULT_THROTTLE_RETRY_DELAY_MS: u64 = 0;

// Serde default functions for struct field defaults

/// Returns the default region
pub fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

/// Returns the default throttle retry delay
pub fn default_throttle_retry_delay_ms() -> u64 {
    DEFAULT_THROTTLE_RETRY_DELAY_MS
}
