//! AWS client modules
//!
//! - autoscaling: Auto Scaling API trait, records and the SDK-backed client
//! - context: shared SDK configuration
//! - error: provider error classification

pub mod autoscaling;
pub mod context;
pub mod error;

pub use autoscaling::{
    AutoScalingApi, AutoScalingClient, GroupRecord, LaunchConfigRecord, Page, TagQueryFilter,
    TagRecord,
};
pub use context::AwsContext;
pub use error::{ProviderError, classify_aws_error, classify_sdk_error};
