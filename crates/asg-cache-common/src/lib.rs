//! asg-cache-common - Shared types for group resolution
//!
//! This crate holds the provider-agnostic pieces of asg-cache, without any
//! AWS SDK dependencies to keep it lightweight.
//!
//! ## Modules
//!
//! - [`defaults`]: Provider limits and default configuration values
//! - [`group_spec`]: `<min>:<max>:<name>` group specification parsing
//! - [`local_storage`]: Instance-store volume counts per instance family
//! - [`tags`]: Tag filters and auto-discovery spec parsing

pub mod defaults;
pub mod group_spec;
pub mod local_storage;
pub mod tags;

// Re-export commonly used types
pub use group_spec::{GroupDescriptor, SpecError, parse_group_spec};
pub use local_storage::number_of_local_volumes;
pub use tags::{TagFilter, parse_auto_discovery_spec};
