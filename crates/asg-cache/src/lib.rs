//! asg-cache - Auto Scaling group discovery and launch configuration cache
//!
//! This crate resolves the node groups an autoscaler manages, either by
//! name or by tag, and keeps a cache of the instance type behind each
//! group's launch configuration.

pub mod aws;
pub mod config;
pub mod discovery;
pub mod fetcher;
pub mod launch_config;
pub mod metrics;
pub mod provider;
pub mod registry;

pub use discovery::GroupDiscovery;
pub use fetcher::GroupFetcher;
pub use launch_config::LaunchConfigCache;
pub use provider::Provider;
pub use registry::{GroupRegistry, GroupSource, ResolvedGroup};
