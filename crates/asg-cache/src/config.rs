//! Resolver configuration
//!
//! Settings come from CLI flags or a JSON file. Groups are either listed
//! explicitly as `<min>:<max>:<name>` specs or discovered from
//! `asg:tag=...` specs, never both.

use crate::registry::GroupSource;
use anyhow::{Context, Result, bail};
use asg_cache_common::defaults::{default_region, default_throttle_retry_delay_ms};
use asg_cache_common::{parse_auto_discovery_spec, parse_group_spec};
use garde::Validate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Configuration for resolving groups against one region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, garde::Validate)]
#[serde(deny_unknown_fields)]
pub struct ResolverConfig {
    /// AWS region
    #[serde(default = "default_region")]
    #[garde(length(min = 1))]
    pub region: String,

    /// AWS profile name (overrides default credential resolution)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[garde(skip)]
    pub aws_profile: Option<String>,

    /// Explicit group specs (`<min>:<max>:<name>`)
    #[serde(default)]
    #[garde(skip)]
    pub groups: Vec<String>,

    /// Auto-discovery specs (`asg:tag=<key>[=<value>],...`)
    #[serde(default)]
    #[garde(skip)]
    pub auto_discovery: Vec<String>,

    /// Delay before retrying a throttled request, in milliseconds
    #[serde(default = "default_throttle_retry_delay_ms")]
    #[garde(range(max = 60_000))]
    pub throttle_retry_delay_ms: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            aws_profile: None,
            groups: Vec::new(),
            auto_discovery: Vec::new(),
            throttle_retry_delay_ms: default_throttle_retry_delay_ms(),
        }
    }
}

impl ResolverConfig {
    /// Load and validate configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        Ok(config)
    }

    pub fn throttle_retry_delay(&self) -> Duration {
        Duration::from_millis(self.throttle_retry_delay_ms)
    }

    /// Parse the configured specs into a group source
    pub fn group_source(&self) -> Result<GroupSource> {
        match (self.groups.is_empty(), self.auto_discovery.is_empty()) {
            (false, false) => bail!("explicit groups and auto-discovery cannot be used together"),
            (true, true) => bail!("no groups or auto-discovery specs configured"),
            (false, true) => {
                let descriptors = self
                    .groups
                    .iter()
                    .map(|spec| parse_group_spec(spec))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(GroupSource::Explicit(descriptors))
            }
            (true, false) => {
                let filters = self
                    .auto_discovery
                    .iter()
                    .map(|spec| parse_auto_discovery_spec(spec))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(GroupSource::AutoDiscovery(filters))
            }
        }
    }
}
