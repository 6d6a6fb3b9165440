//! Group resolution cycle
//!
//! Turns the configured group source into the current set of provider
//! groups and refreshes the launch configuration cache from it.

use crate::aws::{AutoScalingApi, GroupRecord, ProviderError};
use crate::discovery::GroupDiscovery;
use crate::fetcher::GroupFetcher;
use crate::launch_config::LaunchConfigCache;
use crate::provider::Provider;
use asg_cache_common::{GroupDescriptor, TagFilter};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Where the set of groups comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupSource {
    /// Groups named explicitly, with configured size bounds
    Explicit(Vec<GroupDescriptor>),
    /// Groups carrying all tags of the filters
    AutoDiscovery(Vec<TagFilter>),
}

/// A provider group with its resolved instance type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedGroup {
    #[serde(flatten)]
    pub descriptor: GroupDescriptor,
    pub launch_configuration_name: Option<String>,
    pub instance_type: Option<String>,
}

/// Resolves groups and keeps the launch configuration cache current.
pub struct GroupRegistry<P> {
    fetcher: GroupFetcher<P>,
    discovery: GroupDiscovery<P>,
    cache: Arc<LaunchConfigCache<P>>,
}

impl<P: AutoScalingApi> GroupRegistry<P> {
    /// Build a registry with a fresh, empty cache
    pub fn new(provider: Provider<P>) -> Self {
        let cache = Arc::new(LaunchConfigCache::new(provider.clone()));
        Self::with_cache(provider, cache)
    }

    /// Build a registry around an existing cache
    pub fn with_cache(provider: Provider<P>, cache: Arc<LaunchConfigCache<P>>) -> Self {
        Self {
            fetcher: GroupFetcher::new(provider.clone()),
            discovery: GroupDiscovery::new(provider),
            cache,
        }
    }

    pub fn cache(&self) -> &Arc<LaunchConfigCache<P>> {
        &self.cache
    }

    /// Resolve the groups of `source`, repopulate the cache from them and
    /// return each group with its instance type.
    ///
    /// Explicit groups keep their configured size bounds; discovered groups
    /// take theirs from the provider. Named groups the provider does not
    /// know are skipped with a warning.
    pub async fn refresh(&self, source: &GroupSource) -> Result<Vec<ResolvedGroup>, ProviderError> {
        let (records, configured) = match source {
            GroupSource::Explicit(descriptors) => {
                let records = self
                    .fetcher
                    .fetch_by_names(descriptors.iter().map(|d| d.name.clone()))
                    .await?;
                let configured: HashMap<&str, &GroupDescriptor> =
                    descriptors.iter().map(|d| (d.name.as_str(), d)).collect();
                for descriptor in descriptors {
                    if !records.iter().any(|r| r.name == descriptor.name) {
                        warn!(group = %descriptor.name, "Configured group not found");
                    }
                }
                (records, configured)
            }
            GroupSource::AutoDiscovery(filters) => {
                let names = self.discovery.discover_by_tags(filters).await?;
                (self.fetcher.fetch_by_names(names).await?, HashMap::new())
            }
        };

        self.cache.populate(&records).await?;

        let mut resolved = Vec::with_capacity(records.len());
        for record in &records {
            let descriptor = configured
                .get(record.name.as_str())
                .map(|d| (*d).clone())
                .unwrap_or_else(|| record.descriptor());
            resolved.push(ResolvedGroup {
                descriptor,
                launch_configuration_name: record.launch_configuration_name.clone(),
                instance_type: self.instance_type(record).await?,
            });
        }

        info!(groups = resolved.len(), "Refreshed auto scaling groups");
        Ok(resolved)
    }

    async fn instance_type(&self, record: &GroupRecord) -> Result<Option<String>, ProviderError> {
        let Some(name) = record.launch_configuration_name.as_deref() else {
            return Ok(None);
        };
        match self.cache.lookup(name).await {
            Ok(instance_type) => Ok(Some(instance_type)),
            Err(e) if e.is_not_found() => {
                warn!(group = %record.name, launch_configuration = %name, "Launch configuration not found");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
