//! Launch configuration to instance type cache
//!
//! Knowing which instance type backs each group lets the autoscaler build
//! node templates without one DescribeLaunchConfigurations call per group.
//! The cache is refreshed in bulk from the current group set and filled in
//! lazily on single misses.
//!
//! Both operations hold one exclusive lock for their whole duration,
//! network round-trips included, so concurrent callers are serialized and
//! never observe a half-built cache.

use crate::aws::{AutoScalingApi, GroupRecord, ProviderError};
use crate::metrics::operations::DESCRIBE_LAUNCH_CONFIGURATIONS;
use crate::provider::Provider;
use asg_cache_common::defaults::MAX_LAUNCH_CONFIGS_PER_DESCRIBE;
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Process-wide launch configuration name to instance type cache.
///
/// Construct once and share by `Arc`.
pub struct LaunchConfigCache<P> {
    provider: Provider<P>,
    instance_types: Mutex<HashMap<String, String>>,
}

impl<P: AutoScalingApi> LaunchConfigCache<P> {
    /// Create an empty cache
    pub fn new(provider: Provider<P>) -> Self {
        Self {
            provider,
            instance_types: Mutex::new(HashMap::new()),
        }
    }

    /// Rebuild the cache from the launch configurations `groups` reference.
    ///
    /// Cached entries are carried forward; the rest are described in batches
    /// of 50, each retried once if throttled. On success the cache is
    /// replaced by exactly the referenced configurations, which drops entries
    /// for groups no longer observed, so `populate(&[])` empties the cache.
    /// Groups without a launch configuration, or with an empty name, are
    /// skipped. On failure the cache is left untouched.
    pub async fn populate(&self, groups: &[GroupRecord]) -> Result<(), ProviderError> {
        let mut cache = self.instance_types.lock().await;

        let mut resolved = HashMap::new();
        let mut to_query = Vec::new();
        let mut seen = HashSet::new();
        for name in groups
            .iter()
            .filter_map(|g| g.launch_configuration_name.as_deref())
            .filter(|name| !name.is_empty())
        {
            if !seen.insert(name) {
                continue;
            }
            match cache.get(name) {
                Some(instance_type) => {
                    resolved.insert(name.to_string(), instance_type.clone());
                }
                None => to_query.push(name.to_string()),
            }
        }

        if to_query.is_empty() {
            debug!(
                cached = resolved.len(),
                "All launch configurations already in cache"
            );
            *cache = resolved;
            return Ok(());
        }
        debug!(count = to_query.len(), "Launch configurations to query");

        for batch in to_query.chunks(MAX_LAUNCH_CONFIGS_PER_DESCRIBE) {
            let records = self
                .provider
                .call_with_throttle_retry(DESCRIBE_LAUNCH_CONFIGURATIONS, || {
                    self.provider.api().describe_launch_configurations(
                        batch,
                        MAX_LAUNCH_CONFIGS_PER_DESCRIBE as i32,
                    )
                })
                .await?;

            for record in records {
                resolved.insert(record.name, record.instance_type);
            }
        }

        info!(
            queried = to_query.len(),
            previous = cache.len(),
            current = resolved.len(),
            "Replacing launch configuration cache"
        );
        *cache = resolved;
        Ok(())
    }

    /// Instance type for a launch configuration.
    ///
    /// Misses are described individually, without retry, and inserted.
    pub async fn lookup(&self, name: &str) -> Result<String, ProviderError> {
        let mut cache = self.instance_types.lock().await;
        if let Some(instance_type) = cache.get(name) {
            return Ok(instance_type.clone());
        }

        let names = [name.to_string()];
        let records = self
            .provider
            .observe(
                DESCRIBE_LAUNCH_CONFIGURATIONS,
                self.provider.api().describe_launch_configurations(&names, 1),
            )
            .await
            .inspect_err(|e| {
                debug!(launch_configuration = %name, error = %e, "Launch configuration request failed");
            })?;

        let record = records
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::NotFound {
                name: name.to_string(),
            })?;

        cache.insert(name.to_string(), record.instance_type.clone());
        Ok(record.instance_type)
    }

    /// Number of cached launch configurations
    pub async fn len(&self) -> usize {
        self.instance_types.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.instance_types.lock().await.is_empty()
    }

    /// Copy of the current cache contents
    pub async fn snapshot(&self) -> HashMap<String, String> {
        self.instance_types.lock().await.clone()
    }
}
