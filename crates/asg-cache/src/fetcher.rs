//! Named group resolution

use crate::aws::{AutoScalingApi, GroupRecord, ProviderError};
use crate::metrics::operations::DESCRIBE_AUTO_SCALING_GROUPS;
use crate::provider::Provider;
use asg_cache_common::defaults::MAX_GROUP_NAMES_PER_DESCRIBE;
use std::collections::BTreeSet;
use tracing::debug;

/// Resolves explicitly named groups through DescribeAutoScalingGroups.
///
/// Holds no state between calls.
pub struct GroupFetcher<P> {
    provider: Provider<P>,
}

impl<P: AutoScalingApi> GroupFetcher<P> {
    pub fn new(provider: Provider<P>) -> Self {
        Self { provider }
    }

    /// Describe the named groups.
    ///
    /// The provider accepts at most 50 names per request, so names are
    /// described in batches, each followed through all of its pages. Batches
    /// and pages run one at a time. A throttled page is retried once; any
    /// error that survives that aborts the whole fetch and nothing gathered
    /// so far is returned. Names the provider does not know are simply absent
    /// from the result.
    pub async fn fetch_by_names<I, S>(&self, names: I) -> Result<Vec<GroupRecord>, ProviderError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names
            .into_iter()
            .map(Into::into)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let mut groups = Vec::new();
        for batch in names.chunks(MAX_GROUP_NAMES_PER_DESCRIBE) {
            let mut next_token: Option<String> = None;
            loop {
                let page = self
                    .provider
                    .call_with_throttle_retry(DESCRIBE_AUTO_SCALING_GROUPS, || {
                        self.provider.api().describe_groups_page(
                            batch,
                            MAX_GROUP_NAMES_PER_DESCRIBE as i32,
                            next_token.clone(),
                        )
                    })
                    .await?;

                groups.extend(page.items);
                match page.next_token {
                    Some(token) => next_token = Some(token),
                    None => break,
                }
            }
        }

        debug!(
            requested = names.len(),
            found = groups.len(),
            "Described auto scaling groups"
        );
        Ok(groups)
    }
}
