//! Tag-based group discovery
//!
//! DescribeTags ORs filters on different tags: asking for keys `[t1, t2]`
//! returns `[asg1, asg1]` when only `asg1` carries both, and also returns
//! groups that carry just one of them. Groups are therefore selected
//! client-side, keeping only those that matched every requested tag.

use crate::aws::{AutoScalingApi, ProviderError, TagQueryFilter, TagRecord};
use crate::metrics::operations::DESCRIBE_TAGS;
use crate::provider::Provider;
use asg_cache_common::TagFilter;
use asg_cache_common::defaults::MAX_RECORDS_RETURNED_BY_API;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Resolves group names from tag filters through DescribeTags.
///
/// Holds no state between calls.
pub struct GroupDiscovery<P> {
    provider: Provider<P>,
}

impl<P: AutoScalingApi> GroupDiscovery<P> {
    pub fn new(provider: Provider<P>) -> Self {
        Self { provider }
    }

    /// Names of the groups carrying every tag in `filters`, in the order they
    /// qualified.
    pub async fn discover_by_tags(&self, filters: &[TagFilter]) -> Result<Vec<String>, ProviderError> {
        let query = build_filters(filters);
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let page = self
                .provider
                .call_with_throttle_retry(DESCRIBE_TAGS, || {
                    self.provider.api().describe_tags_page(
                        &query,
                        MAX_RECORDS_RETURNED_BY_API,
                        next_token.clone(),
                    )
                })
                .await?;

            records.extend(page.items);
            match page.next_token {
                Some(token) => next_token = Some(token),
                None => break,
            }
        }

        let names = extract_group_names(filters, &records);
        debug!(
            filters = query.len(),
            tag_records = records.len(),
            groups = names.len(),
            "Discovered auto scaling groups by tags"
        );
        Ok(names)
    }
}

/// Flatten tag filters into DescribeTags terms: a `key` term per tag,
/// followed by a `value` term when the tag names a value.
pub fn build_filters(filters: &[TagFilter]) -> Vec<TagQueryFilter> {
    let mut terms = Vec::new();
    for filter in filters {
        for (key, value) in filter.iter() {
            terms.push(TagQueryFilter::key(key));
            if !value.is_empty() {
                terms.push(TagQueryFilter::value(value));
            }
        }
    }
    terms
}

/// Select the groups whose records cover every requested tag key.
///
/// A record counts toward its key only when that key was requested and, if
/// the request names values for it, the record's value is one of them.
/// Single pass: a group is emitted when its count of distinct matched keys
/// reaches the number of requested keys, and never again.
pub fn extract_group_names(filters: &[TagFilter], records: &[TagRecord]) -> Vec<String> {
    // key -> accepted values; None accepts any value
    let mut requested: HashMap<&str, Option<HashSet<&str>>> = HashMap::new();
    for filter in filters {
        for (key, value) in filter.iter() {
            let accepted = requested.entry(key).or_insert_with(|| Some(HashSet::new()));
            match accepted {
                Some(values) if !value.is_empty() => {
                    values.insert(value);
                }
                _ => *accepted = None,
            }
        }
    }
    if requested.is_empty() {
        return Vec::new();
    }

    let mut matched: HashMap<&str, HashSet<&str>> = HashMap::new();
    let mut names = Vec::new();
    for record in records {
        let Some(accepted) = requested.get(record.key.as_str()) else {
            continue;
        };
        if accepted
            .as_ref()
            .is_some_and(|values| !values.contains(record.value.as_str()))
        {
            continue;
        }

        let keys = matched.entry(record.resource_id.as_str()).or_default();
        if keys.insert(record.key.as_str()) && keys.len() == requested.len() {
            names.push(record.resource_id.clone());
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(key: &str, value: &str, group: &str) -> TagRecord {
        TagRecord {
            key: key.to_string(),
            value: value.to_string(),
            resource_id: group.to_string(),
            resource_type: "auto-scaling-group".to_string(),
        }
    }

    #[test]
    fn test_build_single_key_filter() {
        let filters = [TagFilter::new().with_tag("k8s.io/cluster-autoscaler/enabled", "")];
        assert_eq!(
            build_filters(&filters),
            vec![TagQueryFilter::key("k8s.io/cluster-autoscaler/enabled")]
        );
    }

    #[test]
    fn test_build_filters_with_values() {
        let filters = [TagFilter::new()
            .with_tag("node-role.kubernetes.io/cluster-autoscaler", "")
            .with_tag("k8s.io/cluster-autoscaler/enabled", "")
            .with_tag("beta.kubernetes.io/instance-type", "c5.xlarge")];
        assert_eq!(
            build_filters(&filters),
            vec![
                TagQueryFilter::key("beta.kubernetes.io/instance-type"),
                TagQueryFilter::value("c5.xlarge"),
                TagQueryFilter::key("k8s.io/cluster-autoscaler/enabled"),
                TagQueryFilter::key("node-role.kubernetes.io/cluster-autoscaler"),
            ]
        );
    }

    #[test]
    fn test_build_filters_across_multiple_filters() {
        let filters = [
            TagFilter::new().with_tag("a", ""),
            TagFilter::new().with_tag("b", "x"),
        ];
        assert_eq!(
            build_filters(&filters),
            vec![
                TagQueryFilter::key("a"),
                TagQueryFilter::key("b"),
                TagQueryFilter::value("x"),
            ]
        );
        assert!(build_filters(&[]).is_empty());
    }

    #[test]
    fn test_key_alone_does_not_satisfy_value_filter() {
        let filters = [TagFilter::new().with_tag("a", "").with_tag("b", "x")];
        let records = [tag("a", "", "g1"), tag("b", "x", "g1"), tag("a", "", "g2")];
        assert_eq!(extract_group_names(&filters, &records), vec!["g1"]);
    }

    #[test]
    fn test_wrong_value_is_ignored() {
        let filters = [TagFilter::new().with_tag("a", "").with_tag("b", "x")];
        let records = [tag("a", "", "g1"), tag("b", "y", "g1")];
        assert!(extract_group_names(&filters, &records).is_empty());
    }

    #[test]
    fn test_groups_missing_a_tag_are_excluded() {
        let filters = [TagFilter::new()
            .with_tag("node-role.kubernetes.io/cluster-autoscaler", "")
            .with_tag("k8s.io/cluster-autoscaler/enabled", "")
            .with_tag("beta.kubernetes.io/instance-type", "")];
        let records = [
            tag("node-role.kubernetes.io/cluster-autoscaler", "", "asg-0"),
            tag("k8s.io/cluster-autoscaler/enabled", "", "asg-0"),
            tag("k8s.io/cluster-autoscaler/enabled", "", "asg-1"),
            tag("beta.kubernetes.io/instance-type", "", "asg-1"),
            tag("node-role.kubernetes.io/cluster-autoscaler", "", "asg-1"),
            tag("k8s.io/cluster-autoscaler/enabled", "", "asg-2"),
        ];
        assert_eq!(extract_group_names(&filters, &records), vec!["asg-1"]);
    }

    #[test]
    fn test_order_is_first_qualification() {
        let filters = [TagFilter::new().with_tag("a", "").with_tag("b", "")];
        let records = [
            tag("a", "", "g1"),
            tag("a", "", "g2"),
            tag("b", "", "g2"),
            tag("b", "", "g1"),
        ];
        assert_eq!(extract_group_names(&filters, &records), vec!["g2", "g1"]);
    }

    #[test]
    fn test_repeated_records_do_not_duplicate_or_double_count() {
        let filters = [TagFilter::new().with_tag("a", "").with_tag("b", "")];
        let records = [
            tag("a", "", "g1"),
            tag("a", "", "g1"),
            tag("b", "", "g1"),
            tag("b", "", "g1"),
            tag("a", "", "g1"),
        ];
        assert_eq!(extract_group_names(&filters, &records), vec!["g1"]);
    }

    #[test]
    fn test_unrequested_keys_are_ignored() {
        let filters = [TagFilter::new().with_tag("a", "").with_tag("b", "")];
        let records = [tag("a", "", "g1"), tag("c", "", "g1")];
        assert!(extract_group_names(&filters, &records).is_empty());
    }

    #[test]
    fn test_key_requested_twice_counts_once() {
        let filters = [
            TagFilter::new().with_tag("a", "").with_tag("b", ""),
            TagFilter::new().with_tag("a", ""),
        ];
        let records = [tag("a", "", "g1"), tag("b", "", "g1")];
        assert_eq!(extract_group_names(&filters, &records), vec!["g1"]);
    }

    #[test]
    fn test_empty_filters_select_nothing() {
        let records = [tag("a", "", "g1")];
        assert!(extract_group_names(&[], &records).is_empty());
    }
}
