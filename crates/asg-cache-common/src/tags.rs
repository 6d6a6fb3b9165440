//! Tag filters for group auto-discovery
//!
//! Groups can be discovered by tags instead of being named explicitly.
//! A filter maps tag keys to values; an empty value matches any value.
//!
//! ## Auto-discovery spec
//!
//! | Spec | Meaning |
//! |------|---------|
//! | `asg:tag=k8s.io/cluster-autoscaler/enabled` | key present, any value |
//! | `asg:tag=team=infra` | key `team` with value `infra` |
//! | `asg:tag=a,b=x` | both conditions must hold |

use crate::group_spec::SpecError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map;

/// Tag key conventionally used to opt a group into autoscaling
pub const TAG_AUTOSCALER_ENABLED: &str = "k8s.io/cluster-autoscaler/enabled";

const AUTO_DISCOVERY_PREFIX: &str = "asg:";
const AUTO_DISCOVERY_KIND: &str = "tag";

/// Tag key to value mapping. An empty value means "key present, any value".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagFilter(BTreeMap<String, String>);

impl TagFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tag condition, replacing any previous value for the key
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(key, value)` pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TagFilter {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl IntoIterator for TagFilter {
    type Item = (String, String);
    type IntoIter = btree_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Parse an `asg:tag=<key>[=<value>][,<key>[=<value>]...]` spec.
pub fn parse_auto_discovery_spec(spec: &str) -> Result<TagFilter, SpecError> {
    let invalid = |reason| SpecError::InvalidAutoDiscovery {
        spec: spec.to_string(),
        reason,
    };

    let body = spec
        .strip_prefix(AUTO_DISCOVERY_PREFIX)
        .ok_or_else(|| invalid("expected 'asg:' prefix"))?;
    let (kind, tags) = body
        .split_once('=')
        .ok_or_else(|| invalid("expected 'tag=' selector"))?;
    if kind != AUTO_DISCOVERY_KIND {
        return Err(invalid("only 'tag' selectors are supported"));
    }

    let mut filter = TagFilter::new();
    for tag in tags.split(',') {
        let (key, value) = tag.split_once('=').unwrap_or((tag, ""));
        if key.is_empty() {
            return Err(invalid("tag key cannot be empty"));
        }
        filter.insert(key, value);
    }

    Ok(filter)
}
