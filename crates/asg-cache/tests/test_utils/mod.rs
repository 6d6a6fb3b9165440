//! Shared test utilities for integration tests
//!
//! [`FakeAutoScaling`] serves groups, launch configurations and tags from
//! memory, paginates like the real API, records every request and can be
//! scripted to fail specific calls.

#![allow(dead_code)]

use asg_cache::aws::{
    AutoScalingApi, GroupRecord, LaunchConfigRecord, Page, ProviderError, TagQueryFilter,
    TagRecord,
};
use asg_cache::metrics::QueryStats;
use asg_cache::metrics::operations::{
    DESCRIBE_AUTO_SCALING_GROUPS, DESCRIBE_LAUNCH_CONFIGURATIONS, DESCRIBE_TAGS,
};
use asg_cache::Provider;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// One request received by the fake
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Groups {
        names: Vec<String>,
        max_records: i32,
        next_token: Option<String>,
    },
    LaunchConfigs {
        names: Vec<String>,
        max_records: i32,
    },
    Tags {
        filters: Vec<TagQueryFilter>,
        max_records: i32,
        next_token: Option<String>,
    },
}

#[derive(Default)]
struct State {
    groups: Vec<GroupRecord>,
    launch_configs: HashMap<String, String>,
    tags: Vec<TagRecord>,
    calls: Vec<Call>,
    attempts: HashMap<&'static str, usize>,
    // (operation, zero-based attempt) -> error
    failures: HashMap<(&'static str, usize), ProviderError>,
}

/// In-memory Auto Scaling API
pub struct FakeAutoScaling {
    state: Mutex<State>,
    page_size: usize,
}

impl Default for FakeAutoScaling {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeAutoScaling {
    pub fn new() -> Self {
        Self::with_page_size(usize::MAX)
    }

    /// Split group and tag responses into pages of at most `page_size` items
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            state: Mutex::new(State::default()),
            page_size: page_size.max(1),
        }
    }

    pub fn add_group(&self, group: GroupRecord) {
        self.state.lock().unwrap().groups.push(group);
    }

    pub fn add_launch_config(&self, name: &str, instance_type: &str) {
        self.state
            .lock()
            .unwrap()
            .launch_configs
            .insert(name.to_string(), instance_type.to_string());
    }

    pub fn remove_launch_config(&self, name: &str) {
        self.state.lock().unwrap().launch_configs.remove(name);
    }

    pub fn add_tag(&self, tag: TagRecord) {
        self.state.lock().unwrap().tags.push(tag);
    }

    /// Fail the `attempt`-th call (zero-based) of `operation` with `error`
    pub fn fail_call(&self, operation: &'static str, attempt: usize, error: ProviderError) {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert((operation, attempt), error);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn group_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Groups { .. }))
            .collect()
    }

    pub fn launch_config_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::LaunchConfigs { .. }))
            .collect()
    }

    pub fn tag_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Tags { .. }))
            .collect()
    }

    fn record(&self, operation: &'static str, call: Call) -> Result<(), ProviderError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        let attempt = state.attempts.entry(operation).or_default();
        let current = *attempt;
        *attempt += 1;
        match state.failures.remove(&(operation, current)) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn paginate<T: Clone>(&self, items: &[T], next_token: Option<&str>) -> Page<T> {
        let start: usize = next_token.and_then(|t| t.parse().ok()).unwrap_or(0);
        let end = start.saturating_add(self.page_size).min(items.len());
        Page {
            items: items[start.min(end)..end].to_vec(),
            next_token: (end < items.len()).then(|| end.to_string()),
        }
    }

    fn groups_page(
        &self,
        names: &[String],
        max_records: i32,
        next_token: Option<String>,
    ) -> Result<Page<GroupRecord>, ProviderError> {
        self.record(
            DESCRIBE_AUTO_SCALING_GROUPS,
            Call::Groups {
                names: names.to_vec(),
                max_records,
                next_token: next_token.clone(),
            },
        )?;
        let state = self.state.lock().unwrap();
        let matching: Vec<GroupRecord> = names
            .iter()
            .filter_map(|n| state.groups.iter().find(|g| &g.name == n).cloned())
            .collect();
        Ok(self.paginate(&matching, next_token.as_deref()))
    }

    fn launch_configs(
        &self,
        names: &[String],
        max_records: i32,
    ) -> Result<Vec<LaunchConfigRecord>, ProviderError> {
        self.record(
            DESCRIBE_LAUNCH_CONFIGURATIONS,
            Call::LaunchConfigs {
                names: names.to_vec(),
                max_records,
            },
        )?;
        let state = self.state.lock().unwrap();
        Ok(names
            .iter()
            .filter_map(|n| {
                state.launch_configs.get(n).map(|t| LaunchConfigRecord {
                    name: n.clone(),
                    instance_type: t.clone(),
                })
            })
            .collect())
    }

    fn tags_page(
        &self,
        filters: &[TagQueryFilter],
        max_records: i32,
        next_token: Option<String>,
    ) -> Result<Page<TagRecord>, ProviderError> {
        self.record(
            DESCRIBE_TAGS,
            Call::Tags {
                filters: filters.to_vec(),
                max_records,
                next_token: next_token.clone(),
            },
        )?;
        // Filters on different names are ORed, like the real API
        let state = self.state.lock().unwrap();
        let matching: Vec<TagRecord> = state
            .tags
            .iter()
            .filter(|t| {
                filters.iter().any(|f| match f.name.as_str() {
                    "key" => f.values.contains(&t.key),
                    "value" => f.values.contains(&t.value),
                    _ => false,
                })
            })
            .cloned()
            .collect();
        Ok(self.paginate(&matching, next_token.as_deref()))
    }
}

impl AutoScalingApi for FakeAutoScaling {
    async fn describe_groups_page(
        &self,
        names: &[String],
        max_records: i32,
        next_token: Option<String>,
    ) -> Result<Page<GroupRecord>, ProviderError> {
        self.groups_page(names, max_records, next_token)
    }

    async fn describe_launch_configurations(
        &self,
        names: &[String],
        max_records: i32,
    ) -> Result<Vec<LaunchConfigRecord>, ProviderError> {
        self.launch_configs(names, max_records)
    }

    async fn describe_tags_page(
        &self,
        filters: &[TagQueryFilter],
        max_records: i32,
        next_token: Option<String>,
    ) -> Result<Page<TagRecord>, ProviderError> {
        self.tags_page(filters, max_records, next_token)
    }
}

/// Provider over a shared fake, reporting to fresh stats
pub fn provider(fake: &Arc<FakeAutoScaling>) -> (Provider<FakeAutoScaling>, Arc<QueryStats>) {
    let stats = Arc::new(QueryStats::new());
    let provider = Provider::from_arc(Arc::clone(fake)).with_observer(stats.clone());
    (provider, stats)
}

pub fn group(name: &str, min_size: i32, max_size: i32, launch_configuration: Option<&str>) -> GroupRecord {
    GroupRecord {
        name: name.to_string(),
        min_size,
        max_size,
        launch_configuration_name: launch_configuration.map(str::to_string),
        tags: Vec::new(),
    }
}

pub fn tag(key: &str, value: &str, group: &str) -> TagRecord {
    TagRecord {
        key: key.to_string(),
        value: value.to_string(),
        resource_id: group.to_string(),
        resource_type: "auto-scaling-group".to_string(),
    }
}

pub fn throttled() -> ProviderError {
    ProviderError::Throttled {
        code: "Throttling".to_string(),
        message: "Rate exceeded".to_string(),
    }
}

pub fn access_denied() -> ProviderError {
    ProviderError::Sdk {
        code: Some("AccessDenied".to_string()),
        message: "User is not authorized".to_string(),
    }
}

/// Names `prefix-000`, `prefix-001`, ... in sorted order
pub fn names(prefix: &str, count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{prefix}-{i:03}")).collect()
}
