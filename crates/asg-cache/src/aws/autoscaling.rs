//! Auto Scaling API surface used for group resolution
//!
//! [`AutoScalingApi`] is the seam between the resolution logic and the
//! provider, so fetching, discovery and caching can be tested without AWS.

use crate::aws::context::AwsContext;
use crate::aws::error::{ProviderError, classify_sdk_error};
use asg_cache_common::GroupDescriptor;
use aws_sdk_autoscaling::Client;
use aws_sdk_autoscaling::types::{AutoScalingGroup, Filter, LaunchConfiguration, TagDescription};
use serde::Serialize;
use std::future::Future;

/// Group as returned by DescribeAutoScalingGroups
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupRecord {
    pub name: String,
    pub min_size: i32,
    pub max_size: i32,
    /// Absent for groups launched from launch templates
    pub launch_configuration_name: Option<String>,
    pub tags: Vec<(String, String)>,
}

impl GroupRecord {
    pub fn descriptor(&self) -> GroupDescriptor {
        GroupDescriptor::new(self.name.clone(), self.min_size, self.max_size)
    }
}

/// Launch configuration name and the instance type it launches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchConfigRecord {
    pub name: String,
    pub instance_type: String,
}

/// Tag attached to a provider resource, as returned by DescribeTags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRecord {
    pub key: String,
    pub value: String,
    pub resource_id: String,
    pub resource_type: String,
}

/// DescribeTags filter term. `name` is either `key` or `value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagQueryFilter {
    pub name: String,
    pub values: Vec<String>,
}

impl TagQueryFilter {
    pub fn key(key: impl Into<String>) -> Self {
        Self {
            name: "key".to_string(),
            values: vec![key.into()],
        }
    }

    pub fn value(value: impl Into<String>) -> Self {
        Self {
            name: "value".to_string(),
            values: vec![value.into()],
        }
    }
}

/// One page of a paginated response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    /// A final page, with nothing after it
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_token: None,
        }
    }
}

/// Auto Scaling read operations that can be faked in tests.
pub trait AutoScalingApi: Send + Sync {
    /// Fetch one page of DescribeAutoScalingGroups for the given names
    fn describe_groups_page(
        &self,
        names: &[String],
        max_records: i32,
        next_token: Option<String>,
    ) -> impl Future<Output = Result<Page<GroupRecord>, ProviderError>> + Send;

    /// DescribeLaunchConfigurations for the given names
    fn describe_launch_configurations(
        &self,
        names: &[String],
        max_records: i32,
    ) -> impl Future<Output = Result<Vec<LaunchConfigRecord>, ProviderError>> + Send;

    /// Fetch one page of DescribeTags for the given filters
    fn describe_tags_page(
        &self,
        filters: &[TagQueryFilter],
        max_records: i32,
        next_token: Option<String>,
    ) -> impl Future<Output = Result<Page<TagRecord>, ProviderError>> + Send;
}

/// Auto Scaling client backed by the AWS SDK
#[derive(Clone)]
pub struct AutoScalingClient {
    client: Client,
}

impl AutoScalingClient {
    /// Create a new client (loads AWS config from environment)
    pub async fn new(region: &str) -> Self {
        let ctx = AwsContext::new(region).await;
        Self::from_context(&ctx)
    }

    /// Create a client from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.autoscaling_client(),
        }
    }
}

impl AutoScalingApi for AutoScalingClient {
    async fn describe_groups_page(
        &self,
        names: &[String],
        max_records: i32,
        next_token: Option<String>,
    ) -> Result<Page<GroupRecord>, ProviderError> {
        let output = self
            .client
            .describe_auto_scaling_groups()
            .set_auto_scaling_group_names(Some(names.to_vec()))
            .max_records(max_records)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e))?;

        Ok(Page {
            items: output.auto_scaling_groups().iter().map(group_record).collect(),
            next_token: output.next_token().map(str::to_string),
        })
    }

    async fn describe_launch_configurations(
        &self,
        names: &[String],
        max_records: i32,
    ) -> Result<Vec<LaunchConfigRecord>, ProviderError> {
        let output = self
            .client
            .describe_launch_configurations()
            .set_launch_configuration_names(Some(names.to_vec()))
            .max_records(max_records)
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e))?;

        Ok(output
            .launch_configurations()
            .iter()
            .filter_map(launch_config_record)
            .collect())
    }

    async fn describe_tags_page(
        &self,
        filters: &[TagQueryFilter],
        max_records: i32,
        next_token: Option<String>,
    ) -> Result<Page<TagRecord>, ProviderError> {
        let filters = filters
            .iter()
            .map(|f| {
                Filter::builder()
                    .name(&f.name)
                    .set_values(Some(f.values.clone()))
                    .build()
            })
            .collect();

        let output = self
            .client
            .describe_tags()
            .set_filters(Some(filters))
            .max_records(max_records)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e))?;

        Ok(Page {
            items: output.tags().iter().map(tag_record).collect(),
            next_token: output.next_token().map(str::to_string),
        })
    }
}

// SDK accessors return `T` for required members and `Option<T>` otherwise;
// these accept either shape.

fn text<'a>(value: impl Into<Option<&'a str>>) -> Option<String> {
    value.into().map(str::to_string)
}

fn size(value: impl Into<Option<i32>>) -> i32 {
    value.into().unwrap_or_default()
}

fn group_record(group: &AutoScalingGroup) -> GroupRecord {
    GroupRecord {
        name: text(group.auto_scaling_group_name()).unwrap_or_default(),
        min_size: size(group.min_size()),
        max_size: size(group.max_size()),
        launch_configuration_name: text(group.launch_configuration_name())
            .filter(|name| !name.is_empty()),
        tags: group
            .tags()
            .iter()
            .map(|t| {
                (
                    text(t.key()).unwrap_or_default(),
                    text(t.value()).unwrap_or_default(),
                )
            })
            .collect(),
    }
}

fn launch_config_record(lc: &LaunchConfiguration) -> Option<LaunchConfigRecord> {
    Some(LaunchConfigRecord {
        name: text(lc.launch_configuration_name())?,
        instance_type: text(lc.instance_type())?,
    })
}

fn tag_record(tag: &TagDescription) -> TagRecord {
    TagRecord {
        key: text(tag.key()).unwrap_or_default(),
        value: text(tag.value()).unwrap_or_default(),
        resource_id: text(tag.resource_id()).unwrap_or_default(),
        resource_type: text(tag.resource_type()).unwrap_or_default(),
    }
}
