//! Group specification parsing
//!
//! Explicitly configured groups are passed as `<minSize>:<maxSize>:<name>`,
//! e.g. `1:10:workers-us-east-1a`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Group specification errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    /// Spec does not have exactly three colon-separated fields
    #[error("group spec '{0}' must be <minSize>:<maxSize>:<name>")]
    MalformedSpec(String),

    /// minSize or maxSize is not an integer
    #[error("invalid {field} '{value}' in group spec")]
    InvalidSize { field: &'static str, value: String },

    /// Name field is empty
    #[error("group spec '{0}' has an empty name")]
    MissingName(String),

    /// Auto-discovery spec could not be parsed
    #[error("invalid auto-discovery spec '{spec}': {reason}")]
    InvalidAutoDiscovery { spec: String, reason: &'static str },
}

/// A scalable group with its size bounds.
///
/// `min_size > max_size` is not rejected here; bounds are checked, if at all,
/// by whoever acts on them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupDescriptor {
    pub name: String,
    pub min_size: i32,
    pub max_size: i32,
}

impl GroupDescriptor {
    pub fn new(name: impl Into<String>, min_size: i32, max_size: i32) -> Self {
        Self {
            name: name.into(),
            min_size,
            max_size,
        }
    }
}

impl fmt::Display for GroupDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.min_size, self.max_size, self.name)
    }
}

impl FromStr for GroupDescriptor {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_group_spec(s)
    }
}

/// Parse a `<minSize>:<maxSize>:<name>` spec.
pub fn parse_group_spec(spec: &str) -> Result<GroupDescriptor, SpecError> {
    let fields: Vec<&str> = spec.split(':').collect();
    let [min, max, name] = fields.as_slice() else {
        return Err(SpecError::MalformedSpec(spec.to_string()));
    };

    let min_size = parse_size("minSize", min)?;
    let max_size = parse_size("maxSize", max)?;

    if name.is_empty() {
        return Err(SpecError::MissingName(spec.to_string()));
    }

    Ok(GroupDescriptor::new(*name, min_size, max_size))
}

fn parse_size(field: &'static str, value: &str) -> Result<i32, SpecError> {
    value.parse().map_err(|_| SpecError::InvalidSize {
        field,
        value: value.to_string(),
    })
}
