//! Flat criteria carried by policies that predate sections and groups.
//!
//! Every member is optional; the converter in [`crate::convert`] turns the
//! members that are set into policy groups.

use crate::objects::{EnvVarSource, ExposureLevel, PermissionLevel};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Comparator {
    LessThan,
    LessThanOrEquals,
    #[default]
    Equals,
    GreaterThanOrEquals,
    GreaterThan,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NumericalPolicy {
    pub op: Comparator,
    pub value: f32,
}

impl NumericalPolicy {
    pub fn new(op: Comparator, value: f32) -> Self {
        Self { op, value }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageNamePolicy {
    pub registry: String,
    pub remote: String,
    pub tag: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DockerfileLineRule {
    pub instruction: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ComponentPolicy {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KeyValuePolicy {
    pub key: String,
    pub value: String,
    pub env_var_source: EnvVarSource,
}

impl KeyValuePolicy {
    pub fn new(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
            env_var_source: EnvVarSource::Unset,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VolumePolicy {
    pub name: String,
    pub source: String,
    pub destination: String,
    pub read_only: Option<bool>,
    #[serde(rename = "type")]
    pub volume_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PortPolicy {
    pub port: i32,
    pub protocol: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProcessPolicy {
    pub name: String,
    pub ancestor: String,
    pub args: String,
    pub uid: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HostMountPolicy {
    pub read_only: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PermissionPolicy {
    pub permission_level: PermissionLevel,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PortExposurePolicy {
    pub exposure_levels: Vec<ExposureLevel>,
}

/// Resource constraints. Unlike every other legacy criterion these are OR'd.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResourcePolicy {
    pub cpu_resource_request: Option<NumericalPolicy>,
    pub cpu_resource_limit: Option<NumericalPolicy>,
    pub memory_resource_request: Option<NumericalPolicy>,
    pub memory_resource_limit: Option<NumericalPolicy>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PolicyFields {
    pub image_name: Option<ImageNamePolicy>,
    pub image_age_days: Option<i64>,
    pub line_rule: Option<DockerfileLineRule>,
    pub cvss: Option<NumericalPolicy>,
    pub cve: String,
    pub component: Option<ComponentPolicy>,
    pub scan_age_days: Option<i64>,
    pub no_scan_exists: Option<bool>,
    pub env: Option<KeyValuePolicy>,
    pub volume_policy: Option<VolumePolicy>,
    pub port_policy: Option<PortPolicy>,
    pub required_label: Option<KeyValuePolicy>,
    pub required_annotation: Option<KeyValuePolicy>,
    pub disallowed_annotation: Option<KeyValuePolicy>,
    pub required_image_label: Option<KeyValuePolicy>,
    pub disallowed_image_label: Option<KeyValuePolicy>,
    pub privileged: Option<bool>,
    pub process_policy: Option<ProcessPolicy>,
    pub host_mount_policy: Option<HostMountPolicy>,
    pub whitelist_enabled: Option<bool>,
    pub fixed_by: String,
    pub read_only_root_fs: Option<bool>,
    pub drop_capabilities: Option<Vec<String>>,
    pub add_capabilities: Option<Vec<String>>,
    pub permission_policy: Option<PermissionPolicy>,
    pub port_exposure_policy: Option<PortExposurePolicy>,
    pub container_resource_policy: Option<ResourcePolicy>,
}
