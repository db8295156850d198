use super::image::{Image, ImageName};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Effective RBAC permission level of a deployment's service account, lowest first.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermissionLevel {
    #[default]
    Unset,
    None,
    Default,
    ElevatedInNamespace,
    ElevatedClusterWide,
    ClusterAdmin,
}

impl PermissionLevel {
    /// Level names in ascending order of privilege.
    pub const ORDERED_NAMES: &'static [&'static str] = &[
        "UNSET",
        "NONE",
        "DEFAULT",
        "ELEVATED_IN_NAMESPACE",
        "ELEVATED_CLUSTER_WIDE",
        "CLUSTER_ADMIN",
    ];

    pub fn as_str(&self) -> &'static str {
        Self::ORDERED_NAMES[*self as usize]
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExposureLevel {
    #[default]
    Unset,
    External,
    Node,
    Internal,
    Host,
    Route,
}

impl ExposureLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExposureLevel::Unset => "UNSET",
            ExposureLevel::External => "EXTERNAL",
            ExposureLevel::Node => "NODE",
            ExposureLevel::Internal => "INTERNAL",
            ExposureLevel::Host => "HOST",
            ExposureLevel::Route => "ROUTE",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnvVarSource {
    #[default]
    Unset,
    Raw,
    SecretKey,
    ConfigMapKey,
    Field,
    ResourceField,
    Unknown,
}

impl EnvVarSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvVarSource::Unset => "UNSET",
            EnvVarSource::Raw => "RAW",
            EnvVarSource::SecretKey => "SECRET_KEY",
            EnvVarSource::ConfigMapKey => "CONFIG_MAP_KEY",
            EnvVarSource::Field => "FIELD",
            EnvVarSource::ResourceField => "RESOURCE_FIELD",
            EnvVarSource::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Deployment {
    pub id: String,
    pub name: String,
    pub namespace: String,
    pub service_account: String,
    pub service_account_permission_level: PermissionLevel,
    pub host_network: bool,
    pub host_pid: bool,
    pub host_ipc: bool,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
    pub containers: Vec<Container>,
    pub ports: Vec<PortConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Container {
    pub name: String,
    pub image: ContainerImage,
    pub security_context: SecurityContext,
    pub resources: Resources,
    pub env: Vec<EnvironmentVariable>,
    pub volumes: Vec<Volume>,
}

impl Container {
    pub fn new(name: &str, image: &str) -> Self {
        Self {
            name: name.to_string(),
            image: ContainerImage {
                id: String::new(),
                name: ImageName::parse(image),
            },
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContainerImage {
    pub id: String,
    pub name: ImageName,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SecurityContext {
    pub privileged: bool,
    pub read_only_root_filesystem: bool,
    pub add_capabilities: Vec<String>,
    pub drop_capabilities: Vec<String>,
    pub seccomp_profile_type: Option<String>,
    pub app_armor_profile: String,
}

/// CPU in cores, memory in megabytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Resources {
    pub cpu_cores_request: f64,
    pub cpu_cores_limit: f64,
    pub memory_mb_request: f64,
    pub memory_mb_limit: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EnvironmentVariable {
    pub key: String,
    pub value: String,
    pub source: EnvVarSource,
}

impl EnvironmentVariable {
    pub fn new(source: EnvVarSource, key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
            source,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Volume {
    pub name: String,
    pub source: String,
    pub destination: String,
    pub read_only: bool,
    #[serde(rename = "type")]
    pub volume_type: String,
    pub mount_propagation: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PortConfig {
    pub name: String,
    pub container_port: i32,
    pub protocol: String,
    pub exposure: ExposureLevel,
    pub exposure_infos: Vec<ExposureInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExposureInfo {
    pub level: ExposureLevel,
    pub node_port: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NetworkPoliciesApplied {
    pub has_ingress_policy: bool,
    pub has_egress_policy: bool,
}

/// A deployment together with the images its containers run.
///
/// `images` is either empty or holds one image per container, in container
/// order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EnhancedDeployment {
    pub deployment: Deployment,
    pub images: Vec<Image>,
    pub network_policies_applied: Option<NetworkPoliciesApplied>,
}

impl EnhancedDeployment {
    pub fn new(deployment: Deployment, images: Vec<Image>) -> Self {
        Self {
            deployment,
            images,
            network_policies_applied: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_level_ordering() {
        assert!(PermissionLevel::ClusterAdmin > PermissionLevel::Default);
        assert_eq!(PermissionLevel::ElevatedInNamespace.as_str(), "ELEVATED_IN_NAMESPACE");
        assert_eq!(PermissionLevel::Unset.as_str(), "UNSET");
    }

    #[test]
    fn test_deployment_from_json() {
        let json = r#"{
            "id": "d1",
            "namespace": "prod",
            "servicePermissionLevel": "ignored",
            "serviceAccountPermissionLevel": "CLUSTER_ADMIN",
            "containers": [{
                "name": "web",
                "image": {"name": {"registry": "docker.io", "remote": "library/nginx", "tag": "1.19", "fullName": "docker.io/library/nginx:1.19"}},
                "securityContext": {"privileged": true, "addCapabilities": ["CAP_SYS_ADMIN"]},
                "env": [{"key": "TOKEN", "source": "SECRET_KEY"}],
                "volumes": [{"name": "sock", "type": "HostPath", "readOnly": false}]
            }]
        }"#;
        let deployment: Deployment = serde_json::from_str(json).unwrap();
        assert_eq!(
            deployment.service_account_permission_level,
            PermissionLevel::ClusterAdmin
        );
        let container = &deployment.containers[0];
        assert!(container.security_context.privileged);
        assert_eq!(container.env[0].source, EnvVarSource::SecretKey);
        assert_eq!(container.volumes[0].volume_type, "HostPath");
        assert_eq!(container.image.name.tag, "1.19");
    }
}
