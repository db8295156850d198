use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A process observed inside a running container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProcessIndicator {
    pub id: String,
    pub deployment_id: String,
    pub container_name: String,
    pub pod_id: String,
    pub signal: ProcessSignal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProcessSignal {
    pub name: String,
    pub args: String,
    pub exec_file_path: String,
    pub uid: u32,
    /// Executable paths of the ancestors, closest parent first.
    pub lineage: Vec<String>,
    pub time: Option<DateTime<Utc>>,
}

impl ProcessIndicator {
    pub fn new(id: &str, container_name: &str, exec_file_path: &str, args: &str) -> Self {
        let name = exec_file_path
            .rsplit('/')
            .next()
            .unwrap_or(exec_file_path)
            .to_string();
        Self {
            id: id.to_string(),
            container_name: container_name.to_string(),
            signal: ProcessSignal {
                name,
                args: args.to_string(),
                exec_file_path: exec_file_path.to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KubeResource {
    #[default]
    UnknownResource,
    PodsExec,
    PodsPortforward,
    Secrets,
    Configmaps,
    ClusterRoles,
    ClusterRoleBindings,
    NetworkPolicies,
    SecurityContextConstraints,
    EgressFirewalls,
}

impl KubeResource {
    pub fn as_str(&self) -> &'static str {
        match self {
            KubeResource::UnknownResource => "UNKNOWN_RESOURCE",
            KubeResource::PodsExec => "PODS_EXEC",
            KubeResource::PodsPortforward => "PODS_PORTFORWARD",
            KubeResource::Secrets => "SECRETS",
            KubeResource::Configmaps => "CONFIGMAPS",
            KubeResource::ClusterRoles => "CLUSTER_ROLES",
            KubeResource::ClusterRoleBindings => "CLUSTER_ROLE_BINDINGS",
            KubeResource::NetworkPolicies => "NETWORK_POLICIES",
            KubeResource::SecurityContextConstraints => "SECURITY_CONTEXT_CONSTRAINTS",
            KubeResource::EgressFirewalls => "EGRESS_FIREWALLS",
        }
    }

    /// Human readable name used in violation messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            KubeResource::UnknownResource => "resource",
            KubeResource::PodsExec => "pod exec",
            KubeResource::PodsPortforward => "pod port forward",
            KubeResource::Secrets => "secret",
            KubeResource::Configmaps => "config map",
            KubeResource::ClusterRoles => "cluster role",
            KubeResource::ClusterRoleBindings => "cluster role binding",
            KubeResource::NetworkPolicies => "network policy",
            KubeResource::SecurityContextConstraints => "security context constraint",
            KubeResource::EgressFirewalls => "egress firewall",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiVerb {
    #[default]
    Unknown,
    Create,
    Delete,
    Get,
    Patch,
    Update,
}

impl ApiVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiVerb::Unknown => "UNKNOWN",
            ApiVerb::Create => "CREATE",
            ApiVerb::Delete => "DELETE",
            ApiVerb::Get => "GET",
            ApiVerb::Patch => "PATCH",
            ApiVerb::Update => "UPDATE",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KubeObject {
    pub name: String,
    pub resource: KubeResource,
    pub cluster_id: String,
    pub namespace: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KubeUser {
    pub username: String,
    pub groups: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PodExecArgs {
    pub container: String,
    pub commands: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PodPortForwardArgs {
    pub ports: Vec<i32>,
}

/// A request observed by the Kubernetes API server, either through the
/// admission controller or the audit log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KubernetesEvent {
    pub id: String,
    pub object: KubeObject,
    pub api_verb: ApiVerb,
    pub user: KubeUser,
    pub impersonated_user: Option<KubeUser>,
    pub source_ips: Vec<String>,
    pub user_agent: String,
    pub pod_exec_args: Option<PodExecArgs>,
    pub pod_port_forward_args: Option<PodPortForwardArgs>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum L4Protocol {
    #[default]
    Unknown,
    Tcp,
    Udp,
    Icmp,
}

impl L4Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            L4Protocol::Unknown => "UNKNOWN",
            L4Protocol::Tcp => "TCP",
            L4Protocol::Udp => "UDP",
            L4Protocol::Icmp => "ICMP",
        }
    }
}

/// A network flow involving a deployment, with its baseline status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NetworkFlowDetails {
    pub src_entity_name: String,
    pub src_entity_type: String,
    pub dst_entity_name: String,
    pub dst_entity_type: String,
    pub dst_port: u32,
    pub protocol: L4Protocol,
    pub not_in_network_baseline: bool,
    pub last_seen: Option<DateTime<Utc>>,
}

impl NetworkFlowDetails {
    /// Identity of the flow, used to key cached trees.
    pub fn flow_key(&self) -> String {
        format!(
            "{}/{}->{}/{}:{}/{}:{}",
            self.src_entity_type,
            self.src_entity_name,
            self.dst_entity_type,
            self.dst_entity_name,
            self.dst_port,
            self.protocol.as_str(),
            self.not_in_network_baseline
        )
    }
}
