//! Where each label lives in the tree of every object kind.

use super::labels::FieldLabel;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;

pub const CONTAINERS: &str = "containers";
pub const PORTS: &str = "ports";
pub const EXPOSURE_INFOS: &str = "exposureInfos";
pub const VOLUMES: &str = "volumes";
pub const IMAGE: &str = "image";
pub const COMPONENTS: &str = "components";
pub const VULNS: &str = "vulns";
pub const PROCESS: &str = "process";
pub const KUBE_EVENT: &str = "kubeEvent";
pub const NETWORK_FLOW: &str = "networkFlow";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Deployment,
    Image,
    Process,
    KubeEvent,
    NetworkFlow,
    DeploymentWithProcess,
    DeploymentWithKubeEvent,
    DeploymentWithNetworkFlow,
    AuditLogEvent,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectKind::Deployment => "deployment",
            ObjectKind::Image => "image",
            ObjectKind::Process => "process",
            ObjectKind::KubeEvent => "kubernetes event",
            ObjectKind::NetworkFlow => "network flow",
            ObjectKind::DeploymentWithProcess => "deployment with process",
            ObjectKind::DeploymentWithKubeEvent => "deployment with kubernetes event",
            ObjectKind::DeploymentWithNetworkFlow => "deployment with network flow",
            ObjectKind::AuditLogEvent => "audit log event",
        };
        f.write_str(name)
    }
}

/// One step from an object to a child. `each` steps fan out over an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PathStep {
    pub key: &'static str,
    pub each: bool,
}

#[derive(Debug, Clone)]
pub struct ObjectMeta {
    kind: ObjectKind,
    paths: HashMap<FieldLabel, Vec<PathStep>>,
}

impl ObjectMeta {
    fn new(kind: ObjectKind) -> Self {
        Self {
            kind,
            paths: HashMap::new(),
        }
    }

    fn leaves(mut self, labels: &[FieldLabel]) -> Self {
        for label in labels {
            self.paths.insert(*label, Vec::new());
        }
        self
    }

    fn nested(mut self, key: &'static str, each: bool, child: ObjectMeta) -> Self {
        for (label, steps) in child.paths {
            let mut path = Vec::with_capacity(steps.len() + 1);
            path.push(PathStep { key, each });
            path.extend(steps);
            self.paths.insert(label, path);
        }
        self
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// Steps leading to the object holding `label`, or `None` if this kind
    /// has no such leaf.
    pub fn path(&self, label: FieldLabel) -> Option<&[PathStep]> {
        self.paths.get(&label).map(Vec::as_slice)
    }

    pub fn contains(&self, label: FieldLabel) -> bool {
        self.paths.contains_key(&label)
    }

    /// Meta of a registered object kind.
    pub fn for_kind(kind: ObjectKind) -> &'static ObjectMeta {
        match kind {
            ObjectKind::Deployment => &DEPLOYMENT_META,
            ObjectKind::Image => &IMAGE_META,
            ObjectKind::Process => &PROCESS_META,
            ObjectKind::KubeEvent => &KUBE_EVENT_META,
            ObjectKind::NetworkFlow => &NETWORK_FLOW_META,
            ObjectKind::DeploymentWithProcess => &DEPLOYMENT_WITH_PROCESS_META,
            ObjectKind::DeploymentWithKubeEvent => &DEPLOYMENT_WITH_KUBE_EVENT_META,
            ObjectKind::DeploymentWithNetworkFlow => &DEPLOYMENT_WITH_NETWORK_FLOW_META,
            ObjectKind::AuditLogEvent => &AUDIT_LOG_EVENT_META,
        }
    }
}

fn image_meta(kind: ObjectKind) -> ObjectMeta {
    let vulns = ObjectMeta::new(kind).leaves(&[
        FieldLabel::Cve,
        FieldLabel::Cvss,
        FieldLabel::Severity,
        FieldLabel::FixedBy,
    ]);
    let components = ObjectMeta::new(kind)
        .leaves(&[
            FieldLabel::ComponentAndVersion,
            FieldLabel::ComponentName,
            FieldLabel::ComponentVersion,
        ])
        .nested(VULNS, true, vulns);
    ObjectMeta::new(kind)
        .leaves(&[
            FieldLabel::ImageRegistry,
            FieldLabel::ImageRemote,
            FieldLabel::ImageTag,
            FieldLabel::ImageFullName,
            FieldLabel::ImageLabel,
            FieldLabel::ImageUser,
            FieldLabel::ImageOs,
            FieldLabel::ImageCreatedTime,
            FieldLabel::ImageScanTime,
            FieldLabel::ImageScan,
            FieldLabel::DockerfileLine,
        ])
        .nested(COMPONENTS, true, components)
}

fn process_meta(kind: ObjectKind) -> ObjectMeta {
    ObjectMeta::new(kind).leaves(&[
        FieldLabel::ProcessName,
        FieldLabel::ProcessAncestor,
        FieldLabel::ProcessArguments,
        FieldLabel::ProcessUid,
        FieldLabel::NotInProcessBaseline,
    ])
}

fn kube_event_meta(kind: ObjectKind) -> ObjectMeta {
    ObjectMeta::new(kind).leaves(&[
        FieldLabel::KubernetesApiVerb,
        FieldLabel::KubernetesResource,
        FieldLabel::KubernetesResourceName,
        FieldLabel::KubernetesUserName,
        FieldLabel::KubernetesUserGroups,
        FieldLabel::SourceIpAddress,
        FieldLabel::UserAgent,
        FieldLabel::IsImpersonatedUser,
    ])
}

fn network_flow_meta(kind: ObjectKind) -> ObjectMeta {
    ObjectMeta::new(kind).leaves(&[
        FieldLabel::NotInNetworkBaseline,
        FieldLabel::FlowSrcName,
        FieldLabel::FlowDstName,
        FieldLabel::FlowDstPort,
        FieldLabel::FlowProtocol,
    ])
}

fn deployment_meta(kind: ObjectKind, with_process: bool) -> ObjectMeta {
    let volumes = ObjectMeta::new(kind).leaves(&[
        FieldLabel::VolumeName,
        FieldLabel::VolumeSource,
        FieldLabel::VolumeDestination,
        FieldLabel::VolumeType,
        FieldLabel::VolumeReadonly,
        FieldLabel::MountPropagation,
    ]);
    let mut container = ObjectMeta::new(kind)
        .leaves(&[
            FieldLabel::ContainerName,
            FieldLabel::Privileged,
            FieldLabel::ReadOnlyRootFilesystem,
            FieldLabel::AddCapabilities,
            FieldLabel::DropCapabilities,
            FieldLabel::SeccompProfileType,
            FieldLabel::AppArmorProfile,
            FieldLabel::CpuCoresLimit,
            FieldLabel::CpuCoresRequest,
            FieldLabel::MemoryLimit,
            FieldLabel::MemoryRequest,
            FieldLabel::EnvironmentVariable,
        ])
        .nested(VOLUMES, true, volumes)
        .nested(IMAGE, false, image_meta(kind));
    if with_process {
        container = container.nested(PROCESS, false, process_meta(kind));
    }

    let exposure = ObjectMeta::new(kind)
        .leaves(&[FieldLabel::ExposureLevel, FieldLabel::ExposedNodePort]);
    let ports = ObjectMeta::new(kind)
        .leaves(&[FieldLabel::Port, FieldLabel::PortProtocol])
        .nested(EXPOSURE_INFOS, true, exposure);

    ObjectMeta::new(kind)
        .leaves(&[
            FieldLabel::Namespace,
            FieldLabel::DeploymentName,
            FieldLabel::ServiceAccountName,
            FieldLabel::ServiceAccountPermissionLevel,
            FieldLabel::HostNetwork,
            FieldLabel::HostPid,
            FieldLabel::HostIpc,
            FieldLabel::Annotation,
            FieldLabel::Label,
            FieldLabel::HasIngressNetworkPolicy,
            FieldLabel::HasEgressNetworkPolicy,
        ])
        .nested(CONTAINERS, true, container)
        .nested(PORTS, true, ports)
}

static DEPLOYMENT_META: Lazy<ObjectMeta> =
    Lazy::new(|| deployment_meta(ObjectKind::Deployment, false));
static IMAGE_META: Lazy<ObjectMeta> = Lazy::new(|| image_meta(ObjectKind::Image));
static PROCESS_META: Lazy<ObjectMeta> = Lazy::new(|| process_meta(ObjectKind::Process));
static KUBE_EVENT_META: Lazy<ObjectMeta> =
    Lazy::new(|| kube_event_meta(ObjectKind::KubeEvent));
static NETWORK_FLOW_META: Lazy<ObjectMeta> =
    Lazy::new(|| network_flow_meta(ObjectKind::NetworkFlow));
static DEPLOYMENT_WITH_PROCESS_META: Lazy<ObjectMeta> =
    Lazy::new(|| deployment_meta(ObjectKind::DeploymentWithProcess, true));
static DEPLOYMENT_WITH_KUBE_EVENT_META: Lazy<ObjectMeta> = Lazy::new(|| {
    deployment_meta(ObjectKind::DeploymentWithKubeEvent, false).nested(
        KUBE_EVENT,
        false,
        kube_event_meta(ObjectKind::DeploymentWithKubeEvent),
    )
});
static DEPLOYMENT_WITH_NETWORK_FLOW_META: Lazy<ObjectMeta> = Lazy::new(|| {
    deployment_meta(ObjectKind::DeploymentWithNetworkFlow, false).nested(
        NETWORK_FLOW,
        false,
        network_flow_meta(ObjectKind::DeploymentWithNetworkFlow),
    )
});
static AUDIT_LOG_EVENT_META: Lazy<ObjectMeta> =
    Lazy::new(|| kube_event_meta(ObjectKind::AuditLogEvent));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deployment_paths() {
        let meta = ObjectMeta::for_kind(ObjectKind::Deployment);
        assert_eq!(meta.path(FieldLabel::Namespace), Some(&[][..]));
        assert_eq!(
            meta.path(FieldLabel::Cvss),
            Some(
                &[
                    PathStep { key: CONTAINERS, each: true },
                    PathStep { key: IMAGE, each: false },
                    PathStep { key: COMPONENTS, each: true },
                    PathStep { key: VULNS, each: true },
                ][..]
            )
        );
        assert!(!meta.contains(FieldLabel::ProcessName));
        assert!(!meta.contains(FieldLabel::KubernetesApiVerb));
    }

    #[test]
    fn test_composed_kinds() {
        let meta = ObjectMeta::for_kind(ObjectKind::DeploymentWithProcess);
        assert_eq!(meta.kind(), ObjectKind::DeploymentWithProcess);
        assert_eq!(meta.path(FieldLabel::ProcessName).map(|p| p.len()), Some(2));

        let meta = ObjectMeta::for_kind(ObjectKind::DeploymentWithKubeEvent);
        assert_eq!(
            meta.path(FieldLabel::KubernetesResource),
            Some(&[PathStep { key: KUBE_EVENT, each: false }][..])
        );

        let meta = ObjectMeta::for_kind(ObjectKind::Image);
        assert_eq!(meta.path(FieldLabel::ImageTag), Some(&[][..]));
        assert!(!meta.contains(FieldLabel::ContainerName));

        let meta = ObjectMeta::for_kind(ObjectKind::AuditLogEvent);
        assert!(meta.contains(FieldLabel::KubernetesUserName));
        assert!(!meta.contains(FieldLabel::Namespace));
    }
}
