//! The closed vocabulary of leaves an augmented object can carry.

use crate::objects::{PermissionLevel, Severity};
use std::fmt;

/// Shape of the values stored under a label, used to compile query values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafKind {
    Str,
    Number,
    Bool,
    Time,
    /// Tuple leaf with the given number of parts.
    Compound(usize),
    /// Enumerated level compared by rank.
    Ordinal(&'static [&'static str]),
}

macro_rules! field_labels {
    ($($variant:ident => ($key:literal, $kind:expr)),+ $(,)?) => {
        /// A leaf in an augmented object tree.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum FieldLabel {
            $($variant),+
        }

        impl FieldLabel {
            pub const ALL: &'static [FieldLabel] = &[$(FieldLabel::$variant),+];

            /// Key of the leaf in the tree and in evaluation results.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(FieldLabel::$variant => $key),+
                }
            }

            pub fn kind(&self) -> LeafKind {
                match self {
                    $(FieldLabel::$variant => $kind),+
                }
            }
        }
    };
}

field_labels! {
    Namespace => ("Namespace", LeafKind::Str),
    DeploymentName => ("Deployment", LeafKind::Str),
    ServiceAccountName => ("Service Account", LeafKind::Str),
    ServiceAccountPermissionLevel => (
        "Service Account Permission Level",
        LeafKind::Ordinal(PermissionLevel::ORDERED_NAMES)
    ),
    HostNetwork => ("Host Network", LeafKind::Bool),
    HostPid => ("Host PID", LeafKind::Bool),
    HostIpc => ("Host IPC", LeafKind::Bool),
    Annotation => ("Annotation", LeafKind::Compound(2)),
    Label => ("Label", LeafKind::Compound(2)),
    HasIngressNetworkPolicy => ("Has Ingress Network Policy", LeafKind::Bool),
    HasEgressNetworkPolicy => ("Has Egress Network Policy", LeafKind::Bool),

    Port => ("Port", LeafKind::Number),
    PortProtocol => ("Port Protocol", LeafKind::Str),
    ExposureLevel => ("Exposure Level", LeafKind::Str),
    ExposedNodePort => ("Exposed Node Port", LeafKind::Number),

    ContainerName => ("Container Name", LeafKind::Str),
    Privileged => ("Privileged", LeafKind::Bool),
    ReadOnlyRootFilesystem => ("Read Only Root Filesystem", LeafKind::Bool),
    AddCapabilities => ("Add Capabilities", LeafKind::Str),
    DropCapabilities => ("Drop Capabilities", LeafKind::Str),
    SeccompProfileType => ("Seccomp Profile Type", LeafKind::Str),
    AppArmorProfile => ("AppArmor Profile", LeafKind::Str),
    CpuCoresLimit => ("CPU Cores Limit", LeafKind::Number),
    CpuCoresRequest => ("CPU Cores Request", LeafKind::Number),
    MemoryLimit => ("Memory Limit (MB)", LeafKind::Number),
    MemoryRequest => ("Memory Request (MB)", LeafKind::Number),
    EnvironmentVariable => ("Environment Variable", LeafKind::Compound(3)),

    VolumeName => ("Volume Name", LeafKind::Str),
    VolumeSource => ("Volume Source", LeafKind::Str),
    VolumeDestination => ("Volume Destination", LeafKind::Str),
    VolumeType => ("Volume Type", LeafKind::Str),
    VolumeReadonly => ("Volume ReadOnly", LeafKind::Bool),
    MountPropagation => ("Mount Propagation", LeafKind::Str),

    ImageRegistry => ("Image Registry", LeafKind::Str),
    ImageRemote => ("Image Remote", LeafKind::Str),
    ImageTag => ("Image Tag", LeafKind::Str),
    ImageFullName => ("Image", LeafKind::Str),
    ImageLabel => ("Image Label", LeafKind::Compound(2)),
    ImageUser => ("Image User", LeafKind::Str),
    ImageOs => ("Image OS", LeafKind::Str),
    ImageCreatedTime => ("Image Created Time", LeafKind::Time),
    ImageScanTime => ("Image Scan Time", LeafKind::Time),
    ImageScan => ("Image Scan", LeafKind::Bool),
    DockerfileLine => ("Dockerfile Line", LeafKind::Compound(2)),

    ComponentAndVersion => ("Component And Version", LeafKind::Compound(2)),
    ComponentName => ("Component", LeafKind::Str),
    ComponentVersion => ("Component Version", LeafKind::Str),
    Cve => ("CVE", LeafKind::Str),
    Cvss => ("CVSS", LeafKind::Number),
    Severity => ("Severity", LeafKind::Ordinal(Severity::ORDERED_NAMES)),
    FixedBy => ("Fixed By", LeafKind::Str),

    ProcessName => ("Process Name", LeafKind::Str),
    ProcessAncestor => ("Process Ancestor", LeafKind::Str),
    ProcessArguments => ("Process Arguments", LeafKind::Str),
    ProcessUid => ("Process UID", LeafKind::Str),
    NotInProcessBaseline => ("Not In Process Baseline", LeafKind::Bool),

    KubernetesApiVerb => ("Kubernetes API Verb", LeafKind::Str),
    KubernetesResource => ("Kubernetes Resource", LeafKind::Str),
    KubernetesResourceName => ("Kubernetes Resource Name", LeafKind::Str),
    KubernetesUserName => ("Kubernetes User Name", LeafKind::Str),
    KubernetesUserGroups => ("Kubernetes User Groups", LeafKind::Str),
    SourceIpAddress => ("Source IP Address", LeafKind::Str),
    UserAgent => ("User Agent", LeafKind::Str),
    IsImpersonatedUser => ("Is Impersonated User", LeafKind::Bool),

    NotInNetworkBaseline => ("Not In Network Baseline", LeafKind::Bool),
    FlowSrcName => ("Flow Source Name", LeafKind::Str),
    FlowDstName => ("Flow Destination Name", LeafKind::Str),
    FlowDstPort => ("Flow Destination Port", LeafKind::Number),
    FlowProtocol => ("Flow Protocol", LeafKind::Str),
}

impl fmt::Display for FieldLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
