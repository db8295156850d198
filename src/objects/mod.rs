//! Domain objects matched against policies.
//!
//! These carry only what policy evaluation reads. They are serde types so
//! collectors can hand them over as JSON.

pub mod deployment;
pub mod image;
pub mod runtime;

pub use deployment::{
    Container, ContainerImage, Deployment, EnhancedDeployment, EnvVarSource, EnvironmentVariable,
    ExposureInfo, ExposureLevel, NetworkPoliciesApplied, PermissionLevel, PortConfig, Resources,
    SecurityContext, Volume,
};
pub use image::{
    EmbeddedComponent, Image, ImageLayer, ImageMetadata, ImageName, ImageScan, Severity,
    Vulnerability,
};
pub use runtime::{
    ApiVerb, KubeObject, KubeResource, KubeUser, KubernetesEvent, L4Protocol, NetworkFlowDetails,
    PodExecArgs, PodPortForwardArgs, ProcessIndicator, ProcessSignal,
};
