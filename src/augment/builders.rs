//! Per-kind tree builders.
//!
//! Every builder emits the shape described by the matching
//! [`ObjectMeta`](super::meta::ObjectMeta). Runtime objects are built on their
//! own first and then attached to a deployment tree, so a cached deployment
//! tree can be reused across many processes, events and flows.

use super::labels::FieldLabel;
use super::meta::{
    ObjectKind, COMPONENTS, CONTAINERS, EXPOSURE_INFOS, IMAGE, KUBE_EVENT, NETWORK_FLOW, PORTS,
    PROCESS, VOLUMES, VULNS,
};
use super::tree::{AugmentedObj, Node, ObjectBuilder, Value};
use crate::error::{PolicyError, Result};
use crate::objects::{
    Container, EnhancedDeployment, Image, ImageName, KubernetesEvent, NetworkFlowDetails,
    PortConfig, ProcessIndicator,
};
use std::collections::BTreeMap;
use std::sync::Arc;

pub fn build_deployment(enhanced: &EnhancedDeployment) -> Result<AugmentedObj> {
    let deployment = &enhanced.deployment;
    if !enhanced.images.is_empty() && enhanced.images.len() != deployment.containers.len() {
        return Err(PolicyError::Augmentation(format!(
            "deployment {:?} has {} containers but {} images",
            deployment.id,
            deployment.containers.len(),
            enhanced.images.len()
        )));
    }

    let containers = deployment
        .containers
        .iter()
        .enumerate()
        .map(|(i, container)| container_node(container, enhanced.images.get(i)))
        .collect();
    let ports = deployment.ports.iter().map(port_node).collect();
    let (ingress, egress) = match &enhanced.network_policies_applied {
        Some(applied) => (
            Value::Bool(applied.has_ingress_policy),
            Value::Bool(applied.has_egress_policy),
        ),
        None => (Value::Null, Value::Null),
    };

    let root = ObjectBuilder::new()
        .string(FieldLabel::Namespace, &deployment.namespace)
        .string(FieldLabel::DeploymentName, &deployment.name)
        .optional_string(FieldLabel::ServiceAccountName, &deployment.service_account)
        .string(
            FieldLabel::ServiceAccountPermissionLevel,
            deployment.service_account_permission_level.as_str(),
        )
        .boolean(FieldLabel::HostNetwork, deployment.host_network)
        .boolean(FieldLabel::HostPid, deployment.host_pid)
        .boolean(FieldLabel::HostIpc, deployment.host_ipc)
        .set(FieldLabel::Annotation, key_values(&deployment.annotations))
        .set(FieldLabel::Label, key_values(&deployment.labels))
        .scalar(FieldLabel::HasIngressNetworkPolicy, ingress)
        .scalar(FieldLabel::HasEgressNetworkPolicy, egress)
        .array(CONTAINERS, containers)
        .array(PORTS, ports)
        .build();
    Ok(AugmentedObj::new(ObjectKind::Deployment, root))
}

fn container_node(container: &Container, image: Option<&Image>) -> Node {
    let security = &container.security_context;
    let resources = &container.resources;
    let env = container
        .env
        .iter()
        .map(|var| Value::compound([var.source.as_str(), var.key.as_str(), var.value.as_str()]))
        .collect();
    let volumes = container
        .volumes
        .iter()
        .map(|volume| {
            ObjectBuilder::new()
                .string(FieldLabel::VolumeName, &volume.name)
                .optional_string(FieldLabel::VolumeSource, &volume.source)
                .optional_string(FieldLabel::VolumeDestination, &volume.destination)
                .optional_string(FieldLabel::VolumeType, &volume.volume_type)
                .boolean(FieldLabel::VolumeReadonly, volume.read_only)
                .scalar(
                    FieldLabel::MountPropagation,
                    volume.mount_propagation.as_deref().map_or(Value::Null, Value::str),
                )
                .build()
        })
        .collect();

    ObjectBuilder::new()
        .string(FieldLabel::ContainerName, &container.name)
        .boolean(FieldLabel::Privileged, security.privileged)
        .boolean(
            FieldLabel::ReadOnlyRootFilesystem,
            security.read_only_root_filesystem,
        )
        .set(
            FieldLabel::AddCapabilities,
            capabilities(&security.add_capabilities),
        )
        .set(
            FieldLabel::DropCapabilities,
            capabilities(&security.drop_capabilities),
        )
        .scalar(
            FieldLabel::SeccompProfileType,
            security
                .seccomp_profile_type
                .as_deref()
                .map_or(Value::Null, Value::str),
        )
        .optional_string(FieldLabel::AppArmorProfile, &security.app_armor_profile)
        .number(FieldLabel::CpuCoresLimit, resources.cpu_cores_limit)
        .number(FieldLabel::CpuCoresRequest, resources.cpu_cores_request)
        .number(FieldLabel::MemoryLimit, resources.memory_mb_limit)
        .number(FieldLabel::MemoryRequest, resources.memory_mb_request)
        .set(FieldLabel::EnvironmentVariable, env)
        .array(VOLUMES, volumes)
        .child(IMAGE, image_node(&container.image.name, image))
        .build()
}

fn port_node(port: &PortConfig) -> Node {
    let exposures = if port.exposure_infos.is_empty() {
        vec![ObjectBuilder::new()
            .string(FieldLabel::ExposureLevel, port.exposure.as_str())
            .scalar(FieldLabel::ExposedNodePort, Value::Null)
            .build()]
    } else {
        port.exposure_infos
            .iter()
            .map(|info| {
                let node_port = if info.node_port > 0 {
                    Value::Int(i64::from(info.node_port))
                } else {
                    Value::Null
                };
                ObjectBuilder::new()
                    .string(FieldLabel::ExposureLevel, info.level.as_str())
                    .scalar(FieldLabel::ExposedNodePort, node_port)
                    .build()
            })
            .collect()
    };

    ObjectBuilder::new()
        .integer(FieldLabel::Port, i64::from(port.container_port))
        .optional_string(FieldLabel::PortProtocol, &port.protocol)
        .array(EXPOSURE_INFOS, exposures)
        .build()
}

pub fn build_image(image: &Image) -> AugmentedObj {
    AugmentedObj::new(ObjectKind::Image, image_node(&image.name, Some(image)))
}

fn image_node(container_image: &ImageName, image: Option<&Image>) -> Node {
    let name = image.map_or(container_image, |image| &image.name);
    let metadata = image.and_then(|image| image.metadata.as_ref());
    let scan = image.and_then(|image| image.scan.as_ref());

    let mut builder = ObjectBuilder::new()
        .optional_string(FieldLabel::ImageRegistry, &name.registry)
        .optional_string(FieldLabel::ImageRemote, &name.remote)
        .optional_string(FieldLabel::ImageTag, &name.tag)
        .optional_string(FieldLabel::ImageFullName, &name.full_name);

    builder = match metadata {
        Some(metadata) => builder
            .set(FieldLabel::ImageLabel, key_values(&metadata.labels))
            .optional_string(FieldLabel::ImageUser, &metadata.user)
            .time(FieldLabel::ImageCreatedTime, metadata.created)
            .set(
                FieldLabel::DockerfileLine,
                metadata
                    .layers
                    .iter()
                    .map(|layer| {
                        Value::compound([layer.instruction.as_str(), layer.value.as_str()])
                    })
                    .collect(),
            ),
        None => builder
            .set(FieldLabel::ImageLabel, Vec::new())
            .scalar(FieldLabel::ImageUser, Value::Null)
            .scalar(FieldLabel::ImageCreatedTime, Value::Null)
            .set(FieldLabel::DockerfileLine, Vec::new()),
    };

    match scan {
        Some(scan) => {
            let components = scan
                .components
                .iter()
                .map(|component| {
                    let vulns = component
                        .vulns
                        .iter()
                        .map(|vuln| {
                            ObjectBuilder::new()
                                .string(FieldLabel::Cve, &vuln.cve)
                                .number(FieldLabel::Cvss, f32_to_f64(vuln.cvss))
                                .string(FieldLabel::Severity, vuln.severity.as_str())
                                .optional_string(FieldLabel::FixedBy, &vuln.fixed_by)
                                .build()
                        })
                        .collect();
                    ObjectBuilder::new()
                        .scalar(
                            FieldLabel::ComponentAndVersion,
                            Value::compound([component.name.as_str(), component.version.as_str()]),
                        )
                        .string(FieldLabel::ComponentName, &component.name)
                        .optional_string(FieldLabel::ComponentVersion, &component.version)
                        .array(VULNS, vulns)
                        .build()
                })
                .collect();
            builder
                .boolean(FieldLabel::ImageScan, true)
                .time(FieldLabel::ImageScanTime, scan.scan_time)
                .optional_string(FieldLabel::ImageOs, &scan.operating_system)
                .array(COMPONENTS, components)
                .build()
        }
        None => builder
            .scalar(FieldLabel::ImageScan, Value::Null)
            .scalar(FieldLabel::ImageScanTime, Value::Null)
            .scalar(FieldLabel::ImageOs, Value::Null)
            .array(COMPONENTS, Vec::new())
            .build(),
    }
}

pub fn build_process(indicator: &ProcessIndicator, not_in_baseline: bool) -> AugmentedObj {
    let signal = &indicator.signal;
    let root = ObjectBuilder::new()
        .string(FieldLabel::ProcessName, &signal.name)
        .set(
            FieldLabel::ProcessAncestor,
            signal.lineage.iter().map(Value::str).collect(),
        )
        .string(FieldLabel::ProcessArguments, &signal.args)
        .string(FieldLabel::ProcessUid, &signal.uid.to_string())
        .boolean(FieldLabel::NotInProcessBaseline, not_in_baseline)
        .build();
    AugmentedObj::new(ObjectKind::Process, root)
}

/// Builds the tree of a Kubernetes event, either for the admission path
/// ([`ObjectKind::KubeEvent`]) or the audit log ([`ObjectKind::AuditLogEvent`]).
pub fn build_kube_event(event: &KubernetesEvent, kind: ObjectKind) -> Result<AugmentedObj> {
    if !matches!(kind, ObjectKind::KubeEvent | ObjectKind::AuditLogEvent) {
        return Err(PolicyError::Augmentation(format!(
            "cannot build a {kind} tree from a kubernetes event"
        )));
    }
    let root = ObjectBuilder::new()
        .string(FieldLabel::KubernetesApiVerb, event.api_verb.as_str())
        .string(FieldLabel::KubernetesResource, event.object.resource.as_str())
        .optional_string(FieldLabel::KubernetesResourceName, &event.object.name)
        .optional_string(FieldLabel::KubernetesUserName, &event.user.username)
        .set(
            FieldLabel::KubernetesUserGroups,
            event.user.groups.iter().map(Value::str).collect(),
        )
        .set(
            FieldLabel::SourceIpAddress,
            event.source_ips.iter().map(Value::str).collect(),
        )
        .optional_string(FieldLabel::UserAgent, &event.user_agent)
        .boolean(
            FieldLabel::IsImpersonatedUser,
            event.impersonated_user.is_some(),
        )
        .build();
    Ok(AugmentedObj::new(kind, root))
}

pub fn build_network_flow(flow: &NetworkFlowDetails) -> AugmentedObj {
    let root = ObjectBuilder::new()
        .boolean(FieldLabel::NotInNetworkBaseline, flow.not_in_network_baseline)
        .optional_string(FieldLabel::FlowSrcName, &flow.src_entity_name)
        .optional_string(FieldLabel::FlowDstName, &flow.dst_entity_name)
        .integer(FieldLabel::FlowDstPort, i64::from(flow.dst_port))
        .string(FieldLabel::FlowProtocol, flow.protocol.as_str())
        .build();
    AugmentedObj::new(ObjectKind::NetworkFlow, root)
}

/// Attaches a process tree under the container that ran it.
pub fn with_process(
    deployment: &AugmentedObj,
    indicator: &ProcessIndicator,
    process: &AugmentedObj,
) -> Result<AugmentedObj> {
    expect_kind(deployment, ObjectKind::Deployment)?;
    expect_kind(process, ObjectKind::Process)?;

    let mut root = root_fields(deployment)?.clone();
    let containers = root.get(CONTAINERS).map_or(&[][..], |c| c.elements());
    let index = containers
        .iter()
        .position(|container| {
            matches!(
                container.leaf(FieldLabel::ContainerName),
                Some([Value::Str(name)]) if *name == indicator.container_name
            )
        })
        .ok_or_else(|| {
            PolicyError::Augmentation(format!(
                "container {:?} of process {:?} not found in deployment",
                indicator.container_name, indicator.id
            ))
        })?;

    let mut updated = containers.to_vec();
    let mut container = updated[index]
        .as_object()
        .cloned()
        .unwrap_or_default();
    container.insert(PROCESS, Arc::clone(process.shared_root()));
    updated[index] = Arc::new(Node::Object(container));
    root.insert(CONTAINERS, Arc::new(Node::Array(updated)));

    Ok(AugmentedObj::new(
        ObjectKind::DeploymentWithProcess,
        Node::Object(root),
    ))
}

pub fn with_kube_event(deployment: &AugmentedObj, event: &AugmentedObj) -> Result<AugmentedObj> {
    expect_kind(deployment, ObjectKind::Deployment)?;
    expect_kind(event, ObjectKind::KubeEvent)?;
    let mut root = root_fields(deployment)?.clone();
    root.insert(KUBE_EVENT, Arc::clone(event.shared_root()));
    Ok(AugmentedObj::new(
        ObjectKind::DeploymentWithKubeEvent,
        Node::Object(root),
    ))
}

pub fn with_network_flow(deployment: &AugmentedObj, flow: &AugmentedObj) -> Result<AugmentedObj> {
    expect_kind(deployment, ObjectKind::Deployment)?;
    expect_kind(flow, ObjectKind::NetworkFlow)?;
    let mut root = root_fields(deployment)?.clone();
    root.insert(NETWORK_FLOW, Arc::clone(flow.shared_root()));
    Ok(AugmentedObj::new(
        ObjectKind::DeploymentWithNetworkFlow,
        Node::Object(root),
    ))
}

fn expect_kind(obj: &AugmentedObj, kind: ObjectKind) -> Result<()> {
    if obj.kind() == kind {
        Ok(())
    } else {
        Err(PolicyError::Augmentation(format!(
            "expected a {kind} tree, got a {} tree",
            obj.kind()
        )))
    }
}

fn root_fields(obj: &AugmentedObj) -> Result<&BTreeMap<&'static str, Arc<Node>>> {
    obj.root().as_object().ok_or_else(|| {
        PolicyError::Augmentation(format!("{} tree root is not an object", obj.kind()))
    })
}

fn key_values(map: &BTreeMap<String, String>) -> Vec<Value> {
    map.iter()
        .map(|(k, v)| Value::compound([k.as_str(), v.as_str()]))
        .collect()
}

/// Capability names without the `CAP_` prefix, upper case.
fn capabilities(caps: &[String]) -> Vec<Value> {
    caps.iter()
        .map(|cap| {
            let upper = cap.to_ascii_uppercase();
            let name = upper.strip_prefix("CAP_").unwrap_or(&upper);
            Value::str(name)
        })
        .collect()
}

/// Widens through the shortest decimal form so `9.8f32` stays `9.8`.
fn f32_to_f64(value: f32) -> f64 {
    value.to_string().parse().unwrap_or(f64::from(value))
}
