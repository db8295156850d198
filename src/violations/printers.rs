//! Message printers, one per family of policy fields.

use super::ViolationType;
use crate::augment::{FieldLabel, EMPTY_VALUE, NIL_VALUE};
use crate::evaluator::MatchMap;
use crate::fields::names;
use crate::objects::ProcessIndicator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Printer {
    ImageName,
    ImageAge,
    ImageScanAge,
    UnscannedImage,
    ImageOs,
    ImageUser,
    RequiredImageLabel,
    DisallowedImageLabel,
    DockerfileLine,
    Component,
    Vulnerability,
    ContainerName,
    Privileged,
    ReadOnlyRootFs,
    AddCapabilities,
    DropCapabilities,
    SeccompProfile,
    AppArmorProfile,
    Resources,
    EnvironmentVariable,
    Volume,
    MountPropagation,
    Port,
    PortExposure,
    NodePort,
    Namespace,
    ServiceAccount,
    HostNetwork,
    HostPid,
    HostIpc,
    Rbac,
    RequiredLabel,
    RequiredAnnotation,
    DisallowedAnnotation,
    IngressNetworkPolicy,
    EgressNetworkPolicy,
    UnexpectedProcess,
}

/// Printer for a policy field. Runtime event fields have none: process and
/// Kubernetes event matches are summarised from the event itself.
pub(crate) fn for_field(field_name: &str) -> Option<Printer> {
    let printer = match field_name {
        names::IMAGE_TAG | names::IMAGE_REGISTRY | names::IMAGE_REMOTE => Printer::ImageName,
        names::IMAGE_AGE => Printer::ImageAge,
        names::IMAGE_SCAN_AGE => Printer::ImageScanAge,
        names::UNSCANNED_IMAGE => Printer::UnscannedImage,
        names::IMAGE_OS => Printer::ImageOs,
        names::IMAGE_USER => Printer::ImageUser,
        names::REQUIRED_IMAGE_LABEL => Printer::RequiredImageLabel,
        names::DISALLOWED_IMAGE_LABEL => Printer::DisallowedImageLabel,
        names::DOCKERFILE_LINE => Printer::DockerfileLine,
        names::IMAGE_COMPONENT => Printer::Component,
        names::CVE | names::CVSS | names::SEVERITY | names::FIXED_BY => Printer::Vulnerability,
        names::CONTAINER_NAME => Printer::ContainerName,
        names::PRIVILEGED_CONTAINER => Printer::Privileged,
        names::READ_ONLY_ROOT_FS => Printer::ReadOnlyRootFs,
        names::ADD_CAPS => Printer::AddCapabilities,
        names::DROP_CAPS => Printer::DropCapabilities,
        names::SECCOMP_PROFILE_TYPE => Printer::SeccompProfile,
        names::APP_ARMOR_PROFILE => Printer::AppArmorProfile,
        names::CONTAINER_CPU_LIMIT
        | names::CONTAINER_CPU_REQUEST
        | names::CONTAINER_MEM_LIMIT
        | names::CONTAINER_MEM_REQUEST => Printer::Resources,
        names::ENVIRONMENT_VARIABLE => Printer::EnvironmentVariable,
        names::VOLUME_NAME
        | names::VOLUME_SOURCE
        | names::VOLUME_DESTINATION
        | names::VOLUME_TYPE
        | names::WRITABLE_MOUNTED_VOLUME
        | names::WRITABLE_HOST_MOUNT => Printer::Volume,
        names::MOUNT_PROPAGATION => Printer::MountPropagation,
        names::EXPOSED_PORT | names::EXPOSED_PORT_PROTOCOL => Printer::Port,
        names::PORT_EXPOSURE => Printer::PortExposure,
        names::EXPOSED_NODE_PORT => Printer::NodePort,
        names::NAMESPACE => Printer::Namespace,
        names::SERVICE_ACCOUNT => Printer::ServiceAccount,
        names::HOST_NETWORK => Printer::HostNetwork,
        names::HOST_PID => Printer::HostPid,
        names::HOST_IPC => Printer::HostIpc,
        names::MINIMUM_RBAC_PERMISSIONS => Printer::Rbac,
        names::REQUIRED_LABEL => Printer::RequiredLabel,
        names::REQUIRED_ANNOTATION => Printer::RequiredAnnotation,
        names::DISALLOWED_ANNOTATION => Printer::DisallowedAnnotation,
        names::HAS_INGRESS_NETWORK_POLICY => Printer::IngressNetworkPolicy,
        names::HAS_EGRESS_NETWORK_POLICY => Printer::EgressNetworkPolicy,
        names::UNEXPECTED_PROCESS_EXECUTED => Printer::UnexpectedProcess,
        _ => return None,
    };
    Some(printer)
}

/// What a printer reads from.
pub(crate) struct PrintContext<'a> {
    pub(crate) map: &'a MatchMap,
    pub(crate) process: Option<&'a ProcessIndicator>,
}

impl PrintContext<'_> {
    fn values(&self, label: FieldLabel) -> &[String] {
        self.map.get(label.as_str()).map_or(&[], Vec::as_slice)
    }

    /// First value of a label, ignoring missing and unset values.
    fn first(&self, label: FieldLabel) -> Option<&str> {
        self.values(label)
            .first()
            .map(String::as_str)
            .filter(|v| is_present(v))
    }

    fn present(&self, label: FieldLabel) -> impl Iterator<Item = &str> {
        self.values(label)
            .iter()
            .map(String::as_str)
            .filter(|v| is_present(v))
    }

    fn container(&self) -> Option<&str> {
        self.first(FieldLabel::ContainerName)
    }

    /// "Container 'x' has image" after build time, "Image has" before.
    fn image_subject(&self) -> String {
        match self.container() {
            Some(container) => format!("Container '{container}' has image with"),
            None => "Image has".to_string(),
        }
    }

    fn in_container(&self) -> String {
        self.container()
            .map(|c| format!(" in container '{c}'"))
            .unwrap_or_default()
    }

    fn container_subject(&self) -> String {
        match self.container() {
            Some(container) => format!("Container '{container}'"),
            None => "Container".to_string(),
        }
    }
}

fn is_present(value: &str) -> bool {
    !value.is_empty() && value != NIL_VALUE && value != EMPTY_VALUE
}

fn key_value(compound: &str) -> String {
    compound.replacen('\t', "=", 1)
}

/// Joins clauses as "a", "a and b" or "a, b, and c".
fn join_clauses(clauses: &[String]) -> String {
    match clauses {
        [] => String::new(),
        [one] => one.clone(),
        [a, b] => format!("{a} and {b}"),
        [init @ .., last] => format!("{}, and {last}", init.join(", ")),
    }
}

fn title_case(level: &str) -> String {
    let lower = level.to_ascii_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => lower,
    }
}

fn rbac_description(level: &str) -> &'static str {
    match level {
        "NONE" => "no specified access",
        "DEFAULT" => "default access",
        "ELEVATED_IN_NAMESPACE" => "elevated access in namespace",
        "ELEVATED_CLUSTER_WIDE" => "elevated access in cluster",
        "CLUSTER_ADMIN" => "full cluster admin access",
        _ => "unknown access",
    }
}

fn required_map(ctx: &PrintContext<'_>, label: FieldLabel, noun: &str, owner: &str) -> Vec<String> {
    let found: Vec<String> = ctx.present(label).map(key_value).collect();
    if found.is_empty() {
        vec![format!("{owner} includes no {noun}s")]
    } else {
        vec![format!(
            "Required {noun} not found (found {noun}s: {})",
            found.join(", ")
        )]
    }
}

fn disallowed_map(
    ctx: &PrintContext<'_>,
    label: FieldLabel,
    noun: &str,
    suffix: &str,
) -> Vec<String> {
    ctx.present(label)
        .map(|entry| format!("Disallowed {noun} found: {}{suffix}", key_value(entry)))
        .collect()
}

fn host_namespace(ctx: &PrintContext<'_>, label: FieldLabel, what: &str) -> Vec<String> {
    match ctx.first(label) {
        Some("true") => vec![format!("Deployment uses {what}")],
        Some("false") => vec![format!("Deployment does not use {what}")],
        _ => Vec::new(),
    }
}

fn network_policy(ctx: &PrintContext<'_>, label: FieldLabel, direction: &str) -> Vec<String> {
    match ctx.first(label) {
        Some("false") => vec![format!("The deployment is missing {direction} Network Policy.")],
        Some("true") => vec![format!("The deployment has {direction} Network Policy.")],
        _ => Vec::new(),
    }
}

fn vulnerability(ctx: &PrintContext<'_>) -> Option<String> {
    let cve = ctx.first(FieldLabel::Cve)?;
    let fixed_by = ctx.first(FieldLabel::FixedBy);
    let mut message = String::new();
    if fixed_by.is_some() {
        message.push_str("Fixable ");
    }
    message.push_str(cve);
    if let Some(cvss) = ctx.first(FieldLabel::Cvss) {
        message.push_str(&format!(" (CVSS {cvss})"));
    }
    if let Some(severity) = ctx.first(FieldLabel::Severity) {
        message.push_str(&format!(" (severity {})", title_case(severity)));
    }
    if let Some(component) = ctx.first(FieldLabel::ComponentName) {
        message.push_str(" found in component ");
        message.push_str(component);
        if let Some(version) = ctx.first(FieldLabel::ComponentVersion) {
            message.push('-');
            message.push_str(version);
        }
    }
    message.push_str(&ctx.in_container());
    if let Some(fixed_by) = fixed_by {
        message.push_str(&format!(", resolved by version {fixed_by}"));
    }
    Some(message)
}

fn environment_variable(entry: &str, in_container: &str) -> String {
    let mut parts = entry.splitn(3, '\t');
    let source = parts.next().unwrap_or_default();
    let key = parts.next().unwrap_or_default();
    let reference = match source {
        "SECRET_KEY" => " and references a secret key",
        "CONFIG_MAP_KEY" => " and references a config map key",
        "FIELD" => " and references a field",
        "RESOURCE_FIELD" => " and references a resource field",
        _ => "",
    };
    format!("Environment variable '{key}' is present{in_container}{reference}")
}

fn volume(ctx: &PrintContext<'_>) -> Option<String> {
    let name = ctx.first(FieldLabel::VolumeName)?;
    let access = match ctx.first(FieldLabel::VolumeReadonly) {
        Some("true") => "Read-only",
        Some("false") => "Writable",
        _ => "",
    };
    let mut message = if access.is_empty() {
        format!("Volume '{name}'")
    } else {
        format!("{access} volume '{name}'")
    };
    let mut clauses = Vec::new();
    if let Some(source) = ctx.first(FieldLabel::VolumeSource) {
        clauses.push(format!("source '{source}'"));
    }
    if let Some(destination) = ctx.first(FieldLabel::VolumeDestination) {
        clauses.push(format!("destination '{destination}'"));
    }
    if let Some(kind) = ctx.first(FieldLabel::VolumeType) {
        clauses.push(format!("type '{kind}'"));
    }
    if !clauses.is_empty() {
        message.push_str(" has ");
        message.push_str(&join_clauses(&clauses));
    }
    Some(message)
}

fn port(ctx: &PrintContext<'_>) -> Option<String> {
    let port = ctx.first(FieldLabel::Port)?;
    Some(match ctx.first(FieldLabel::PortProtocol) {
        Some(protocol) => format!("{port}/{protocol}"),
        None => port.to_string(),
    })
}

impl Printer {
    pub(crate) fn violation_type(self) -> ViolationType {
        match self {
            Printer::IngressNetworkPolicy | Printer::EgressNetworkPolicy => {
                ViolationType::NetworkPolicy
            }
            _ => ViolationType::Generic,
        }
    }

    pub(crate) fn print(self, ctx: &PrintContext<'_>) -> Vec<String> {
        match self {
            Printer::ImageName => {
                let mut clauses = Vec::new();
                for (label, noun) in [
                    (FieldLabel::ImageRegistry, "registry"),
                    (FieldLabel::ImageRemote, "remote"),
                    (FieldLabel::ImageTag, "tag"),
                ] {
                    if let Some(value) = ctx.values(label).first() {
                        clauses.push(format!("{noun} '{value}'"));
                    }
                }
                if clauses.is_empty() {
                    return Vec::new();
                }
                vec![format!("{} {}", ctx.image_subject(), join_clauses(&clauses))]
            }
            Printer::ImageAge => ctx
                .first(FieldLabel::ImageCreatedTime)
                .map(|t| format!("{} time of creation {t}", ctx.image_subject()))
                .into_iter()
                .collect(),
            Printer::ImageScanAge => ctx
                .first(FieldLabel::ImageScanTime)
                .map(|t| format!("{} time of last scan {t}", ctx.image_subject()))
                .into_iter()
                .collect(),
            Printer::UnscannedImage => vec![match ctx.container() {
                Some(container) => {
                    format!("Container '{container}' has an image that has not been scanned")
                }
                None => "Image has not been scanned".to_string(),
            }],
            Printer::ImageOs => ctx
                .first(FieldLabel::ImageOs)
                .map(|os| format!("{} base OS '{os}'", ctx.image_subject()))
                .into_iter()
                .collect(),
            Printer::ImageUser => ctx
                .first(FieldLabel::ImageUser)
                .map(|user| format!("{} user '{user}'", ctx.image_subject()))
                .into_iter()
                .collect(),
            Printer::RequiredImageLabel => {
                let owner = match ctx.container() {
                    Some(container) => format!("Image in container '{container}'"),
                    None => "Image".to_string(),
                };
                required_map(ctx, FieldLabel::ImageLabel, "image label", &owner)
            }
            Printer::DisallowedImageLabel => {
                disallowed_map(ctx, FieldLabel::ImageLabel, "image label", &ctx.in_container())
            }
            Printer::DockerfileLine => {
                let in_container = ctx.in_container();
                ctx.present(FieldLabel::DockerfileLine)
                    .map(|line| {
                        let line = line.replacen('\t', " ", 1);
                        format!("Dockerfile line '{line}' present{in_container}")
                    })
                    .collect()
            }
            Printer::Component => {
                let subject = match ctx.container() {
                    Some(container) => format!("Container '{container}'"),
                    None => "Image".to_string(),
                };
                ctx.present(FieldLabel::ComponentAndVersion)
                    .map(|component| {
                        let (name, version) = component.split_once('\t').unwrap_or((component, ""));
                        if version.is_empty() {
                            format!("{subject} includes component {name}")
                        } else {
                            format!("{subject} includes component {name} {version}")
                        }
                    })
                    .collect()
            }
            Printer::Vulnerability => vulnerability(ctx).into_iter().collect(),
            Printer::ContainerName => ctx
                .container()
                .map(|c| format!("Container name is '{c}'"))
                .into_iter()
                .collect(),
            Printer::Privileged => match ctx.first(FieldLabel::Privileged) {
                Some("true") => vec![format!("{} is privileged", ctx.container_subject())],
                Some("false") => vec![format!("{} is not privileged", ctx.container_subject())],
                _ => Vec::new(),
            },
            Printer::ReadOnlyRootFs => match ctx.first(FieldLabel::ReadOnlyRootFilesystem) {
                Some("false") => vec![format!(
                    "{} uses a read-write root filesystem",
                    ctx.container_subject()
                )],
                Some("true") => vec![format!(
                    "{} uses a read-only root filesystem",
                    ctx.container_subject()
                )],
                _ => Vec::new(),
            },
            Printer::AddCapabilities => {
                let subject = ctx.container_subject();
                ctx.present(FieldLabel::AddCapabilities)
                    .map(|cap| format!("{subject} adds capability {cap}"))
                    .collect()
            }
            Printer::DropCapabilities => {
                let dropped: Vec<&str> = ctx.present(FieldLabel::DropCapabilities).collect();
                let dropped = if dropped.is_empty() {
                    "none".to_string()
                } else {
                    dropped.join(", ")
                };
                vec![format!(
                    "{} does not drop expected capabilities (drops: {dropped})",
                    ctx.container_subject()
                )]
            }
            Printer::SeccompProfile => ctx
                .first(FieldLabel::SeccompProfileType)
                .map(|p| format!("{} has Seccomp profile type '{p}'", ctx.container_subject()))
                .into_iter()
                .collect(),
            Printer::AppArmorProfile => ctx
                .first(FieldLabel::AppArmorProfile)
                .map(|p| format!("{} has AppArmor profile type '{p}'", ctx.container_subject()))
                .into_iter()
                .collect(),
            Printer::Resources => {
                let subject = ctx.container_subject();
                [
                    (FieldLabel::CpuCoresLimit, "CPU limit", "cores"),
                    (FieldLabel::CpuCoresRequest, "CPU request", "cores"),
                    (FieldLabel::MemoryLimit, "memory limit", "MB"),
                    (FieldLabel::MemoryRequest, "memory request", "MB"),
                ]
                .into_iter()
                .filter_map(|(label, what, unit)| {
                    ctx.first(label)
                        .map(|amount| format!("{subject} has {what} of {amount} {unit}"))
                })
                .collect()
            }
            Printer::EnvironmentVariable => {
                let in_container = ctx.in_container();
                ctx.present(FieldLabel::EnvironmentVariable)
                    .map(|entry| environment_variable(entry, &in_container))
                    .collect()
            }
            Printer::Volume => volume(ctx).into_iter().collect(),
            Printer::MountPropagation => ctx
                .first(FieldLabel::MountPropagation)
                .map(|mode| match ctx.first(FieldLabel::VolumeName) {
                    Some(name) => format!("Volume '{name}' uses mount propagation '{mode}'"),
                    None => format!("Volume uses mount propagation '{mode}'"),
                })
                .into_iter()
                .collect(),
            Printer::Port => port(ctx)
                .map(|port| format!("Exposed port {port} is present"))
                .into_iter()
                .collect(),
            Printer::PortExposure => {
                let port = port(ctx);
                ctx.present(FieldLabel::ExposureLevel)
                    .map(|level| match &port {
                        Some(port) => format!("Exposed port {port} uses exposure type '{level}'"),
                        None => format!("Deployment uses exposure type '{level}'"),
                    })
                    .collect()
            }
            Printer::NodePort => ctx
                .present(FieldLabel::ExposedNodePort)
                .map(|port| format!("Deployment exposes node port {port}"))
                .collect(),
            Printer::Namespace => ctx
                .first(FieldLabel::Namespace)
                .map(|ns| format!("Deployment is in namespace '{ns}'"))
                .into_iter()
                .collect(),
            Printer::ServiceAccount => ctx
                .first(FieldLabel::ServiceAccountName)
                .map(|sa| format!("Deployment uses service account '{sa}'"))
                .into_iter()
                .collect(),
            Printer::HostNetwork => host_namespace(ctx, FieldLabel::HostNetwork, "host network"),
            Printer::HostPid => {
                host_namespace(ctx, FieldLabel::HostPid, "the host's process ID namespace")
            }
            Printer::HostIpc => {
                host_namespace(ctx, FieldLabel::HostIpc, "the host's IPC namespace")
            }
            Printer::Rbac => ctx
                .first(FieldLabel::ServiceAccountPermissionLevel)
                .map(|level| {
                    format!(
                        "Service account permission level with {}",
                        rbac_description(level)
                    )
                })
                .into_iter()
                .collect(),
            Printer::RequiredLabel => required_map(ctx, FieldLabel::Label, "label", "Deployment"),
            Printer::RequiredAnnotation => {
                required_map(ctx, FieldLabel::Annotation, "annotation", "Deployment")
            }
            Printer::DisallowedAnnotation => {
                disallowed_map(ctx, FieldLabel::Annotation, "annotation", "")
            }
            Printer::IngressNetworkPolicy => {
                network_policy(ctx, FieldLabel::HasIngressNetworkPolicy, "Ingress")
            }
            Printer::EgressNetworkPolicy => {
                network_policy(ctx, FieldLabel::HasEgressNetworkPolicy, "Egress")
            }
            Printer::UnexpectedProcess => {
                let name = ctx
                    .first(FieldLabel::ProcessName)
                    .or_else(|| ctx.process.map(|p| p.signal.name.as_str()));
                let container = ctx
                    .container()
                    .or_else(|| ctx.process.map(|p| p.container_name.as_str()));
                match (name, container) {
                    (Some(name), Some(container)) => {
                        vec![format!("Unexpected process '{name}' in container '{container}'")]
                    }
                    (Some(name), None) => vec![format!("Unexpected process '{name}'")],
                    _ => Vec::new(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(FieldLabel, &[&str])]) -> MatchMap {
        entries
            .iter()
            .map(|(label, values)| {
                (
                    label.as_str().to_string(),
                    values.iter().map(|v| v.to_string()).collect(),
                )
            })
            .collect()
    }

    fn print(printer: Printer, map: &MatchMap) -> Vec<String> {
        printer.print(&PrintContext { map, process: None })
    }

    #[test]
    fn test_image_name_clauses() {
        let m = map(&[
            (FieldLabel::ContainerName, &["nginx"]),
            (FieldLabel::ImageRegistry, &["docker.io"]),
            (FieldLabel::ImageRemote, &["library/nginx"]),
            (FieldLabel::ImageTag, &["1.10"]),
        ]);
        assert_eq!(
            print(Printer::ImageName, &m),
            vec!["Container 'nginx' has image with registry 'docker.io', remote 'library/nginx', and tag '1.10'"]
        );

        let build = map(&[(FieldLabel::ImageTag, &["latest"])]);
        assert_eq!(print(Printer::ImageName, &build), vec!["Image has tag 'latest'"]);
    }

    #[test]
    fn test_vulnerability_message() {
        let m = map(&[
            (FieldLabel::Cve, &["CVE-2017-5638"]),
            (FieldLabel::Cvss, &["8"]),
            (FieldLabel::ComponentName, &["struts"]),
            (FieldLabel::ComponentVersion, &["1.2"]),
            (FieldLabel::FixedBy, &["v1.3"]),
            (FieldLabel::ContainerName, &["app"]),
        ]);
        assert_eq!(
            print(Printer::Vulnerability, &m),
            vec!["Fixable CVE-2017-5638 (CVSS 8) found in component struts-1.2 in container 'app', resolved by version v1.3"]
        );

        let unfixable = map(&[
            (FieldLabel::Cve, &["CVE-2014-6271"]),
            (FieldLabel::Cvss, &["6"]),
            (FieldLabel::Severity, &["IMPORTANT"]),
            (FieldLabel::ComponentName, &["shellshock"]),
            (FieldLabel::ComponentVersion, &["<nil>"]),
            (FieldLabel::FixedBy, &["<nil>"]),
        ]);
        assert_eq!(
            print(Printer::Vulnerability, &unfixable),
            vec!["CVE-2014-6271 (CVSS 6) (severity Important) found in component shellshock"]
        );
    }

    #[test]
    fn test_environment_variable_sources() {
        let m = map(&[
            (FieldLabel::ContainerName, &["app"]),
            (
                FieldLabel::EnvironmentVariable,
                &["RAW\tDEBUG\t1", "SECRET_KEY\tPASSWORD\t"],
            ),
        ]);
        assert_eq!(
            print(Printer::EnvironmentVariable, &m),
            vec![
                "Environment variable 'DEBUG' is present in container 'app'",
                "Environment variable 'PASSWORD' is present in container 'app' and references a secret key",
            ]
        );
    }

    #[test]
    fn test_required_and_disallowed_maps() {
        let none = map(&[(FieldLabel::Label, &["<empty>"])]);
        assert_eq!(print(Printer::RequiredLabel, &none), vec!["Deployment includes no labels"]);

        let some = map(&[(FieldLabel::Label, &["app\tweb", "tier\tfront"])]);
        assert_eq!(
            print(Printer::RequiredLabel, &some),
            vec!["Required label not found (found labels: app=web, tier=front)"]
        );

        let disallowed = map(&[(FieldLabel::Annotation, &["owner\tnobody"])]);
        assert_eq!(
            print(Printer::DisallowedAnnotation, &disallowed),
            vec!["Disallowed annotation found: owner=nobody"]
        );
    }

    #[test]
    fn test_volume_message() {
        let m = map(&[
            (FieldLabel::VolumeName, &["docker-sock"]),
            (FieldLabel::VolumeSource, &["/var/run/docker.sock"]),
            (FieldLabel::VolumeDestination, &["/var/run/docker.sock"]),
            (FieldLabel::VolumeReadonly, &["false"]),
            (FieldLabel::VolumeType, &["HostPath"]),
        ]);
        assert_eq!(
            print(Printer::Volume, &m),
            vec!["Writable volume 'docker-sock' has source '/var/run/docker.sock', destination '/var/run/docker.sock', and type 'HostPath'"]
        );
    }

    #[test]
    fn test_network_policy_messages() {
        let missing = map(&[(FieldLabel::HasIngressNetworkPolicy, &["false"])]);
        assert_eq!(
            print(Printer::IngressNetworkPolicy, &missing),
            vec!["The deployment is missing Ingress Network Policy."]
        );
        assert_eq!(
            Printer::IngressNetworkPolicy.violation_type(),
            ViolationType::NetworkPolicy
        );
    }

    #[test]
    fn test_unexpected_process_falls_back_to_indicator() {
        let indicator = ProcessIndicator::new("p", "web", "/bin/bash", "");
        let m = MatchMap::new();
        let messages = Printer::UnexpectedProcess.print(&PrintContext {
            map: &m,
            process: Some(&indicator),
        });
        assert_eq!(messages, vec!["Unexpected process 'bash' in container 'web'"]);
    }

    #[test]
    fn test_runtime_event_fields_have_no_printer() {
        assert_eq!(for_field(names::PROCESS_NAME), None);
        assert_eq!(for_field(names::KUBE_API_VERB), None);
        assert_eq!(for_field(names::CVSS), Some(Printer::Vulnerability));
        assert_eq!(for_field(names::CVE), for_field(names::FIXED_BY));
    }

    #[test]
    fn test_join_clauses() {
        assert_eq!(join_clauses(&["a".to_string()]), "a");
        assert_eq!(join_clauses(&["a".to_string(), "b".to_string()]), "a and b");
        assert_eq!(
            join_clauses(&["a".to_string(), "b".to_string(), "c".to_string()]),
            "a, b, and c"
        );
    }
}
