//! The field registry: every policy field name with its value grammar and
//! query construction rule.

use super::context::ContextFields;
use super::names;
use super::regexes;
use crate::augment::FieldLabel;
use crate::compiler::query_builders::{MapCheck, QueryBuilder};
use crate::error::{PolicyError, Result};
use crate::policy::EventSource;
use crate::validate::ValidateOptions;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;

/// Discrete runtime data a field reads. Fields of different categories can
/// not be combined in one section, except Kubernetes event fields with audit
/// log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RuntimeFieldCategory {
    Process,
    KubeEvent,
    NetworkFlow,
    AuditLogEvent,
}

impl fmt::Display for RuntimeFieldCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RuntimeFieldCategory::Process => "process",
            RuntimeFieldCategory::KubeEvent => "kubernetes event",
            RuntimeFieldCategory::NetworkFlow => "network flow",
            RuntimeFieldCategory::AuditLogEvent => "audit log event",
        };
        f.write_str(name)
    }
}

impl RuntimeFieldCategory {
    /// Whether fields of both categories may appear in the same section.
    pub fn compatible_with(self, other: RuntimeFieldCategory) -> bool {
        use RuntimeFieldCategory::*;
        self == other
            || matches!(
                (self, other),
                (KubeEvent, AuditLogEvent) | (AuditLogEvent, KubeEvent)
            )
    }
}

/// The grammar a field's values must match. Some fields pick their grammar
/// from the validation options.
#[derive(Debug, Clone, Copy)]
pub enum ValueRegex {
    Fixed(&'static Lazy<Regex>),
    EnvironmentVariable,
    KubeApiVerb,
    KubeResource,
}

impl ValueRegex {
    pub fn resolve(&self, options: &ValidateOptions) -> &'static Regex {
        match self {
            ValueRegex::Fixed(re) => Lazy::force(*re),
            ValueRegex::EnvironmentVariable if options.env_var_source_restrictions => {
                &regexes::ENVIRONMENT_VARIABLE_WITH_SOURCE_STRICT
            }
            ValueRegex::EnvironmentVariable => &regexes::ENVIRONMENT_VARIABLE_WITH_SOURCE,
            ValueRegex::KubeApiVerb if options.source_is_audit_log_events => {
                &regexes::AUDIT_EVENT_API_VERB
            }
            ValueRegex::KubeApiVerb => &regexes::KUBERNETES_API_VERB,
            ValueRegex::KubeResource if options.source_is_audit_log_events => {
                &regexes::AUDIT_EVENT_RESOURCE
            }
            ValueRegex::KubeResource => &regexes::KUBERNETES_RESOURCE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldOption {
    NegationForbidden,
    OperatorsForbidden,
}

/// Registration of a single policy field.
#[derive(Debug, Clone)]
pub struct FieldMetadata {
    name: &'static str,
    builder: QueryBuilder,
    context: ContextFields,
    value_regex: ValueRegex,
    event_sources: &'static [EventSource],
    negation_forbidden: bool,
    operators_forbidden: bool,
    category: Option<RuntimeFieldCategory>,
}

impl FieldMetadata {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn builder(&self) -> &QueryBuilder {
        &self.builder
    }

    pub fn context(&self) -> ContextFields {
        self.context
    }

    pub fn value_regex(&self, options: &ValidateOptions) -> &'static Regex {
        self.value_regex.resolve(options)
    }

    pub fn negation_forbidden(&self) -> bool {
        self.negation_forbidden
    }

    /// Single valued fields take exactly one value and no boolean operator.
    pub fn operators_forbidden(&self) -> bool {
        self.operators_forbidden
    }

    pub fn runtime_category(&self) -> Option<RuntimeFieldCategory> {
        self.category
    }

    pub fn applies_to(&self, source: EventSource) -> bool {
        self.event_sources.contains(&source)
    }
}

const DEPLOY_SOURCES: &[EventSource] = &[EventSource::NotApplicable, EventSource::DeploymentEvent];
const RUNTIME_SOURCES: &[EventSource] = &[EventSource::DeploymentEvent];
const KUBE_SOURCES: &[EventSource] = &[EventSource::DeploymentEvent, EventSource::AuditLogEvent];
const AUDIT_SOURCES: &[EventSource] = &[EventSource::AuditLogEvent];

/// Immutable lookup table from field name to [`FieldMetadata`].
///
/// # Examples
///
/// ```rust
/// use policy_engine::fields::registry;
///
/// let cvss = registry().get("CVSS").unwrap();
/// assert!(cvss.negation_forbidden());
/// assert!(registry().get("No Such Field").is_none());
/// ```
#[derive(Debug)]
pub struct FieldRegistry {
    fields: HashMap<&'static str, FieldMetadata>,
}

impl FieldRegistry {
    fn empty() -> Self {
        Self {
            fields: HashMap::new(),
        }
    }

    /// # Panics
    ///
    /// Panics when `name` is already registered.
    fn register(
        &mut self,
        name: &'static str,
        builder: QueryBuilder,
        context: ContextFields,
        value_regex: ValueRegex,
        event_sources: &'static [EventSource],
        options: &[FieldOption],
    ) {
        if self.fields.contains_key(name) {
            panic!("found duplicate metadata for field {name}");
        }
        self.fields.insert(
            name,
            FieldMetadata {
                name,
                builder,
                context,
                value_regex,
                event_sources,
                negation_forbidden: options.contains(&FieldOption::NegationForbidden),
                operators_forbidden: options.contains(&FieldOption::OperatorsForbidden),
                category: category_of(name),
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&FieldMetadata> {
        self.fields.get(name)
    }

    pub fn lookup(&self, name: &str) -> Result<&FieldMetadata> {
        self.get(name)
            .ok_or_else(|| PolicyError::UnknownField(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.fields.keys().copied().collect();
        names.sort_unstable();
        names
    }

    fn standard() -> Self {
        use ContextFields as Ctx;
        use FieldOption::{NegationForbidden as NoNeg, OperatorsForbidden as NoOps};
        use QueryBuilder as Qb;
        use ValueRegex::Fixed;

        let mut f = Self::empty();
        f.register(
            names::ADD_CAPS,
            Qb::FieldLabelExact(FieldLabel::AddCapabilities),
            Ctx::Container,
            Fixed(&regexes::CAPABILITIES_VALUE),
            DEPLOY_SOURCES,
            &[NoNeg],
        );
        f.register(
            names::APP_ARMOR_PROFILE,
            Qb::FieldLabelRegex(FieldLabel::AppArmorProfile),
            Ctx::Container,
            Fixed(&regexes::STRING),
            DEPLOY_SOURCES,
            &[],
        );
        f.register(
            names::CVE,
            Qb::FieldLabelRegex(FieldLabel::Cve),
            Ctx::Vuln,
            Fixed(&regexes::STRING),
            DEPLOY_SOURCES,
            &[],
        );
        f.register(
            names::CVSS,
            Qb::FieldLabel(FieldLabel::Cvss),
            Ctx::Vuln,
            Fixed(&regexes::COMPARATOR_DECIMAL),
            DEPLOY_SOURCES,
            &[NoNeg],
        );
        f.register(
            names::CONTAINER_CPU_LIMIT,
            Qb::FieldLabel(FieldLabel::CpuCoresLimit),
            Ctx::Resource,
            Fixed(&regexes::COMPARATOR_DECIMAL),
            DEPLOY_SOURCES,
            &[NoNeg],
        );
        f.register(
            names::CONTAINER_CPU_REQUEST,
            Qb::FieldLabel(FieldLabel::CpuCoresRequest),
            Ctx::Resource,
            Fixed(&regexes::COMPARATOR_DECIMAL),
            DEPLOY_SOURCES,
            &[NoNeg],
        );
        f.register(
            names::CONTAINER_MEM_LIMIT,
            Qb::FieldLabel(FieldLabel::MemoryLimit),
            Ctx::Resource,
            Fixed(&regexes::COMPARATOR_DECIMAL),
            DEPLOY_SOURCES,
            &[NoNeg],
        );
        f.register(
            names::CONTAINER_MEM_REQUEST,
            Qb::FieldLabel(FieldLabel::MemoryRequest),
            Ctx::Resource,
            Fixed(&regexes::COMPARATOR_DECIMAL),
            DEPLOY_SOURCES,
            &[NoNeg],
        );
        f.register(
            names::CONTAINER_NAME,
            Qb::FieldLabelRegex(FieldLabel::ContainerName),
            Ctx::Container,
            Fixed(&regexes::STRING),
            DEPLOY_SOURCES,
            &[],
        );
        f.register(
            names::DISALLOWED_ANNOTATION,
            Qb::FieldLabelMap(FieldLabel::Annotation, MapCheck::ShouldContain),
            Ctx::None,
            Fixed(&regexes::KEY_VALUE),
            DEPLOY_SOURCES,
            &[NoNeg],
        );
        f.register(
            names::DISALLOWED_IMAGE_LABEL,
            Qb::FieldLabelMap(FieldLabel::ImageLabel, MapCheck::ShouldContain),
            Ctx::Image,
            Fixed(&regexes::KEY_VALUE),
            DEPLOY_SOURCES,
            &[NoNeg],
        );
        f.register(
            names::DOCKERFILE_LINE,
            Qb::Compound(FieldLabel::DockerfileLine),
            Ctx::Image,
            Fixed(&regexes::DOCKERFILE_LINE),
            DEPLOY_SOURCES,
            &[NoNeg],
        );
        f.register(
            names::DROP_CAPS,
            Qb::DropCapabilities,
            Ctx::Container,
            Fixed(&regexes::DROP_CAPABILITIES_VALUE),
            DEPLOY_SOURCES,
            &[NoNeg],
        );
        f.register(
            names::ENVIRONMENT_VARIABLE,
            Qb::Compound(FieldLabel::EnvironmentVariable),
            Ctx::EnvVar,
            ValueRegex::EnvironmentVariable,
            DEPLOY_SOURCES,
            &[NoNeg],
        );
        f.register(
            names::FIXED_BY,
            Qb::FieldLabelRegex(FieldLabel::FixedBy),
            Ctx::Vuln,
            Fixed(&regexes::STRING),
            DEPLOY_SOURCES,
            &[],
        );
        f.register(
            names::HOST_IPC,
            Qb::FieldLabel(FieldLabel::HostIpc),
            Ctx::None,
            Fixed(&regexes::BOOLEAN),
            DEPLOY_SOURCES,
            &[NoNeg, NoOps],
        );
        f.register(
            names::HOST_NETWORK,
            Qb::FieldLabel(FieldLabel::HostNetwork),
            Ctx::None,
            Fixed(&regexes::BOOLEAN),
            DEPLOY_SOURCES,
            &[NoNeg, NoOps],
        );
        f.register(
            names::HOST_PID,
            Qb::FieldLabel(FieldLabel::HostPid),
            Ctx::None,
            Fixed(&regexes::BOOLEAN),
            DEPLOY_SOURCES,
            &[NoNeg, NoOps],
        );
        f.register(
            names::IMAGE_AGE,
            Qb::Days(FieldLabel::ImageCreatedTime),
            Ctx::Image,
            Fixed(&regexes::INTEGER),
            DEPLOY_SOURCES,
            &[NoNeg, NoOps],
        );
        f.register(
            names::IMAGE_COMPONENT,
            Qb::Compound(FieldLabel::ComponentAndVersion),
            Ctx::Image,
            Fixed(&regexes::KEY_VALUE),
            DEPLOY_SOURCES,
            &[NoNeg],
        );
        f.register(
            names::IMAGE_OS,
            Qb::FieldLabel(FieldLabel::ImageOs),
            Ctx::Image,
            Fixed(&regexes::STRING),
            DEPLOY_SOURCES,
            &[],
        );
        f.register(
            names::IMAGE_REGISTRY,
            Qb::FieldLabelRegex(FieldLabel::ImageRegistry),
            Ctx::Image,
            Fixed(&regexes::STRING),
            DEPLOY_SOURCES,
            &[],
        );
        f.register(
            names::IMAGE_REMOTE,
            Qb::FieldLabelRegex(FieldLabel::ImageRemote),
            Ctx::Image,
            Fixed(&regexes::STRING),
            DEPLOY_SOURCES,
            &[],
        );
        f.register(
            names::IMAGE_SCAN_AGE,
            Qb::Days(FieldLabel::ImageScanTime),
            Ctx::Image,
            Fixed(&regexes::INTEGER),
            DEPLOY_SOURCES,
            &[NoNeg, NoOps],
        );
        f.register(
            names::IMAGE_TAG,
            Qb::FieldLabelRegex(FieldLabel::ImageTag),
            Ctx::Image,
            Fixed(&regexes::STRING),
            DEPLOY_SOURCES,
            &[],
        );
        f.register(
            names::IMAGE_USER,
            Qb::FieldLabelRegex(FieldLabel::ImageUser),
            Ctx::Image,
            Fixed(&regexes::STRING),
            DEPLOY_SOURCES,
            &[],
        );
        f.register(
            names::MINIMUM_RBAC_PERMISSIONS,
            Qb::K8sRbac,
            Ctx::None,
            Fixed(&regexes::RBAC_PERMISSION),
            DEPLOY_SOURCES,
            &[NoOps],
        );
        f.register(
            names::MOUNT_PROPAGATION,
            Qb::FieldLabel(FieldLabel::MountPropagation),
            Ctx::Volume,
            Fixed(&regexes::MOUNT_PROPAGATION),
            DEPLOY_SOURCES,
            &[],
        );
        f.register(
            names::NAMESPACE,
            Qb::FieldLabelRegex(FieldLabel::Namespace),
            Ctx::None,
            Fixed(&regexes::STRING),
            DEPLOY_SOURCES,
            &[],
        );
        f.register(
            names::EXPOSED_NODE_PORT,
            Qb::FieldLabel(FieldLabel::ExposedNodePort),
            Ctx::None,
            Fixed(&regexes::COMPARATOR_DECIMAL),
            DEPLOY_SOURCES,
            &[],
        );
        f.register(
            names::EXPOSED_PORT,
            Qb::FieldLabel(FieldLabel::Port),
            Ctx::Port,
            Fixed(&regexes::COMPARATOR_DECIMAL),
            DEPLOY_SOURCES,
            &[],
        );
        f.register(
            names::PORT_EXPOSURE,
            Qb::FieldLabel(FieldLabel::ExposureLevel),
            Ctx::Port,
            Fixed(&regexes::PORT_EXPOSURE),
            DEPLOY_SOURCES,
            &[],
        );
        f.register(
            names::PRIVILEGED_CONTAINER,
            Qb::FieldLabel(FieldLabel::Privileged),
            Ctx::Container,
            Fixed(&regexes::BOOLEAN),
            DEPLOY_SOURCES,
            &[NoNeg, NoOps],
        );
        f.register(
            names::PROCESS_ANCESTOR,
            Qb::FieldLabelRegex(FieldLabel::ProcessAncestor),
            Ctx::None,
            Fixed(&regexes::STRING),
            RUNTIME_SOURCES,
            &[],
        );
        f.register(
            names::PROCESS_ARGUMENTS,
            Qb::FieldLabelRegex(FieldLabel::ProcessArguments),
            Ctx::None,
            Fixed(&regexes::STRING),
            RUNTIME_SOURCES,
            &[],
        );
        f.register(
            names::PROCESS_NAME,
            Qb::FieldLabelRegex(FieldLabel::ProcessName),
            Ctx::None,
            Fixed(&regexes::STRING),
            RUNTIME_SOURCES,
            &[],
        );
        f.register(
            names::PROCESS_UID,
            Qb::FieldLabel(FieldLabel::ProcessUid),
            Ctx::None,
            Fixed(&regexes::STRING),
            RUNTIME_SOURCES,
            &[],
        );
        f.register(
            names::EXPOSED_PORT_PROTOCOL,
            Qb::FieldLabelUpper(FieldLabel::PortProtocol),
            Ctx::Port,
            Fixed(&regexes::STRING),
            DEPLOY_SOURCES,
            &[],
        );
        f.register(
            names::READ_ONLY_ROOT_FS,
            Qb::FieldLabel(FieldLabel::ReadOnlyRootFilesystem),
            Ctx::Container,
            Fixed(&regexes::BOOLEAN),
            DEPLOY_SOURCES,
            &[NoNeg, NoOps],
        );
        f.register(
            names::REQUIRED_ANNOTATION,
            Qb::FieldLabelMap(FieldLabel::Annotation, MapCheck::ShouldNotContain),
            Ctx::None,
            Fixed(&regexes::KEY_VALUE),
            DEPLOY_SOURCES,
            &[NoNeg],
        );
        f.register(
            names::REQUIRED_IMAGE_LABEL,
            Qb::FieldLabelMap(FieldLabel::ImageLabel, MapCheck::ShouldNotContain),
            Ctx::Image,
            Fixed(&regexes::KEY_VALUE),
            DEPLOY_SOURCES,
            &[NoNeg],
        );
        f.register(
            names::REQUIRED_LABEL,
            Qb::FieldLabelMap(FieldLabel::Label, MapCheck::ShouldNotContain),
            Ctx::None,
            Fixed(&regexes::KEY_VALUE),
            DEPLOY_SOURCES,
            &[NoNeg],
        );
        f.register(
            names::SECCOMP_PROFILE_TYPE,
            Qb::FieldLabel(FieldLabel::SeccompProfileType),
            Ctx::Container,
            Fixed(&regexes::SECCOMP_PROFILE_TYPE),
            DEPLOY_SOURCES,
            &[NoOps],
        );
        f.register(
            names::SERVICE_ACCOUNT,
            Qb::FieldLabelRegex(FieldLabel::ServiceAccountName),
            Ctx::None,
            Fixed(&regexes::STRING),
            DEPLOY_SOURCES,
            &[],
        );
        f.register(
            names::SEVERITY,
            Qb::FieldLabel(FieldLabel::Severity),
            Ctx::Vuln,
            Fixed(&regexes::SEVERITY),
            DEPLOY_SOURCES,
            &[NoNeg],
        );
        f.register(
            names::UNSCANNED_IMAGE,
            Qb::Nil(FieldLabel::ImageScan),
            Ctx::Image,
            Fixed(&regexes::BOOLEAN),
            DEPLOY_SOURCES,
            &[NoNeg, NoOps],
        );
        f.register(
            names::VOLUME_DESTINATION,
            Qb::FieldLabelRegex(FieldLabel::VolumeDestination),
            Ctx::Volume,
            Fixed(&regexes::STRING),
            DEPLOY_SOURCES,
            &[],
        );
        f.register(
            names::VOLUME_NAME,
            Qb::FieldLabelRegex(FieldLabel::VolumeName),
            Ctx::Volume,
            Fixed(&regexes::STRING),
            DEPLOY_SOURCES,
            &[],
        );
        f.register(
            names::VOLUME_SOURCE,
            Qb::FieldLabelRegex(FieldLabel::VolumeSource),
            Ctx::Volume,
            Fixed(&regexes::STRING),
            DEPLOY_SOURCES,
            &[],
        );
        f.register(
            names::VOLUME_TYPE,
            Qb::FieldLabelRegex(FieldLabel::VolumeType),
            Ctx::Volume,
            Fixed(&regexes::STRING),
            DEPLOY_SOURCES,
            &[],
        );
        f.register(
            names::UNEXPECTED_NETWORK_FLOW_DETECTED,
            Qb::FieldLabel(FieldLabel::NotInNetworkBaseline),
            Ctx::None,
            Fixed(&regexes::BOOLEAN),
            RUNTIME_SOURCES,
            &[NoNeg, NoOps],
        );
        f.register(
            names::UNEXPECTED_PROCESS_EXECUTED,
            Qb::FieldLabel(FieldLabel::NotInProcessBaseline),
            Ctx::ProcessBaseline,
            Fixed(&regexes::BOOLEAN),
            RUNTIME_SOURCES,
            &[NoNeg, NoOps],
        );
        f.register(
            names::WRITABLE_HOST_MOUNT,
            Qb::WritableHostMount,
            Ctx::Volume,
            Fixed(&regexes::BOOLEAN),
            DEPLOY_SOURCES,
            &[NoNeg, NoOps],
        );
        f.register(
            names::WRITABLE_MOUNTED_VOLUME,
            Qb::BooleanInverted(FieldLabel::VolumeReadonly),
            Ctx::Volume,
            Fixed(&regexes::BOOLEAN),
            DEPLOY_SOURCES,
            &[NoNeg, NoOps],
        );
        f.register(
            names::HAS_INGRESS_NETWORK_POLICY,
            Qb::FieldLabel(FieldLabel::HasIngressNetworkPolicy),
            Ctx::None,
            Fixed(&regexes::BOOLEAN),
            DEPLOY_SOURCES,
            &[NoNeg, NoOps],
        );
        f.register(
            names::HAS_EGRESS_NETWORK_POLICY,
            Qb::FieldLabel(FieldLabel::HasEgressNetworkPolicy),
            Ctx::None,
            Fixed(&regexes::BOOLEAN),
            DEPLOY_SOURCES,
            &[NoNeg, NoOps],
        );

        f.register(
            names::KUBE_API_VERB,
            Qb::FieldLabel(FieldLabel::KubernetesApiVerb),
            Ctx::None,
            ValueRegex::KubeApiVerb,
            KUBE_SOURCES,
            &[NoNeg],
        );
        f.register(
            names::KUBE_RESOURCE,
            Qb::FieldLabel(FieldLabel::KubernetesResource),
            Ctx::None,
            ValueRegex::KubeResource,
            KUBE_SOURCES,
            &[NoNeg],
        );
        f.register(
            names::KUBE_RESOURCE_NAME,
            Qb::FieldLabel(FieldLabel::KubernetesResourceName),
            Ctx::None,
            Fixed(&regexes::KUBERNETES_NAME),
            AUDIT_SOURCES,
            &[],
        );
        f.register(
            names::KUBE_USER_NAME,
            Qb::FieldLabel(FieldLabel::KubernetesUserName),
            Ctx::None,
            Fixed(&regexes::KUBERNETES_NAME),
            AUDIT_SOURCES,
            &[],
        );
        f.register(
            names::KUBE_USER_GROUPS,
            Qb::FieldLabel(FieldLabel::KubernetesUserGroups),
            Ctx::None,
            Fixed(&regexes::KUBERNETES_NAME),
            AUDIT_SOURCES,
            &[],
        );
        f.register(
            names::SOURCE_IP_ADDRESS,
            Qb::FieldLabel(FieldLabel::SourceIpAddress),
            Ctx::None,
            Fixed(&regexes::IP_ADDRESS),
            AUDIT_SOURCES,
            &[],
        );
        f.register(
            names::USER_AGENT,
            Qb::FieldLabel(FieldLabel::UserAgent),
            Ctx::None,
            Fixed(&regexes::STRING),
            AUDIT_SOURCES,
            &[],
        );
        f.register(
            names::IS_IMPERSONATED_USER,
            Qb::FieldLabel(FieldLabel::IsImpersonatedUser),
            Ctx::None,
            Fixed(&regexes::BOOLEAN),
            AUDIT_SOURCES,
            &[NoNeg, NoOps],
        );
        f
    }
}

fn category_of(name: &str) -> Option<RuntimeFieldCategory> {
    match name {
        names::PROCESS_NAME
        | names::PROCESS_ANCESTOR
        | names::PROCESS_ARGUMENTS
        | names::PROCESS_UID
        | names::UNEXPECTED_PROCESS_EXECUTED => Some(RuntimeFieldCategory::Process),
        names::KUBE_API_VERB | names::KUBE_RESOURCE => Some(RuntimeFieldCategory::KubeEvent),
        names::KUBE_RESOURCE_NAME
        | names::KUBE_USER_NAME
        | names::KUBE_USER_GROUPS
        | names::SOURCE_IP_ADDRESS
        | names::USER_AGENT
        | names::IS_IMPERSONATED_USER => Some(RuntimeFieldCategory::AuditLogEvent),
        names::UNEXPECTED_NETWORK_FLOW_DETECTED => Some(RuntimeFieldCategory::NetworkFlow),
        _ => None,
    }
}

static REGISTRY: Lazy<FieldRegistry> = Lazy::new(FieldRegistry::standard);

/// The process-wide field registry, built on first use.
pub fn registry() -> &'static FieldRegistry {
    &REGISTRY
}
