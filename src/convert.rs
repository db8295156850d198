//! Upgrades legacy flat-field policies to sections and groups.
//!
//! Every legacy criterion becomes zero or more groups. All criteria are AND'd
//! except the container resource constraints, which the legacy schema OR'd;
//! those are distributed so `A AND (B OR C)` becomes the sections `A AND B`
//! and `A AND C`.

use crate::error::{PolicyError, Result};
use crate::fields::names;
use crate::policy::legacy::{Comparator, KeyValuePolicy, NumericalPolicy, PolicyFields};
use crate::policy::{
    BooleanOperator, Policy, PolicyGroup, PolicySection, CURRENT_VERSION, LEGACY_VERSION,
};

type FieldConverter = fn(&PolicyFields) -> Vec<PolicyGroup>;

const AND_FIELD_CONVERTERS: &[FieldConverter] = &[
    convert_image_name,
    convert_image_age_days,
    convert_dockerfile_line,
    convert_cve,
    convert_component,
    convert_scan_age_days,
    convert_no_scan_exists,
    convert_env,
    convert_volume_policy,
    convert_port_policy,
    convert_required_label,
    convert_required_annotation,
    convert_disallowed_annotation,
    convert_required_image_label,
    convert_disallowed_image_label,
    convert_privileged,
    convert_process_policy,
    convert_host_mount_policy,
    convert_process_baseline,
    convert_fixed_by,
    convert_read_only_root_fs,
    convert_cvss,
    convert_drop_capabilities,
    convert_add_capabilities,
    convert_permission_policy,
    convert_port_exposure_policy,
];

/// Converts `policy` in place when it is a legacy policy.
///
/// Current policies are left untouched. A legacy policy that already has
/// sections keeps them; the converted sections are appended.
pub fn ensure_converted(policy: &mut Policy) -> Result<()> {
    let version = policy.policy_version.as_str();
    if version != LEGACY_VERSION && version != CURRENT_VERSION {
        return Err(PolicyError::UnsupportedVersion(version.to_string()));
    }
    if version == CURRENT_VERSION {
        if policy.policy_sections.is_empty() {
            return Err(PolicyError::InvalidPolicy(format!(
                "policy {:?} has no sections",
                policy.name
            )));
        }
        return Ok(());
    }
    if policy.fields.is_none() && policy.policy_sections.is_empty() {
        return Err(PolicyError::InvalidPolicy(format!(
            "legacy policy {:?} has neither fields nor sections",
            policy.name
        )));
    }

    let converted = policy
        .fields
        .take()
        .map(|fields| convert_fields_to_sections(&fields))
        .unwrap_or_default();
    log::debug!(
        "converted legacy policy {:?} into {} section(s)",
        policy.name,
        converted.len()
    );
    policy.policy_sections.extend(converted);
    policy.policy_version = CURRENT_VERSION.to_string();
    Ok(())
}

/// Returns a converted copy, leaving `policy` untouched.
pub fn clone_and_ensure_converted(policy: &Policy) -> Result<Policy> {
    let mut cloned = policy.clone();
    ensure_converted(&mut cloned)?;
    Ok(cloned)
}

pub fn convert_fields_to_sections(fields: &PolicyFields) -> Vec<PolicySection> {
    let and_groups: Vec<PolicyGroup> = AND_FIELD_CONVERTERS
        .iter()
        .flat_map(|convert| convert(fields))
        .collect();
    let or_groups = convert_container_resource_policy(fields);

    if or_groups.is_empty() {
        if and_groups.is_empty() {
            return Vec::new();
        }
        return vec![PolicySection::new("", and_groups)];
    }

    or_groups
        .into_iter()
        .map(|or_group| {
            let mut groups = and_groups.clone();
            groups.push(or_group);
            PolicySection::new("", groups)
        })
        .collect()
}

fn group(field: &str, value: impl Into<String>) -> Vec<PolicyGroup> {
    let value: String = value.into();
    vec![PolicyGroup::new(field, [value])]
}

fn numerical_value(policy: &NumericalPolicy) -> String {
    let op = match policy.op {
        Comparator::Equals => return format!("{:.6}", policy.value),
        Comparator::GreaterThan => ">",
        Comparator::GreaterThanOrEquals => ">=",
        Comparator::LessThan => "<",
        Comparator::LessThanOrEquals => "<=",
    };
    format!("{op} {:.6}", policy.value)
}

fn numerical_group(policy: &NumericalPolicy, field: &str) -> PolicyGroup {
    PolicyGroup::new(field, [numerical_value(policy)])
}

fn key_value_group(policy: Option<&KeyValuePolicy>, field: &str) -> Vec<PolicyGroup> {
    policy
        .map(|p| group(field, format!("{}={}", p.key, p.value)))
        .unwrap_or_default()
}

fn non_empty(field: &str, value: &str) -> Vec<PolicyGroup> {
    if value.is_empty() {
        Vec::new()
    } else {
        group(field, value)
    }
}

fn convert_image_name(fields: &PolicyFields) -> Vec<PolicyGroup> {
    let Some(p) = &fields.image_name else {
        return Vec::new();
    };
    let mut groups = non_empty(names::IMAGE_REGISTRY, &p.registry);
    if !p.remote.is_empty() {
        groups.extend(group(names::IMAGE_REMOTE, format!("r/.*{}.*", p.remote)));
    }
    groups.extend(non_empty(names::IMAGE_TAG, &p.tag));
    groups
}

fn convert_image_age_days(fields: &PolicyFields) -> Vec<PolicyGroup> {
    fields
        .image_age_days
        .map(|days| group(names::IMAGE_AGE, days.to_string()))
        .unwrap_or_default()
}

fn convert_dockerfile_line(fields: &PolicyFields) -> Vec<PolicyGroup> {
    fields
        .line_rule
        .as_ref()
        .map(|rule| group(names::DOCKERFILE_LINE, format!("{}={}", rule.instruction, rule.value)))
        .unwrap_or_default()
}

fn convert_cve(fields: &PolicyFields) -> Vec<PolicyGroup> {
    non_empty(names::CVE, &fields.cve)
}

fn convert_component(fields: &PolicyFields) -> Vec<PolicyGroup> {
    fields
        .component
        .as_ref()
        .map(|c| group(names::IMAGE_COMPONENT, format!("{}={}", c.name, c.version)))
        .unwrap_or_default()
}

fn convert_scan_age_days(fields: &PolicyFields) -> Vec<PolicyGroup> {
    fields
        .scan_age_days
        .map(|days| group(names::IMAGE_SCAN_AGE, days.to_string()))
        .unwrap_or_default()
}

fn convert_no_scan_exists(fields: &PolicyFields) -> Vec<PolicyGroup> {
    fields
        .no_scan_exists
        .map(|b| group(names::UNSCANNED_IMAGE, b.to_string()))
        .unwrap_or_default()
}

fn convert_env(fields: &PolicyFields) -> Vec<PolicyGroup> {
    fields
        .env
        .as_ref()
        .map(|p| {
            group(
                names::ENVIRONMENT_VARIABLE,
                format!("{}={}={}", p.env_var_source.as_str(), p.key, p.value),
            )
        })
        .unwrap_or_default()
}

fn convert_volume_policy(fields: &PolicyFields) -> Vec<PolicyGroup> {
    let Some(p) = &fields.volume_policy else {
        return Vec::new();
    };
    let mut groups = non_empty(names::VOLUME_NAME, &p.name);
    groups.extend(non_empty(names::VOLUME_TYPE, &p.volume_type));
    groups.extend(non_empty(names::VOLUME_DESTINATION, &p.destination));
    groups.extend(non_empty(names::VOLUME_SOURCE, &p.source));
    if let Some(read_only) = p.read_only {
        groups.extend(group(names::WRITABLE_MOUNTED_VOLUME, (!read_only).to_string()));
    }
    groups
}

fn convert_port_policy(fields: &PolicyFields) -> Vec<PolicyGroup> {
    let Some(p) = &fields.port_policy else {
        return Vec::new();
    };
    let mut groups = Vec::new();
    if p.port != 0 {
        groups.extend(group(names::EXPOSED_PORT, p.port.to_string()));
    }
    groups.extend(non_empty(names::EXPOSED_PORT_PROTOCOL, &p.protocol));
    groups
}

fn convert_required_label(fields: &PolicyFields) -> Vec<PolicyGroup> {
    key_value_group(fields.required_label.as_ref(), names::REQUIRED_LABEL)
}

fn convert_required_annotation(fields: &PolicyFields) -> Vec<PolicyGroup> {
    key_value_group(fields.required_annotation.as_ref(), names::REQUIRED_ANNOTATION)
}

fn convert_disallowed_annotation(fields: &PolicyFields) -> Vec<PolicyGroup> {
    key_value_group(fields.disallowed_annotation.as_ref(), names::DISALLOWED_ANNOTATION)
}

fn convert_required_image_label(fields: &PolicyFields) -> Vec<PolicyGroup> {
    key_value_group(fields.required_image_label.as_ref(), names::REQUIRED_IMAGE_LABEL)
}

fn convert_disallowed_image_label(fields: &PolicyFields) -> Vec<PolicyGroup> {
    key_value_group(fields.disallowed_image_label.as_ref(), names::DISALLOWED_IMAGE_LABEL)
}

fn convert_privileged(fields: &PolicyFields) -> Vec<PolicyGroup> {
    fields
        .privileged
        .map(|b| group(names::PRIVILEGED_CONTAINER, b.to_string()))
        .unwrap_or_default()
}

fn convert_process_policy(fields: &PolicyFields) -> Vec<PolicyGroup> {
    let Some(p) = &fields.process_policy else {
        return Vec::new();
    };
    let mut groups = non_empty(names::PROCESS_NAME, &p.name);
    groups.extend(non_empty(names::PROCESS_ANCESTOR, &p.ancestor));
    groups.extend(non_empty(names::PROCESS_ARGUMENTS, &p.args));
    groups.extend(non_empty(names::PROCESS_UID, &p.uid));
    groups
}

fn convert_host_mount_policy(fields: &PolicyFields) -> Vec<PolicyGroup> {
    fields
        .host_mount_policy
        .as_ref()
        .and_then(|p| p.read_only)
        .map(|read_only| group(names::WRITABLE_HOST_MOUNT, (!read_only).to_string()))
        .unwrap_or_default()
}

fn convert_process_baseline(fields: &PolicyFields) -> Vec<PolicyGroup> {
    fields
        .whitelist_enabled
        .map(|b| group(names::UNEXPECTED_PROCESS_EXECUTED, b.to_string()))
        .unwrap_or_default()
}

fn convert_fixed_by(fields: &PolicyFields) -> Vec<PolicyGroup> {
    non_empty(names::FIXED_BY, &fields.fixed_by)
}

fn convert_read_only_root_fs(fields: &PolicyFields) -> Vec<PolicyGroup> {
    fields
        .read_only_root_fs
        .map(|b| group(names::READ_ONLY_ROOT_FS, b.to_string()))
        .unwrap_or_default()
}

fn convert_cvss(fields: &PolicyFields) -> Vec<PolicyGroup> {
    fields
        .cvss
        .as_ref()
        .map(|p| vec![numerical_group(p, names::CVSS)])
        .unwrap_or_default()
}

fn capabilities_group(field: &str, caps: Option<&Vec<String>>) -> Vec<PolicyGroup> {
    match caps {
        Some(caps) if !caps.is_empty() => vec![PolicyGroup::new(field, caps.iter().cloned())
            .with_operator(BooleanOperator::Or)],
        _ => Vec::new(),
    }
}

fn convert_drop_capabilities(fields: &PolicyFields) -> Vec<PolicyGroup> {
    capabilities_group(names::DROP_CAPS, fields.drop_capabilities.as_ref())
}

fn convert_add_capabilities(fields: &PolicyFields) -> Vec<PolicyGroup> {
    capabilities_group(names::ADD_CAPS, fields.add_capabilities.as_ref())
}

fn convert_permission_policy(fields: &PolicyFields) -> Vec<PolicyGroup> {
    fields
        .permission_policy
        .as_ref()
        .map(|p| group(names::MINIMUM_RBAC_PERMISSIONS, p.permission_level.as_str()))
        .unwrap_or_default()
}

fn convert_port_exposure_policy(fields: &PolicyFields) -> Vec<PolicyGroup> {
    match &fields.port_exposure_policy {
        Some(p) if !p.exposure_levels.is_empty() => vec![PolicyGroup::new(
            names::PORT_EXPOSURE,
            p.exposure_levels.iter().map(|level| level.as_str()),
        )],
        _ => Vec::new(),
    }
}

fn convert_container_resource_policy(fields: &PolicyFields) -> Vec<PolicyGroup> {
    let Some(p) = &fields.container_resource_policy else {
        return Vec::new();
    };
    [
        (p.cpu_resource_limit.as_ref(), names::CONTAINER_CPU_LIMIT),
        (p.cpu_resource_request.as_ref(), names::CONTAINER_CPU_REQUEST),
        (p.memory_resource_limit.as_ref(), names::CONTAINER_MEM_LIMIT),
        (p.memory_resource_request.as_ref(), names::CONTAINER_MEM_REQUEST),
    ]
    .into_iter()
    .filter_map(|(policy, field)| policy.map(|policy| numerical_group(policy, field)))
    .collect()
}
