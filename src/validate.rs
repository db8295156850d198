//! Structural and value-level policy validation.
//!
//! Validation runs every check and reports every defect at once. Matchers do
//! not call it; they only reject what would make compilation impossible.

use crate::compiler::check_section_categories;
use crate::error::ValidationErrors;
use crate::fields::{names, registry};
use crate::policy::{
    EventSource, LifecycleStage, Policy, PolicyGroup, PolicySection, CURRENT_VERSION,
};
use std::collections::HashSet;

/// Switches for the conditional value grammars.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidateOptions {
    /// Environment variables sourced from secrets, config maps or fields must
    /// not carry a value.
    pub env_var_source_restrictions: bool,
    /// Use the audit log grammars for Kubernetes verbs and resources.
    pub source_is_audit_log_events: bool,
}

/// Event source the fields of a policy must apply to.
pub fn effective_event_source(policy: &Policy) -> EventSource {
    if policy.event_source == EventSource::AuditLogEvent {
        EventSource::AuditLogEvent
    } else if policy.has_stage(LifecycleStage::Runtime) {
        EventSource::DeploymentEvent
    } else {
        EventSource::NotApplicable
    }
}

/// Checks a policy against the field registry.
///
/// # Examples
///
/// ```rust
/// use policy_engine::policy::{Policy, PolicyGroup, PolicySection};
/// use policy_engine::validate::{validate, ValidateOptions};
///
/// let policy = Policy::new("bad", vec![PolicySection::new("", vec![
///     PolicyGroup::new("No Such Field", ["x"]),
///     PolicyGroup::new("CVSS", ["high"]),
/// ])]);
/// let errors = validate(&policy, &ValidateOptions::default()).unwrap_err();
/// assert_eq!(errors.len(), 2);
/// ```
pub fn validate(policy: &Policy, options: &ValidateOptions) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if policy.policy_version != CURRENT_VERSION {
        errors.push(format!(
            "policy version {:?} is not supported, expected {CURRENT_VERSION:?}",
            policy.policy_version
        ));
    }
    if policy.name.trim().is_empty() {
        errors.push("policy must have a name");
    }
    if policy.policy_sections.is_empty() {
        errors.push("policy must have at least one section");
    }

    let source = effective_event_source(policy);
    let options = ValidateOptions {
        source_is_audit_log_events: options.source_is_audit_log_events
            || source == EventSource::AuditLogEvent,
        ..*options
    };

    for (index, section) in policy.policy_sections.iter().enumerate() {
        let section_name = section.display_name(index);
        if section.policy_groups.is_empty() {
            errors.push(format!("section {section_name} has no groups"));
        }

        let mut seen = HashSet::new();
        for group in &section.policy_groups {
            if !seen.insert(group.field_name.as_str()) {
                errors.push(format!(
                    "section {section_name} contains field {:?} more than once",
                    group.field_name
                ));
            }
            validate_group(group, &section_name, source, &options, &mut errors);
        }

        // unknown fields are already reported per group
        let known = PolicySection {
            policy_groups: section
                .policy_groups
                .iter()
                .filter(|group| registry().get(&group.field_name).is_some())
                .cloned()
                .collect(),
            ..section.clone()
        };
        if let Err(err) = check_section_categories(&known, index) {
            errors.push(err.to_string());
        }

        if source == EventSource::AuditLogEvent {
            for required in [names::KUBE_RESOURCE, names::KUBE_API_VERB] {
                if !seen.contains(required) {
                    errors.push(format!(
                        "audit log policy section {section_name} must constrain {required:?}"
                    ));
                }
            }
        }
    }

    errors.into_result()
}

fn validate_group(
    group: &PolicyGroup,
    section_name: &str,
    source: EventSource,
    options: &ValidateOptions,
    errors: &mut ValidationErrors,
) {
    let field = &group.field_name;
    let Some(metadata) = registry().get(field) else {
        errors.push(format!("section {section_name}: unknown field {field:?}"));
        return;
    };

    if group.values.is_empty() {
        errors.push(format!("section {section_name}: field {field:?} has no values"));
    }
    if group.negate && metadata.negation_forbidden() {
        errors.push(format!(
            "section {section_name}: field {field:?} does not allow negation"
        ));
    }
    if metadata.operators_forbidden() && group.values.len() > 1 {
        errors.push(format!(
            "section {section_name}: field {field:?} takes a single value, found {}",
            group.values.len()
        ));
    }
    if !metadata.applies_to(source) {
        errors.push(format!(
            "section {section_name}: field {field:?} does not apply to {} policies",
            match source {
                EventSource::NotApplicable => "deploy or build time",
                EventSource::DeploymentEvent => "deployment event",
                EventSource::AuditLogEvent => "audit log event",
            }
        ));
    }

    let grammar = metadata.value_regex(options);
    for value in group.value_strings() {
        if !grammar.is_match(value) {
            errors.push(format!(
                "section {section_name}: value {value:?} is invalid for field {field:?}"
            ));
        }
    }
}
