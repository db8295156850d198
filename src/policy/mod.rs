//! Policy data model.
//!
//! A [`Policy`] is an ordered list of [`PolicySection`]s. The policy matches
//! an object when any section matches; a section matches when all of its
//! [`PolicyGroup`]s match. Each group constrains one registered field.
//!
//! Policies are plain serde types so they can be loaded from YAML or JSON:
//!
//! ```rust
//! use policy_engine::policy::Policy;
//!
//! let policy = Policy::from_yaml_str(r#"
//! name: Latest tag
//! policyVersion: "1.1"
//! lifecycleStages: [DEPLOY]
//! policySections:
//!   - policyGroups:
//!       - fieldName: Image Tag
//!         values: [latest]
//! "#)?;
//! assert_eq!(policy.policy_sections[0].policy_groups[0].field_name, "Image Tag");
//! # Ok::<(), policy_engine::PolicyError>(())
//! ```

pub mod legacy;

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

pub use legacy::PolicyFields;

/// Version tag of policies written with sections and groups.
pub const CURRENT_VERSION: &str = "1.1";

/// Version tag of policies that still carry the flat legacy field struct.
pub const LEGACY_VERSION: &str = "";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleStage {
    Build,
    Deploy,
    Runtime,
}

impl fmt::Display for LifecycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleStage::Build => "BUILD",
            LifecycleStage::Deploy => "DEPLOY",
            LifecycleStage::Runtime => "RUNTIME",
        };
        f.write_str(name)
    }
}

/// Which stream of runtime events a policy is evaluated against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventSource {
    #[default]
    NotApplicable,
    DeploymentEvent,
    AuditLogEvent,
}

/// How the values of a single group combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BooleanOperator {
    #[default]
    Or,
    And,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyValue {
    pub value: String,
}

impl From<&str> for PolicyValue {
    fn from(value: &str) -> Self {
        Self {
            value: value.to_string(),
        }
    }
}

impl From<String> for PolicyValue {
    fn from(value: String) -> Self {
        Self { value }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyGroup {
    pub field_name: String,
    #[serde(default)]
    pub boolean_operator: BooleanOperator,
    #[serde(default)]
    pub negate: bool,
    #[serde(default)]
    pub values: Vec<PolicyValue>,
}

impl PolicyGroup {
    pub fn new<I, V>(field_name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<PolicyValue>,
    {
        Self {
            field_name: field_name.to_string(),
            boolean_operator: BooleanOperator::Or,
            negate: false,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn negated(mut self) -> Self {
        self.negate = true;
        self
    }

    pub fn with_operator(mut self, operator: BooleanOperator) -> Self {
        self.boolean_operator = operator;
        self
    }

    pub fn value_strings(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|v| v.value.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicySection {
    #[serde(default)]
    pub section_name: String,
    #[serde(default)]
    pub policy_groups: Vec<PolicyGroup>,
}

impl PolicySection {
    pub fn new(section_name: &str, policy_groups: Vec<PolicyGroup>) -> Self {
        Self {
            section_name: section_name.to_string(),
            policy_groups,
        }
    }

    /// Name used when reporting problems with this section.
    pub fn display_name(&self, index: usize) -> String {
        if self.section_name.is_empty() {
            format!("#{}", index + 1)
        } else {
            self.section_name.clone()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub policy_version: String,
    #[serde(default)]
    pub lifecycle_stages: Vec<LifecycleStage>,
    #[serde(default)]
    pub event_source: EventSource,
    #[serde(default)]
    pub policy_sections: Vec<PolicySection>,
    /// Flat legacy criteria. Only present on policies that predate sections.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<PolicyFields>,
}

impl Policy {
    /// Creates a current-version policy from its sections.
    pub fn new(name: &str, policy_sections: Vec<PolicySection>) -> Self {
        Self {
            name: name.to_string(),
            policy_version: CURRENT_VERSION.to_string(),
            policy_sections,
            ..Default::default()
        }
    }

    /// Creates a legacy policy carrying only flat fields.
    pub fn legacy(name: &str, fields: PolicyFields) -> Self {
        Self {
            name: name.to_string(),
            policy_version: LEGACY_VERSION.to_string(),
            fields: Some(fields),
            ..Default::default()
        }
    }

    pub fn with_stages(mut self, stages: &[LifecycleStage]) -> Self {
        self.lifecycle_stages = stages.to_vec();
        self
    }

    pub fn with_event_source(mut self, source: EventSource) -> Self {
        self.event_source = source;
        self
    }

    pub fn is_legacy(&self) -> bool {
        self.policy_version == LEGACY_VERSION
    }

    pub fn has_stage(&self, stage: LifecycleStage) -> bool {
        self.lifecycle_stages.contains(&stage)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_policy_from_yaml() {
        let yaml = r#"
name: Privileged with latest tag
policyVersion: "1.1"
lifecycleStages: [DEPLOY, RUNTIME]
policySections:
  - sectionName: first
    policyGroups:
      - fieldName: Privileged Container
        values: ["true"]
      - fieldName: Image Tag
        booleanOperator: AND
        negate: true
        values: [latest, stable]
"#;
        let policy = Policy::from_yaml_str(yaml).unwrap();
        assert_eq!(policy.name, "Privileged with latest tag");
        assert!(!policy.is_legacy());
        assert!(policy.has_stage(LifecycleStage::Runtime));
        assert!(!policy.has_stage(LifecycleStage::Build));
        assert_eq!(policy.event_source, EventSource::NotApplicable);

        let section = &policy.policy_sections[0];
        assert_eq!(section.section_name, "first");
        let tag = &section.policy_groups[1];
        assert_eq!(tag.boolean_operator, BooleanOperator::And);
        assert!(tag.negate);
        assert_eq!(tag.value_strings().collect::<Vec<_>>(), vec!["latest", "stable"]);
    }

    #[test]
    fn test_policy_from_json_with_legacy_fields() {
        let json = r#"{
            "name": "legacy",
            "fields": { "privileged": true, "cve": "CVE-2017-5638" }
        }"#;
        let policy = Policy::from_json_str(json).unwrap();
        assert!(policy.is_legacy());
        let fields = policy.fields.unwrap();
        assert_eq!(fields.privileged, Some(true));
        assert_eq!(fields.cve, "CVE-2017-5638");
    }

    #[test]
    fn test_policy_from_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "name: file policy\npolicyVersion: \"1.1\"\npolicySections:\n  - policyGroups:\n      - fieldName: Namespace\n        values: [kube-system]"
        )
        .unwrap();

        let policy = Policy::from_yaml_file(file.path()).unwrap();
        assert_eq!(policy.name, "file policy");
        assert_eq!(policy.policy_sections[0].policy_groups[0].field_name, "Namespace");

        let missing = Policy::from_yaml_file("/nonexistent/policy.yaml");
        assert!(matches!(missing, Err(crate::PolicyError::Io(_))));
    }

    #[test]
    fn test_builders() {
        let group = PolicyGroup::new("CVSS", [">= 7"])
            .negated()
            .with_operator(BooleanOperator::And);
        assert!(group.negate);
        assert_eq!(group.boolean_operator, BooleanOperator::And);

        let section = PolicySection::new("", vec![group]);
        assert_eq!(section.display_name(2), "#3");

        let policy = Policy::new("p", vec![section]).with_stages(&[LifecycleStage::Deploy]);
        assert_eq!(policy.policy_version, CURRENT_VERSION);
        assert_eq!(LifecycleStage::Deploy.to_string(), "DEPLOY");
    }
}
