//! Violation records and message rendering.
//!
//! A matched section is rendered by the printers of its fields. Process and
//! Kubernetes event fields have no printer of their own: they mark the match
//! so the matcher can summarise the process. Kubernetes events and network
//! flows are described from the event or flow itself.

mod printers;

use crate::error::Result;
use crate::evaluator::EvalResult;
use crate::fields::{registry, RuntimeFieldCategory};
use crate::objects::{KubeResource, KubernetesEvent, NetworkFlowDetails, ProcessIndicator};
use crate::policy::{LifecycleStage, PolicySection};
use printers::{PrintContext, Printer};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationType {
    #[default]
    Generic,
    K8sEvent,
    NetworkFlow,
    NetworkPolicy,
    FileAccess,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertViolation {
    pub message: String,
    #[serde(rename = "type")]
    pub violation_type: ViolationType,
}

impl AlertViolation {
    pub fn new(message: impl Into<String>, violation_type: ViolationType) -> Self {
        Self {
            message: message.into(),
            violation_type,
        }
    }

    pub fn generic(message: impl Into<String>) -> Self {
        Self::new(message, ViolationType::Generic)
    }
}

/// The offending process and a summary of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessViolation {
    pub message: String,
    pub processes: Vec<ProcessIndicator>,
}

impl ProcessViolation {
    pub fn new(indicator: &ProcessIndicator) -> Self {
        Self {
            message: process_message(indicator),
            processes: vec![indicator.clone()],
        }
    }
}

/// Result of matching one object against one policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violations {
    pub alert_violations: Vec<AlertViolation>,
    pub process_violation: Option<ProcessViolation>,
}

impl Violations {
    pub fn is_empty(&self) -> bool {
        self.alert_violations.is_empty() && self.process_violation.is_none()
    }

    /// Appends alerts whose message has not been seen yet.
    pub(crate) fn extend_alerts(&mut self, alerts: impl IntoIterator<Item = AlertViolation>) {
        for alert in alerts {
            if !self.alert_violations.iter().any(|a| a.message == alert.message) {
                self.alert_violations.push(alert);
            }
        }
    }
}

/// The runtime object a deployment was joined with, if any.
#[derive(Debug, Clone, Copy)]
pub enum RuntimeEvent<'a> {
    Process(&'a ProcessIndicator),
    KubeEvent(&'a KubernetesEvent),
    NetworkFlow(&'a NetworkFlowDetails),
}

impl<'a> RuntimeEvent<'a> {
    pub fn process(self) -> Option<&'a ProcessIndicator> {
        match self {
            RuntimeEvent::Process(indicator) => Some(indicator),
            _ => None,
        }
    }

    pub fn kube_event(self) -> Option<&'a KubernetesEvent> {
        match self {
            RuntimeEvent::KubeEvent(event) => Some(event),
            _ => None,
        }
    }

    pub fn network_flow(self) -> Option<&'a NetworkFlowDetails> {
        match self {
            RuntimeEvent::NetworkFlow(flow) => Some(flow),
            _ => None,
        }
    }
}

/// Rendered alerts of one matched section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOutput {
    pub violations: Vec<AlertViolation>,
    /// A process field constrained the section.
    pub is_process: bool,
    /// A Kubernetes event or audit log field constrained the section.
    pub is_kube_event: bool,
    /// A network flow field constrained the section.
    pub is_network_flow: bool,
}

/// Renders the violations of a section that matched.
///
/// Every match map is run through the printer of every field in the
/// section, each printer once even when several of its fields appear.
/// Repeated messages are dropped, keeping the first.
pub fn render(
    stage: LifecycleStage,
    section: &PolicySection,
    result: &EvalResult,
    event: Option<RuntimeEvent<'_>>,
) -> Result<RenderOutput> {
    let registry = registry();
    let process = event.and_then(RuntimeEvent::process);
    let mut output = RenderOutput::default();
    let mut selected: Vec<Printer> = Vec::new();

    for group in &section.policy_groups {
        let metadata = registry.lookup(&group.field_name)?;
        match metadata.runtime_category() {
            Some(RuntimeFieldCategory::Process) => output.is_process = true,
            Some(RuntimeFieldCategory::KubeEvent | RuntimeFieldCategory::AuditLogEvent) => {
                output.is_kube_event = true
            }
            Some(RuntimeFieldCategory::NetworkFlow) => output.is_network_flow = true,
            _ => {}
        }
        if let Some(printer) = printers::for_field(metadata.name()) {
            if !selected.contains(&printer) {
                selected.push(printer);
            }
        }
    }

    let mut alerts = Violations::default();
    for map in &result.matches {
        let ctx = PrintContext { map, process };
        for printer in &selected {
            let violation_type = printer.violation_type();
            alerts.extend_alerts(
                printer
                    .print(&ctx)
                    .into_iter()
                    .map(|message| AlertViolation::new(message, violation_type)),
            );
        }
    }

    if output.is_kube_event {
        if let Some(event) = event.and_then(RuntimeEvent::kube_event) {
            alerts.extend_alerts([kube_event_violation(event)]);
        }
    }
    if output.is_network_flow {
        if let Some(flow) = event.and_then(RuntimeEvent::network_flow) {
            alerts.extend_alerts([network_flow_violation(flow)]);
        }
    }

    if stage == LifecycleStage::Runtime && output.is_process && process.is_none() {
        log::debug!(
            "process section {:?} rendered without a process indicator",
            section.section_name
        );
    }

    output.violations = alerts.alert_violations;
    Ok(output)
}

/// Summary of an offending process.
pub fn process_message(indicator: &ProcessIndicator) -> String {
    let signal = &indicator.signal;
    if signal.args.is_empty() {
        format!(
            "Binary '{}' executed without arguments under user ID {}",
            signal.exec_file_path, signal.uid
        )
    } else {
        format!(
            "Binary '{}' executed with arguments '{}' under user ID {}",
            signal.exec_file_path, signal.args, signal.uid
        )
    }
}

/// The single alert describing a Kubernetes event.
pub fn kube_event_violation(event: &KubernetesEvent) -> AlertViolation {
    let object = &event.object;
    let message = match object.resource {
        KubeResource::PodsExec => {
            let (container, commands) = event
                .pod_exec_args
                .as_ref()
                .map(|args| (args.container.as_str(), args.commands.join(" ")))
                .unwrap_or_default();
            format!(
                "Kubernetes API received exec '{commands}' request into pod '{}' container '{container}'",
                object.name
            )
        }
        KubeResource::PodsPortforward => {
            let ports = event
                .pod_port_forward_args
                .as_ref()
                .map(|args| {
                    args.ports
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .unwrap_or_default();
            format!(
                "Kubernetes API received port forward request to pod '{}' ports '{ports}'",
                object.name
            )
        }
        resource => {
            let mut message = format!(
                "Kubernetes API received {} request for {} '{}'",
                event.api_verb.as_str(),
                resource.display_name(),
                object.name
            );
            if !object.namespace.is_empty() {
                message.push_str(&format!(" in namespace '{}'", object.namespace));
            }
            if !event.user.username.is_empty() {
                message.push_str(&format!(" by user '{}'", event.user.username));
            }
            message
        }
    };
    AlertViolation::new(message, ViolationType::K8sEvent)
}

/// The single alert describing a network flow outside the baseline.
pub fn network_flow_violation(flow: &NetworkFlowDetails) -> AlertViolation {
    AlertViolation::new(
        format!(
            "Unexpected network flow found in deployment. Source name: '{}'. \
             Destination name: '{}'. Destination port: '{}'. Protocol: '{}'.",
            flow.src_entity_name,
            flow.dst_entity_name,
            flow.dst_port,
            flow.protocol.as_str()
        ),
        ViolationType::NetworkFlow,
    )
}
