//! Per-object-kind policy matchers.
//!
//! A matcher is built once per policy and reused for many objects. Building
//! converts legacy policies, rejects sections that mix runtime categories and
//! compiles every relevant section into an evaluator.
//!
//! Runtime matchers also keep a prefilter: for each section, an evaluator
//! over the runtime fields alone, run against the small process, event or
//! flow tree. When no prefilter accepts, the deployment tree is never built.
//! Sections without fields of the category prefilter as always true, since
//! a deploy-time section can not be ruled out by the event alone.
//!
//! # Example
//!
//! ```rust
//! use policy_engine::matcher::{build_deployment_matcher, CacheReceptacle};
//! use policy_engine::objects::{Container, Deployment, EnhancedDeployment};
//! use policy_engine::policy::{Policy, PolicyGroup, PolicySection};
//!
//! let policy = Policy::new("latest tag", vec![PolicySection::new("", vec![
//!     PolicyGroup::new("Image Tag", ["latest"]),
//! ])]);
//! let matcher = build_deployment_matcher(&policy)?;
//!
//! let deployment = Deployment {
//!     id: "d1".to_string(),
//!     containers: vec![Container::new("web", "nginx:latest")],
//!     ..Default::default()
//! };
//! let enhanced = EnhancedDeployment::new(deployment, vec![]);
//!
//! let mut cache = CacheReceptacle::new();
//! let violations = matcher.match_deployment(Some(&mut cache), &enhanced)?;
//! assert_eq!(
//!     violations.alert_violations[0].message,
//!     "Container 'web' has image with tag 'latest'"
//! );
//! # Ok::<(), policy_engine::PolicyError>(())
//! ```

pub mod audit;
pub mod cache;
pub mod deployment;
pub mod image;
pub mod kube_event;
pub mod network_flow;
pub mod process;

pub use audit::AuditLogEventMatcher;
pub use cache::{CacheReceptacle, CacheStats};
pub use deployment::DeploymentMatcher;
pub use image::ImageMatcher;
pub use kube_event::KubeEventMatcher;
pub use network_flow::DeploymentWithNetworkFlowMatcher;
pub use process::DeploymentWithProcessMatcher;

use crate::augment::{AugmentedObj, ObjectKind};
use crate::compiler::{
    contains_discrete_runtime_field_category_sections, section_runtime_categories, section_to_query,
    section_type_to_field_queries,
};
use crate::convert::clone_and_ensure_converted;
use crate::error::Result;
use crate::evaluator::{AlwaysTrue, Evaluator, EvaluatorFactory};
use crate::fields::RuntimeFieldCategory;
use crate::policy::{LifecycleStage, Policy, PolicySection};
use crate::query::Query;
use crate::violations::{render, ProcessViolation, RuntimeEvent, Violations};
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Debug)]
struct CompiledSection {
    section: PolicySection,
    evaluator: Arc<dyn Evaluator>,
}

/// The compiled sections of one policy for one object kind.
#[derive(Debug)]
pub(crate) struct SectionSet {
    policy: Policy,
    stage: LifecycleStage,
    sections: Vec<CompiledSection>,
}

impl SectionSet {
    /// Converts and checks `policy`, then compiles the sections `keep`
    /// accepts given their runtime categories.
    fn compile<F>(
        factory: &EvaluatorFactory,
        policy: &Policy,
        kind: ObjectKind,
        stage: LifecycleStage,
        keep: F,
    ) -> Result<Self>
    where
        F: Fn(&BTreeSet<RuntimeFieldCategory>) -> bool,
    {
        let policy = clone_and_ensure_converted(policy)?;
        contains_discrete_runtime_field_category_sections(&policy.policy_sections)?;

        let mut sections = Vec::new();
        for section in &policy.policy_sections {
            if !keep(&section_runtime_categories(section)?) {
                continue;
            }
            let query = section_to_query(section, stage)?;
            sections.push(CompiledSection {
                section: section.clone(),
                evaluator: factory.generate_evaluator(kind, &query)?,
            });
        }
        Ok(Self {
            policy,
            stage,
            sections,
        })
    }

    pub(crate) fn policy(&self) -> &Policy {
        &self.policy
    }

    pub(crate) fn len(&self) -> usize {
        self.sections.len()
    }

    /// Evaluates every section and aggregates the rendered violations.
    fn evaluate(
        &self,
        obj: &AugmentedObj,
        event: Option<RuntimeEvent<'_>>,
    ) -> Result<Violations> {
        let mut violations = Violations::default();
        let mut process_matched = false;
        for compiled in &self.sections {
            let Some(result) = compiled.evaluator.evaluate(obj) else {
                continue;
            };
            let output = render(self.stage, &compiled.section, &result, event)?;
            process_matched |= output.is_process;
            violations.extend_alerts(output.violations);
        }

        if process_matched {
            if let Some(indicator) = event.and_then(RuntimeEvent::process) {
                violations.process_violation = Some(ProcessViolation::new(indicator));
            }
        }
        Ok(violations)
    }

    /// Per-section evaluators over the fields of `category` only.
    fn prefilter(
        &self,
        factory: &EvaluatorFactory,
        category: RuntimeFieldCategory,
        kind: ObjectKind,
    ) -> Result<Prefilter> {
        let mut evaluators = Vec::with_capacity(self.sections.len());
        for compiled in &self.sections {
            let field_queries = section_type_to_field_queries(&compiled.section, category)?;
            let evaluator: Arc<dyn Evaluator> = if field_queries.is_empty() {
                Arc::new(AlwaysTrue)
            } else {
                factory.generate_evaluator(kind, &Query::new(field_queries))?
            };
            evaluators.push(evaluator);
        }
        Ok(Prefilter { kind, evaluators })
    }
}

/// Cheap first phase of a runtime matcher.
#[derive(Debug)]
pub(crate) struct Prefilter {
    kind: ObjectKind,
    evaluators: Vec<Arc<dyn Evaluator>>,
}

impl Prefilter {
    /// Whether any section could still match given the event alone.
    fn accepts(&self, obj: &AugmentedObj, policy: &Policy) -> bool {
        let accepted = self.evaluators.iter().any(|e| e.evaluate(obj).is_some());
        if !accepted {
            log::trace!("{} prefilter rejected policy {:?}", self.kind, policy.name);
        }
        accepted
    }
}

/// Sections without runtime fields.
fn deploy_time(categories: &BTreeSet<RuntimeFieldCategory>) -> bool {
    categories.is_empty()
}

/// Sections of `category` alone or without runtime fields. Sections that
/// also reach into audit log fields only compile against audit log events.
fn runtime_or_deploy_time(
    category: RuntimeFieldCategory,
) -> impl Fn(&BTreeSet<RuntimeFieldCategory>) -> bool {
    move |categories| categories.iter().all(|c| *c == category)
}

/// Builds matchers with an explicit evaluator factory.
#[derive(Debug, Clone)]
pub struct MatcherBuilder {
    factory: EvaluatorFactory,
}

impl Default for MatcherBuilder {
    /// Uses the factory configured from the environment.
    fn default() -> Self {
        Self::new(EvaluatorFactory::global().clone())
    }
}

impl MatcherBuilder {
    pub fn new(factory: EvaluatorFactory) -> Self {
        Self { factory }
    }

    pub fn factory(&self) -> &EvaluatorFactory {
        &self.factory
    }

    /// Compiles the deploy-time sections of `policy` against deployments.
    pub fn build_deployment_matcher(&self, policy: &Policy) -> Result<DeploymentMatcher> {
        let sections = SectionSet::compile(
            &self.factory,
            policy,
            ObjectKind::Deployment,
            LifecycleStage::Deploy,
            deploy_time,
        )?;
        Ok(DeploymentMatcher::new(sections))
    }

    /// Compiles the deploy-time sections of `policy` against images.
    pub fn build_image_matcher(&self, policy: &Policy) -> Result<ImageMatcher> {
        let sections = SectionSet::compile(
            &self.factory,
            policy,
            ObjectKind::Image,
            LifecycleStage::Build,
            deploy_time,
        )?;
        Ok(ImageMatcher::new(sections))
    }

    pub fn build_deployment_with_process_matcher(
        &self,
        policy: &Policy,
    ) -> Result<DeploymentWithProcessMatcher> {
        let sections = SectionSet::compile(
            &self.factory,
            policy,
            ObjectKind::DeploymentWithProcess,
            LifecycleStage::Runtime,
            runtime_or_deploy_time(RuntimeFieldCategory::Process),
        )?;
        let prefilter =
            sections.prefilter(&self.factory, RuntimeFieldCategory::Process, ObjectKind::Process)?;
        Ok(DeploymentWithProcessMatcher::new(sections, prefilter))
    }

    pub fn build_kube_event_matcher(&self, policy: &Policy) -> Result<KubeEventMatcher> {
        let sections = SectionSet::compile(
            &self.factory,
            policy,
            ObjectKind::DeploymentWithKubeEvent,
            LifecycleStage::Runtime,
            runtime_or_deploy_time(RuntimeFieldCategory::KubeEvent),
        )?;
        let prefilter = sections.prefilter(
            &self.factory,
            RuntimeFieldCategory::KubeEvent,
            ObjectKind::KubeEvent,
        )?;
        Ok(KubeEventMatcher::new(sections, prefilter))
    }

    pub fn build_deployment_with_network_flow_matcher(
        &self,
        policy: &Policy,
    ) -> Result<DeploymentWithNetworkFlowMatcher> {
        let sections = SectionSet::compile(
            &self.factory,
            policy,
            ObjectKind::DeploymentWithNetworkFlow,
            LifecycleStage::Runtime,
            runtime_or_deploy_time(RuntimeFieldCategory::NetworkFlow),
        )?;
        let prefilter = sections.prefilter(
            &self.factory,
            RuntimeFieldCategory::NetworkFlow,
            ObjectKind::NetworkFlow,
        )?;
        Ok(DeploymentWithNetworkFlowMatcher::new(sections, prefilter))
    }

    /// Compiles the sections of `policy` that constrain Kubernetes event or
    /// audit log fields. Audit log events carry no deployment, so other
    /// sections are skipped.
    pub fn build_audit_log_event_matcher(&self, policy: &Policy) -> Result<AuditLogEventMatcher> {
        let sections = SectionSet::compile(
            &self.factory,
            policy,
            ObjectKind::AuditLogEvent,
            LifecycleStage::Runtime,
            |categories| {
                !categories.is_empty()
                    && categories.iter().all(|c| {
                        matches!(
                            c,
                            RuntimeFieldCategory::KubeEvent | RuntimeFieldCategory::AuditLogEvent
                        )
                    })
            },
        )?;
        Ok(AuditLogEventMatcher::new(sections))
    }
}

pub fn build_deployment_matcher(policy: &Policy) -> Result<DeploymentMatcher> {
    MatcherBuilder::default().build_deployment_matcher(policy)
}

pub fn build_image_matcher(policy: &Policy) -> Result<ImageMatcher> {
    MatcherBuilder::default().build_image_matcher(policy)
}

pub fn build_deployment_with_process_matcher(
    policy: &Policy,
) -> Result<DeploymentWithProcessMatcher> {
    MatcherBuilder::default().build_deployment_with_process_matcher(policy)
}

pub fn build_kube_event_matcher(policy: &Policy) -> Result<KubeEventMatcher> {
    MatcherBuilder::default().build_kube_event_matcher(policy)
}

pub fn build_deployment_with_network_flow_matcher(
    policy: &Policy,
) -> Result<DeploymentWithNetworkFlowMatcher> {
    MatcherBuilder::default().build_deployment_with_network_flow_matcher(policy)
}

pub fn build_audit_log_event_matcher(policy: &Policy) -> Result<AuditLogEventMatcher> {
    MatcherBuilder::default().build_audit_log_event_matcher(policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::augment::{
        build_deployment, build_kube_event, build_process, with_kube_event, with_process,
    };
    use crate::config::EvaluatorMode;
    use crate::error::PolicyError;
    use crate::fields::{names, registry};
    use crate::objects::{
        ApiVerb, Container, Deployment, EnhancedDeployment, KubeObject, KubeResource,
        KubernetesEvent, ProcessIndicator,
    };
    use crate::policy::{BooleanOperator, PolicyGroup};
    use proptest::prelude::*;

    fn builder() -> MatcherBuilder {
        MatcherBuilder::new(EvaluatorFactory::new(EvaluatorMode::Baseline))
    }

    #[test]
    fn test_mixed_categories_rejected_at_build() {
        let policy = Policy::new(
            "mixed",
            vec![PolicySection::new(
                "",
                vec![
                    PolicyGroup::new(names::PROCESS_NAME, ["bash"]),
                    PolicyGroup::new(names::KUBE_RESOURCE, ["PODS_EXEC"]),
                ],
            )],
        );
        assert!(matches!(
            builder().build_deployment_with_process_matcher(&policy),
            Err(PolicyError::MixedRuntimeCategories { .. })
        ));
        assert!(matches!(
            builder().build_deployment_matcher(&policy),
            Err(PolicyError::MixedRuntimeCategories { .. })
        ));
    }

    #[test]
    fn test_sections_filtered_by_category() {
        let policy = Policy::new(
            "split",
            vec![
                PolicySection::new(
                    "deploy",
                    vec![PolicyGroup::new(names::PRIVILEGED_CONTAINER, ["true"])],
                ),
                PolicySection::new(
                    "process",
                    vec![PolicyGroup::new(names::PROCESS_NAME, ["bash"])],
                ),
                PolicySection::new(
                    "flow",
                    vec![PolicyGroup::new(names::UNEXPECTED_NETWORK_FLOW_DETECTED, ["true"])],
                ),
            ],
        );
        let b = builder();
        assert_eq!(b.build_deployment_matcher(&policy).unwrap().section_count(), 1);
        let process = b.build_deployment_with_process_matcher(&policy).unwrap();
        assert_eq!(process.section_count(), 2);
        let flow = b.build_deployment_with_network_flow_matcher(&policy).unwrap();
        assert_eq!(flow.section_count(), 2);
    }

    #[test]
    fn test_audit_sections_only_reach_the_audit_matcher() {
        let policy = Policy::new(
            "audit",
            vec![
                PolicySection::new(
                    "audit",
                    vec![
                        PolicyGroup::new(names::KUBE_RESOURCE, ["SECRETS"]),
                        PolicyGroup::new(names::KUBE_USER_NAME, ["mallory"]),
                    ],
                ),
                PolicySection::new(
                    "exec",
                    vec![PolicyGroup::new(names::KUBE_RESOURCE, ["PODS_EXEC"])],
                ),
            ],
        );
        let b = builder();
        assert_eq!(b.build_kube_event_matcher(&policy).unwrap().section_count(), 1);
        assert_eq!(b.build_audit_log_event_matcher(&policy).unwrap().section_count(), 2);
    }

    #[test]
    fn test_empty_section_is_an_error() {
        let policy = Policy::new("empty", vec![PolicySection::new("s", vec![])]);
        assert!(matches!(
            builder().build_deployment_matcher(&policy),
            Err(PolicyError::EmptySection(_))
        ));
    }

    #[test]
    fn test_legacy_policy_is_converted() {
        use crate::policy::legacy::{Comparator, NumericalPolicy, PolicyFields};
        let fields = PolicyFields {
            cvss: Some(NumericalPolicy {
                op: Comparator::GreaterThanOrEquals,
                value: 7.0,
            }),
            ..Default::default()
        };
        let matcher = builder().build_image_matcher(&Policy::legacy("old", fields)).unwrap();
        assert_eq!(matcher.policy().policy_version, crate::policy::CURRENT_VERSION);
        assert_eq!(matcher.section_count(), 1);
    }

    type FieldTable = &'static [(&'static str, &'static [&'static str])];

    const PROCESS_FIELDS: FieldTable = &[
        (names::PROCESS_NAME, &["bash", "sh", "curl", "nginx"]),
        (names::PROCESS_ARGUMENTS, &["-c ls", "-i", ".*daemon.*"]),
        (names::PROCESS_ANCESTOR, &["/bin/bash", "/bin/sh", "/usr/bin/curl"]),
        (names::PROCESS_UID, &["0", "1000"]),
        (names::UNEXPECTED_PROCESS_EXECUTED, &["true"]),
    ];

    const KUBE_FIELDS: FieldTable = &[
        (names::KUBE_RESOURCE, &["PODS_EXEC", "PODS_PORTFORWARD"]),
        (names::KUBE_API_VERB, &["CREATE", "GET"]),
    ];

    const DEPLOY_FIELDS: FieldTable = &[
        (names::CONTAINER_NAME, &["web", "db"]),
        (names::IMAGE_TAG, &["latest", "1.0"]),
        (names::PRIVILEGED_CONTAINER, &["true"]),
    ];

    const MODES: [EvaluatorMode; 3] =
        [EvaluatorMode::Baseline, EvaluatorMode::Literal, EvaluatorMode::Shadow];
    const CONTAINERS: &[&str] = &["web", "db"];
    const TAGS: &[&str] = &["latest", "1.0"];
    const BINARIES: &[&str] = &["/bin/bash", "/bin/sh", "/usr/bin/curl", "/usr/sbin/nginx"];
    const ARGS: &[&str] = &["", "-c ls", "-i", "-g daemon off"];

    /// A group over one field of `table`, negated only where the field
    /// allows it.
    fn arb_group(table: FieldTable) -> impl Strategy<Value = PolicyGroup> {
        prop::sample::select(table).prop_flat_map(|(field, values)| {
            (
                prop::sample::subsequence(values.to_vec(), 1..=values.len()),
                any::<bool>(),
                any::<bool>(),
            )
                .prop_map(move |(chosen, all, negate)| {
                    let mut group = PolicyGroup::new(field, chosen);
                    if all {
                        group = group.with_operator(BooleanOperator::And);
                    }
                    let forbidden = registry()
                        .lookup(field)
                        .map_or(true, |metadata| metadata.negation_forbidden());
                    if negate && !forbidden {
                        group = group.negated();
                    }
                    group
                })
        })
    }

    fn arb_section(runtime: FieldTable) -> impl Strategy<Value = PolicySection> {
        (
            prop::collection::vec(arb_group(runtime), 1..4),
            prop::option::of(arb_group(DEPLOY_FIELDS)),
        )
            .prop_map(|(mut groups, deploy)| {
                groups.extend(deploy);
                let mut seen = BTreeSet::new();
                groups.retain(|group| seen.insert(group.field_name.clone()));
                PolicySection::new("", groups)
            })
    }

    fn arb_runtime_policy(runtime: FieldTable) -> impl Strategy<Value = Policy> {
        (
            prop::collection::vec(arb_section(runtime), 1..3),
            prop::option::of(arb_group(DEPLOY_FIELDS)),
        )
            .prop_map(|(mut sections, deploy_only)| {
                if let Some(group) = deploy_only {
                    sections.push(PolicySection::new("deploy", vec![group]));
                }
                Policy::new("generated", sections).with_stages(&[LifecycleStage::Runtime])
            })
    }

    fn arb_deployment() -> impl Strategy<Value = EnhancedDeployment> {
        (
            prop::sample::select(TAGS),
            prop::sample::select(TAGS),
            any::<bool>(),
        )
            .prop_map(|(web_tag, db_tag, privileged)| {
                let mut web = Container::new("web", &format!("nginx:{web_tag}"));
                web.security_context.privileged = privileged;
                let db = Container::new("db", &format!("postgres:{db_tag}"));
                EnhancedDeployment::new(
                    Deployment {
                        id: "dep".to_string(),
                        containers: vec![web, db],
                        ..Default::default()
                    },
                    vec![],
                )
            })
    }

    fn arb_indicator() -> impl Strategy<Value = ProcessIndicator> {
        (
            prop::sample::select(CONTAINERS),
            prop::sample::select(BINARIES),
            prop::sample::select(ARGS),
            prop::sample::select(vec![0u32, 1000]),
            prop::sample::subsequence(BINARIES.to_vec(), 0..3),
        )
            .prop_map(|(container, path, args, uid, lineage)| {
                let mut indicator = ProcessIndicator::new("proc", container, path, args);
                indicator.signal.uid = uid;
                indicator.signal.lineage = lineage.into_iter().map(str::to_string).collect();
                indicator
            })
    }

    fn arb_kube_event() -> impl Strategy<Value = KubernetesEvent> {
        (
            prop::sample::select(vec![
                KubeResource::PodsExec,
                KubeResource::PodsPortforward,
                KubeResource::Secrets,
            ]),
            prop::sample::select(vec![ApiVerb::Create, ApiVerb::Get, ApiVerb::Delete]),
        )
            .prop_map(|(resource, api_verb)| KubernetesEvent {
                id: "event".to_string(),
                object: KubeObject {
                    name: "web-1".to_string(),
                    resource,
                    namespace: "default".to_string(),
                    ..Default::default()
                },
                api_verb,
                ..Default::default()
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(128))]

        /// When the process prefilter rejects, evaluating every compiled
        /// section on the joined tree finds nothing, and the two-phase match
        /// always equals the unfiltered evaluation.
        #[test]
        fn prop_process_prefilter_rejects_only_clean_processes(
            policy in arb_runtime_policy(PROCESS_FIELDS),
            enhanced in arb_deployment(),
            indicator in arb_indicator(),
            not_in_baseline in any::<bool>(),
        ) {
            let deployment = build_deployment(&enhanced).unwrap();
            let process = build_process(&indicator, not_in_baseline);
            let full = with_process(&deployment, &indicator, &process).unwrap();
            for mode in MODES {
                let factory = EvaluatorFactory::new(mode);
                let sections = SectionSet::compile(
                    &factory,
                    &policy,
                    ObjectKind::DeploymentWithProcess,
                    LifecycleStage::Runtime,
                    runtime_or_deploy_time(RuntimeFieldCategory::Process),
                )
                .unwrap();
                let prefilter = sections
                    .prefilter(&factory, RuntimeFieldCategory::Process, ObjectKind::Process)
                    .unwrap();
                let unfiltered = sections
                    .evaluate(&full, Some(RuntimeEvent::Process(&indicator)))
                    .unwrap();
                if !prefilter.accepts(&process, &policy) {
                    prop_assert!(unfiltered.is_empty(), "mode {}: {:?}", mode, unfiltered);
                }

                let matched = MatcherBuilder::new(factory)
                    .build_deployment_with_process_matcher(&policy)
                    .unwrap()
                    .match_deployment_with_process(None, &enhanced, &indicator, not_in_baseline)
                    .unwrap();
                prop_assert_eq!(matched, unfiltered, "mode {}", mode);
            }
        }

        /// Same as above for Kubernetes events joined with their deployment.
        #[test]
        fn prop_kube_event_prefilter_rejects_only_clean_events(
            policy in arb_runtime_policy(KUBE_FIELDS),
            enhanced in arb_deployment(),
            event in arb_kube_event(),
        ) {
            let deployment = build_deployment(&enhanced).unwrap();
            let event_obj = build_kube_event(&event, ObjectKind::KubeEvent).unwrap();
            let full = with_kube_event(&deployment, &event_obj).unwrap();
            for mode in MODES {
                let factory = EvaluatorFactory::new(mode);
                let sections = SectionSet::compile(
                    &factory,
                    &policy,
                    ObjectKind::DeploymentWithKubeEvent,
                    LifecycleStage::Runtime,
                    runtime_or_deploy_time(RuntimeFieldCategory::KubeEvent),
                )
                .unwrap();
                let prefilter = sections
                    .prefilter(&factory, RuntimeFieldCategory::KubeEvent, ObjectKind::KubeEvent)
                    .unwrap();
                let unfiltered = sections
                    .evaluate(&full, Some(RuntimeEvent::KubeEvent(&event)))
                    .unwrap();
                if !prefilter.accepts(&event_obj, &policy) {
                    prop_assert!(unfiltered.is_empty(), "mode {}: {:?}", mode, unfiltered);
                }

                let matched = MatcherBuilder::new(factory)
                    .build_kube_event_matcher(&policy)
                    .unwrap()
                    .match_kube_event(None, &event, &enhanced)
                    .unwrap();
                prop_assert_eq!(matched, unfiltered, "mode {}", mode);
            }
        }
    }
}
