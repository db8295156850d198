//! Properties that must hold for any input: every backend agrees and
//! caching never changes a result.

mod common;

use common::*;
use policy_engine::config::EvaluatorMode;
use policy_engine::fields::names;
use policy_engine::matcher::{
    AuditLogEventMatcher, CacheReceptacle, DeploymentMatcher, DeploymentWithNetworkFlowMatcher,
    DeploymentWithProcessMatcher, ImageMatcher, KubeEventMatcher,
};
use policy_engine::objects::{
    ApiVerb, Container, EnhancedDeployment, Image, KubeResource, KubernetesEvent, L4Protocol,
    NetworkFlowDetails, ProcessIndicator,
};
use policy_engine::policy::{BooleanOperator, Policy, PolicyGroup, PolicySection};
use policy_engine::Violations;
use proptest::prelude::*;

const CONTAINER_NAMES: &[&str] = &["web", "db", "cache"];
const TAGS: &[&str] = &["latest", "LATEST", "1.0", "stable", "2.3-alpine"];

fn arb_container() -> impl Strategy<Value = Container> {
    (
        prop::sample::select(CONTAINER_NAMES),
        prop::sample::select(TAGS),
        any::<bool>(),
    )
        .prop_map(|(name, tag, is_privileged)| {
            let container = Container::new(name, &format!("nginx:{tag}"));
            if is_privileged {
                privileged(container)
            } else {
                container
            }
        })
}

fn arb_deployment(id: String) -> impl Strategy<Value = EnhancedDeployment> {
    prop::collection::vec(arb_container(), 1..4)
        .prop_map(move |containers| deployment(&id, containers))
}

/// A deployment running every container in `CONTAINER_NAMES`.
fn arb_full_deployment(id: String) -> impl Strategy<Value = EnhancedDeployment> {
    prop::collection::vec((prop::sample::select(TAGS), any::<bool>()), CONTAINER_NAMES.len())
        .prop_map(move |images| {
            let containers = CONTAINER_NAMES
                .iter()
                .zip(images)
                .map(|(name, (tag, is_privileged))| {
                    let container = Container::new(name, &format!("nginx:{tag}"));
                    if is_privileged {
                        privileged(container)
                    } else {
                        container
                    }
                })
                .collect();
            deployment(&id, containers)
        })
}

fn arb_operator() -> impl Strategy<Value = BooleanOperator> {
    prop_oneof![Just(BooleanOperator::Or), Just(BooleanOperator::And)]
}

fn arb_tag_group() -> impl Strategy<Value = PolicyGroup> {
    (
        prop::sample::subsequence(TAGS.to_vec(), 1..3),
        arb_operator(),
        any::<bool>(),
    )
        .prop_map(|(tags, operator, negate)| {
            let group = PolicyGroup::new(names::IMAGE_TAG, tags).with_operator(operator);
            if negate {
                group.negated()
            } else {
                group
            }
        })
}

fn arb_deploy_policy() -> impl Strategy<Value = Policy> {
    (
        arb_tag_group(),
        prop::option::of(prop::sample::select(CONTAINER_NAMES)),
        any::<bool>(),
    )
        .prop_map(|(tag, container, with_privileged)| {
            let mut groups = vec![tag];
            if let Some(name) = container {
                groups.push(PolicyGroup::new(names::CONTAINER_NAME, [name]));
            }
            if with_privileged {
                groups.push(PolicyGroup::new(names::PRIVILEGED_CONTAINER, ["true"]));
            }
            policy("generated", groups)
        })
}

/// One matcher call, naming its inputs by index into a [`Pool`].
#[derive(Debug, Clone)]
enum Call {
    Deployment(usize),
    Image(usize),
    Process {
        deployment: usize,
        process: usize,
        not_in_baseline: bool,
    },
    KubeEvent {
        deployment: usize,
        event: usize,
    },
    NetworkFlow {
        deployment: usize,
        flow: usize,
    },
    AuditLogEvent(usize),
}

fn arb_call() -> impl Strategy<Value = Call> {
    prop_oneof![
        (0..3usize).prop_map(Call::Deployment),
        (0..2usize).prop_map(Call::Image),
        (0..3usize, 0..3usize, any::<bool>()).prop_map(|(deployment, process, not_in_baseline)| {
            Call::Process {
                deployment,
                process,
                not_in_baseline,
            }
        }),
        (0..3usize, 0..2usize)
            .prop_map(|(deployment, event)| Call::KubeEvent { deployment, event }),
        (0..3usize, 0..2usize)
            .prop_map(|(deployment, flow)| Call::NetworkFlow { deployment, flow }),
        (0..2usize).prop_map(Call::AuditLogEvent),
    ]
}

/// Objects with stable identities, so a repeated call hits the cache.
struct Pool {
    deployments: [EnhancedDeployment; 3],
    images: [Image; 2],
    processes: [ProcessIndicator; 3],
    events: [KubernetesEvent; 2],
    flows: [NetworkFlowDetails; 2],
}

fn nginx_image() -> Image {
    let mut image = Image::new("docker.io/library/nginx:latest");
    image.id = "sha256:nginx".to_string();
    image
}

fn kube_events() -> [KubernetesEvent; 2] {
    let mut exec = KubernetesEvent::default();
    exec.id = "e1".to_string();
    exec.object.name = "a-1".to_string();
    exec.object.namespace = "default".to_string();
    exec.object.resource = KubeResource::PodsExec;
    exec.api_verb = ApiVerb::Create;

    let mut read = KubernetesEvent::default();
    read.id = "e2".to_string();
    read.object.name = "db-password".to_string();
    read.object.namespace = "default".to_string();
    read.object.resource = KubeResource::Secrets;
    read.api_verb = ApiVerb::Get;
    read.user.username = "alice".to_string();
    [exec, read]
}

fn flow(dst: &str, not_in_network_baseline: bool) -> NetworkFlowDetails {
    NetworkFlowDetails {
        src_entity_name: "web".to_string(),
        src_entity_type: "DEPLOYMENT".to_string(),
        dst_entity_name: dst.to_string(),
        dst_entity_type: "DEPLOYMENT".to_string(),
        dst_port: 5432,
        protocol: L4Protocol::Tcp,
        not_in_network_baseline,
        last_seen: None,
    }
}

/// A policy with a section for every matcher kind.
fn every_kind_policy(tag: PolicyGroup) -> Policy {
    runtime_policy(
        "every kind",
        vec![
            PolicySection::new("tag", vec![tag]),
            PolicySection::new(
                "shell",
                vec![PolicyGroup::new(names::PROCESS_NAME, ["bash", "sh"])],
            ),
            PolicySection::new(
                "unexpected process",
                vec![PolicyGroup::new(names::UNEXPECTED_PROCESS_EXECUTED, ["true"])],
            ),
            PolicySection::new(
                "exec",
                vec![PolicyGroup::new(names::KUBE_RESOURCE, ["PODS_EXEC"])],
            ),
            PolicySection::new(
                "secret reads",
                vec![
                    PolicyGroup::new(names::KUBE_RESOURCE, ["SECRETS"]),
                    PolicyGroup::new(names::KUBE_API_VERB, ["GET"]),
                    PolicyGroup::new(names::KUBE_USER_NAME, ["alice"]),
                ],
            ),
            PolicySection::new(
                "unexpected flow",
                vec![PolicyGroup::new(names::UNEXPECTED_NETWORK_FLOW_DETECTED, ["true"])],
            ),
        ],
    )
}

struct Matchers {
    deployment: DeploymentMatcher,
    image: ImageMatcher,
    process: DeploymentWithProcessMatcher,
    kube_event: KubeEventMatcher,
    network_flow: DeploymentWithNetworkFlowMatcher,
    audit: AuditLogEventMatcher,
}

impl Matchers {
    fn build(policy: &Policy) -> Self {
        let builder = baseline();
        Self {
            deployment: builder.build_deployment_matcher(policy).unwrap(),
            image: builder.build_image_matcher(policy).unwrap(),
            process: builder.build_deployment_with_process_matcher(policy).unwrap(),
            kube_event: builder.build_kube_event_matcher(policy).unwrap(),
            network_flow: builder.build_deployment_with_network_flow_matcher(policy).unwrap(),
            audit: builder.build_audit_log_event_matcher(policy).unwrap(),
        }
    }

    fn call(&self, pool: &Pool, call: &Call, cache: Option<&mut CacheReceptacle>) -> Violations {
        match *call {
            Call::Deployment(d) => self.deployment.match_deployment(cache, &pool.deployments[d]),
            Call::Image(i) => self.image.match_image(cache, &pool.images[i]),
            Call::Process {
                deployment,
                process,
                not_in_baseline,
            } => self.process.match_deployment_with_process(
                cache,
                &pool.deployments[deployment],
                &pool.processes[process],
                not_in_baseline,
            ),
            Call::KubeEvent { deployment, event } => self.kube_event.match_kube_event(
                cache,
                &pool.events[event],
                &pool.deployments[deployment],
            ),
            Call::NetworkFlow { deployment, flow } => {
                self.network_flow.match_deployment_with_network_flow(
                    cache,
                    &pool.deployments[deployment],
                    &pool.flows[flow],
                )
            }
            Call::AuditLogEvent(e) => self.audit.match_audit_log_event(cache, &pool.events[e]),
        }
        .unwrap()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Every backend mode produces the same violations.
    #[test]
    fn prop_backends_agree(
        policy in arb_deploy_policy(),
        enhanced in arb_deployment("dep".to_string()),
    ) {
        let expected = baseline()
            .build_deployment_matcher(&policy)
            .unwrap()
            .match_deployment(None, &enhanced)
            .unwrap();
        for mode in [EvaluatorMode::Literal, EvaluatorMode::Shadow] {
            let actual = builder(mode)
                .build_deployment_matcher(&policy)
                .unwrap()
                .match_deployment(None, &enhanced)
                .unwrap();
            prop_assert_eq!(&actual, &expected, "mode {}", mode);
        }
    }

    /// Every matcher kind, called in any order through one receptacle,
    /// answers as it does without a cache.
    #[test]
    fn prop_cache_is_transparent(
        tag in arb_tag_group(),
        deployments in (
            arb_full_deployment("a".to_string()),
            arb_full_deployment("b".to_string()),
            arb_full_deployment("c".to_string()),
        ),
        calls in prop::collection::vec(arb_call(), 1..24),
    ) {
        let pool = Pool {
            deployments: [deployments.0, deployments.1, deployments.2],
            images: [struts_image(), nginx_image()],
            processes: [
                process("p1", "web", "/bin/bash", "-c ls"),
                process("p2", "db", "/usr/bin/curl", ""),
                process("p3", "cache", "/bin/sh", "-i"),
            ],
            events: kube_events(),
            flows: [flow("db", true), flow("cache", false)],
        };
        let matchers = Matchers::build(&every_kind_policy(tag));

        let mut cache = CacheReceptacle::new();
        for call in calls {
            let cached = matchers.call(&pool, &call, Some(&mut cache));
            let uncached = matchers.call(&pool, &call, None);
            prop_assert_eq!(cached, uncached, "{:?}", call);
        }
    }
}

#[test]
fn test_every_mode_builds_every_matcher() {
    let policy = runtime_policy(
        "all kinds",
        vec![
            PolicySection::new("", vec![PolicyGroup::new(names::IMAGE_TAG, ["latest"])]),
            PolicySection::new("", vec![PolicyGroup::new(names::PROCESS_NAME, ["bash"])]),
        ],
    );
    for mode in ALL_MODES {
        let builder = builder(mode);
        assert_eq!(builder.build_deployment_matcher(&policy).unwrap().section_count(), 1);
        assert_eq!(builder.build_image_matcher(&policy).unwrap().section_count(), 1);
        assert_eq!(
            builder.build_deployment_with_process_matcher(&policy).unwrap().section_count(),
            2
        );
    }
}
