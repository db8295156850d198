//! Fixtures shared by the integration tests.
#![allow(dead_code)]

use policy_engine::config::EvaluatorMode;
use policy_engine::evaluator::EvaluatorFactory;
use policy_engine::matcher::MatcherBuilder;
use policy_engine::objects::{
    Container, Deployment, EmbeddedComponent, EnhancedDeployment, Image, ImageScan,
    ProcessIndicator, Severity, Vulnerability,
};
use policy_engine::policy::{LifecycleStage, Policy, PolicyGroup, PolicySection};

pub const ALL_MODES: [EvaluatorMode; 3] =
    [EvaluatorMode::Baseline, EvaluatorMode::Literal, EvaluatorMode::Shadow];

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn builder(mode: EvaluatorMode) -> MatcherBuilder {
    MatcherBuilder::new(EvaluatorFactory::new(mode))
}

pub fn baseline() -> MatcherBuilder {
    builder(EvaluatorMode::Baseline)
}

/// A single-section policy.
pub fn policy(name: &str, groups: Vec<PolicyGroup>) -> Policy {
    Policy::new(name, vec![PolicySection::new("", groups)])
}

pub fn runtime_policy(name: &str, sections: Vec<PolicySection>) -> Policy {
    Policy::new(name, sections).with_stages(&[LifecycleStage::Runtime])
}

pub fn deployment(id: &str, containers: Vec<Container>) -> EnhancedDeployment {
    EnhancedDeployment::new(
        Deployment {
            id: id.to_string(),
            name: format!("{id}-name"),
            namespace: "default".to_string(),
            containers,
            ..Default::default()
        },
        vec![],
    )
}

pub fn privileged(mut container: Container) -> Container {
    container.security_context.privileged = true;
    container
}

pub fn process(id: &str, container: &str, path: &str, args: &str) -> ProcessIndicator {
    ProcessIndicator::new(id, container, path, args)
}

/// An image whose scan found a fixable struts vulnerability.
pub fn struts_image() -> Image {
    let mut image = Image::new("docker.io/library/struts:2.3");
    image.id = "sha256:struts".to_string();
    image.scan = Some(ImageScan {
        operating_system: "debian:9".to_string(),
        components: vec![EmbeddedComponent {
            name: "struts".to_string(),
            version: "2.3.12".to_string(),
            vulns: vec![Vulnerability {
                cve: "CVE-2017-5638".to_string(),
                cvss: 9.8,
                severity: Severity::Critical,
                fixed_by: "2.3.32".to_string(),
            }],
        }],
        ..Default::default()
    });
    image
}
