use super::cache::{augmented, deployment_identity, CacheReceptacle, Slot};
use super::SectionSet;
use crate::augment::build_deployment;
use crate::error::Result;
use crate::objects::EnhancedDeployment;
use crate::policy::Policy;
use crate::violations::Violations;

/// Matches deployments, with their images, at deploy time.
#[derive(Debug)]
pub struct DeploymentMatcher {
    sections: SectionSet,
}

impl DeploymentMatcher {
    pub(crate) fn new(sections: SectionSet) -> Self {
        Self { sections }
    }

    /// The converted policy this matcher was built from.
    pub fn policy(&self) -> &Policy {
        self.sections.policy()
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn match_deployment(
        &self,
        cache: Option<&mut CacheReceptacle>,
        enhanced: &EnhancedDeployment,
    ) -> Result<Violations> {
        let obj = augmented(cache, Slot::Deployment, &deployment_identity(enhanced), || {
            build_deployment(enhanced)
        })?;
        self.sections.evaluate(&obj, None)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::EvaluatorMode;
    use crate::evaluator::EvaluatorFactory;
    use crate::fields::names;
    use crate::matcher::{CacheReceptacle, MatcherBuilder};
    use crate::objects::{Container, Deployment, EnhancedDeployment, Image};
    use crate::policy::{Policy, PolicyGroup, PolicySection};

    fn deployment(containers: Vec<Container>) -> EnhancedDeployment {
        EnhancedDeployment::new(
            Deployment {
                id: "dep-1".to_string(),
                name: "web".to_string(),
                namespace: "prod".to_string(),
                containers,
                ..Default::default()
            },
            vec![],
        )
    }

    fn matcher(groups: Vec<PolicyGroup>) -> super::DeploymentMatcher {
        MatcherBuilder::new(EvaluatorFactory::new(EvaluatorMode::Baseline))
            .build_deployment_matcher(&Policy::new("p", vec![PolicySection::new("", groups)]))
            .unwrap()
    }

    #[test]
    fn test_privileged_and_tag_must_hold_in_one_container() {
        let mut privileged = Container::new("a", "nginx:1.0");
        privileged.security_context.privileged = true;
        let latest = Container::new("b", "nginx:latest");

        let m = matcher(vec![
            PolicyGroup::new(names::PRIVILEGED_CONTAINER, ["true"]),
            PolicyGroup::new(names::IMAGE_TAG, ["latest"]),
        ]);
        let violations = m
            .match_deployment(None, &deployment(vec![privileged.clone(), latest]))
            .unwrap();
        assert!(violations.is_empty());

        let mut both = Container::new("c", "nginx:latest");
        both.security_context.privileged = true;
        let violations = m
            .match_deployment(None, &deployment(vec![privileged, both]))
            .unwrap();
        let messages: Vec<_> = violations
            .alert_violations
            .iter()
            .map(|v| v.message.as_str())
            .collect();
        assert_eq!(
            messages,
            vec!["Container 'c' is privileged", "Container 'c' has image with tag 'latest'"]
        );
    }

    #[test]
    fn test_cached_tree_is_reused() {
        let m = matcher(vec![PolicyGroup::new(names::NAMESPACE, ["prod"])]);
        let enhanced = deployment(vec![Container::new("a", "nginx")]);
        let mut cache = CacheReceptacle::new();
        for _ in 0..3 {
            let violations = m.match_deployment(Some(&mut cache), &enhanced).unwrap();
            assert_eq!(violations.alert_violations.len(), 1);
        }
        assert_eq!(cache.stats().builds, 1);
        assert_eq!(cache.stats().hits, 2);
    }

    #[test]
    fn test_image_count_mismatch_fails_the_call() {
        let m = matcher(vec![PolicyGroup::new(names::NAMESPACE, ["prod"])]);
        let mut enhanced = deployment(vec![Container::new("a", "nginx")]);
        enhanced.images = vec![Image::new("nginx"), Image::new("redis")];
        assert!(m.match_deployment(None, &enhanced).is_err());
    }
}
