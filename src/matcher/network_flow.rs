use super::cache::{augmented, deployment_identity, network_flow_identity, CacheReceptacle, Slot};
use super::{Prefilter, SectionSet};
use crate::augment::{build_deployment, build_network_flow, with_network_flow};
use crate::error::Result;
use crate::objects::{EnhancedDeployment, NetworkFlowDetails};
use crate::policy::Policy;
use crate::violations::{RuntimeEvent, Violations};

/// Matches network flows of a deployment against its network baseline.
#[derive(Debug)]
pub struct DeploymentWithNetworkFlowMatcher {
    sections: SectionSet,
    prefilter: Prefilter,
}

impl DeploymentWithNetworkFlowMatcher {
    pub(crate) fn new(sections: SectionSet, prefilter: Prefilter) -> Self {
        Self { sections, prefilter }
    }

    pub fn policy(&self) -> &Policy {
        self.sections.policy()
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn match_deployment_with_network_flow(
        &self,
        mut cache: Option<&mut CacheReceptacle>,
        enhanced: &EnhancedDeployment,
        flow: &NetworkFlowDetails,
    ) -> Result<Violations> {
        let identity = network_flow_identity(flow);
        let flow_obj = augmented(cache.as_deref_mut(), Slot::NetworkFlow, &identity, || {
            Ok(build_network_flow(flow))
        })?;
        if !self.prefilter.accepts(&flow_obj, self.policy()) {
            return Ok(Violations::default());
        }

        let deployment = augmented(cache, Slot::Deployment, &deployment_identity(enhanced), || {
            build_deployment(enhanced)
        })?;
        let full = with_network_flow(&deployment, &flow_obj)?;
        self.sections.evaluate(&full, Some(RuntimeEvent::NetworkFlow(flow)))
    }
}

#[cfg(test)]
mod tests {
    use crate::config::EvaluatorMode;
    use crate::evaluator::EvaluatorFactory;
    use crate::fields::names;
    use crate::matcher::{CacheReceptacle, MatcherBuilder};
    use crate::objects::{Deployment, EnhancedDeployment, L4Protocol, NetworkFlowDetails};
    use crate::policy::{Policy, PolicyGroup, PolicySection};
    use crate::violations::ViolationType;

    fn flow(not_in_baseline: bool) -> NetworkFlowDetails {
        NetworkFlowDetails {
            src_entity_name: "web".to_string(),
            src_entity_type: "DEPLOYMENT".to_string(),
            dst_entity_name: "db".to_string(),
            dst_entity_type: "DEPLOYMENT".to_string(),
            dst_port: 5432,
            protocol: L4Protocol::Tcp,
            not_in_network_baseline: not_in_baseline,
            last_seen: None,
        }
    }

    #[test]
    fn test_flow_outside_baseline() {
        let policy = Policy::new(
            "flows",
            vec![PolicySection::new(
                "",
                vec![PolicyGroup::new(names::UNEXPECTED_NETWORK_FLOW_DETECTED, ["true"])],
            )],
        );
        let matcher = MatcherBuilder::new(EvaluatorFactory::new(EvaluatorMode::Baseline))
            .build_deployment_with_network_flow_matcher(&policy)
            .unwrap();
        let deployment = EnhancedDeployment::new(
            Deployment {
                id: "web".to_string(),
                ..Default::default()
            },
            vec![],
        );

        let mut cache = CacheReceptacle::new();
        let violations = matcher
            .match_deployment_with_network_flow(Some(&mut cache), &deployment, &flow(true))
            .unwrap();
        assert_eq!(violations.alert_violations.len(), 1);
        assert_eq!(violations.alert_violations[0].violation_type, ViolationType::NetworkFlow);
        assert_eq!(
            violations.alert_violations[0].message,
            "Unexpected network flow found in deployment. Source name: 'web'. Destination name: 'db'. Destination port: '5432'. Protocol: 'TCP'."
        );

        let known = matcher
            .match_deployment_with_network_flow(Some(&mut cache), &deployment, &flow(false))
            .unwrap();
        assert!(known.is_empty());
        assert_eq!(cache.stats().rebuilds, 1);
    }
}
