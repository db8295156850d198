use super::cache::{augmented, deployment_identity, kube_event_identity, CacheReceptacle, Slot};
use super::{Prefilter, SectionSet};
use crate::augment::{build_deployment, build_kube_event, with_kube_event, ObjectKind};
use crate::error::Result;
use crate::objects::{EnhancedDeployment, KubernetesEvent};
use crate::policy::Policy;
use crate::violations::{RuntimeEvent, Violations};

/// Matches Kubernetes API requests seen by the admission controller against
/// the deployment they target.
#[derive(Debug)]
pub struct KubeEventMatcher {
    sections: SectionSet,
    prefilter: Prefilter,
}

impl KubeEventMatcher {
    pub(crate) fn new(sections: SectionSet, prefilter: Prefilter) -> Self {
        Self { sections, prefilter }
    }

    pub fn policy(&self) -> &Policy {
        self.sections.policy()
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn match_kube_event(
        &self,
        mut cache: Option<&mut CacheReceptacle>,
        event: &KubernetesEvent,
        enhanced: &EnhancedDeployment,
    ) -> Result<Violations> {
        let identity = kube_event_identity(event);
        let event_obj = augmented(cache.as_deref_mut(), Slot::KubeEvent, &identity, || {
            build_kube_event(event, ObjectKind::KubeEvent)
        })?;
        if !self.prefilter.accepts(&event_obj, self.policy()) {
            return Ok(Violations::default());
        }

        let deployment = augmented(cache, Slot::Deployment, &deployment_identity(enhanced), || {
            build_deployment(enhanced)
        })?;
        let full = with_kube_event(&deployment, &event_obj)?;
        self.sections.evaluate(&full, Some(RuntimeEvent::KubeEvent(event)))
    }
}
