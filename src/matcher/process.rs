use super::cache::{augmented, deployment_identity, process_identity, CacheReceptacle, Slot};
use super::{Prefilter, SectionSet};
use crate::augment::{build_deployment, build_process, with_process};
use crate::error::Result;
use crate::objects::{EnhancedDeployment, ProcessIndicator};
use crate::policy::Policy;
use crate::violations::{RuntimeEvent, Violations};

/// Matches a process running in a deployment.
#[derive(Debug)]
pub struct DeploymentWithProcessMatcher {
    sections: SectionSet,
    prefilter: Prefilter,
}

impl DeploymentWithProcessMatcher {
    pub(crate) fn new(sections: SectionSet, prefilter: Prefilter) -> Self {
        Self { sections, prefilter }
    }

    pub fn policy(&self) -> &Policy {
        self.sections.policy()
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Matches `indicator` as run by `enhanced`. `not_in_baseline` tells
    /// whether the process is outside the deployment's process baseline.
    pub fn match_deployment_with_process(
        &self,
        mut cache: Option<&mut CacheReceptacle>,
        enhanced: &EnhancedDeployment,
        indicator: &ProcessIndicator,
        not_in_baseline: bool,
    ) -> Result<Violations> {
        let identity = format!("{}:{not_in_baseline}", process_identity(indicator));
        let process = augmented(cache.as_deref_mut(), Slot::Process, &identity, || {
            Ok(build_process(indicator, not_in_baseline))
        })?;
        if !self.prefilter.accepts(&process, self.policy()) {
            return Ok(Violations::default());
        }

        let deployment = augmented(cache, Slot::Deployment, &deployment_identity(enhanced), || {
            build_deployment(enhanced)
        })?;
        let full = with_process(&deployment, indicator, &process)?;
        self.sections.evaluate(&full, Some(RuntimeEvent::Process(indicator)))
    }
}
