//! Deploy-time detection over a set of policies.
//!
//! Each deployment is matched against every policy with one
//! [`CacheReceptacle`], so its tree is built once per deployment rather than
//! once per policy. Large batches are spread over the rayon thread pool, one
//! receptacle per deployment.

use crate::config::{DetectorConfig, EngineConfig};
use crate::error::Result;
use crate::matcher::{CacheReceptacle, DeploymentMatcher, MatcherBuilder};
use crate::objects::EnhancedDeployment;
use crate::policy::Policy;
use crate::violations::Violations;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Violations of one policy by one object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub policy_name: String,
    pub violations: Violations,
}

#[derive(Debug)]
pub struct DeploymentDetector {
    matchers: Vec<DeploymentMatcher>,
    config: DetectorConfig,
}

impl DeploymentDetector {
    /// Compiles `policies` with the process-wide configuration.
    pub fn new(policies: &[Policy]) -> Result<Self> {
        Self::with_builder(
            policies,
            &MatcherBuilder::default(),
            EngineConfig::global().detector.clone(),
        )
    }

    pub fn with_builder(
        policies: &[Policy],
        builder: &MatcherBuilder,
        config: DetectorConfig,
    ) -> Result<Self> {
        let matchers = policies
            .iter()
            .map(|policy| builder.build_deployment_matcher(policy))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { matchers, config })
    }

    pub fn policy_count(&self) -> usize {
        self.matchers.len()
    }

    /// One alert per violated policy, in policy order.
    pub fn detect(&self, enhanced: &EnhancedDeployment) -> Result<Vec<Alert>> {
        let mut cache = CacheReceptacle::new();
        let mut alerts = Vec::new();
        for matcher in &self.matchers {
            let violations = matcher.match_deployment(Some(&mut cache), enhanced)?;
            if !violations.is_empty() {
                alerts.push(Alert {
                    policy_name: matcher.policy().name.clone(),
                    violations,
                });
            }
        }
        Ok(alerts)
    }

    /// Alerts for each deployment, in input order. Any failed deployment
    /// fails the whole batch.
    pub fn detect_batch(&self, deployments: &[EnhancedDeployment]) -> Result<Vec<Vec<Alert>>> {
        if deployments.len() > self.config.parallel_threshold {
            deployments
                .par_iter()
                .map(|enhanced| self.detect(enhanced))
                .collect()
        } else {
            deployments.iter().map(|enhanced| self.detect(enhanced)).collect()
        }
    }
}
