//! # Policy Engine
//!
//! A library for compiling boolean security policies and evaluating them
//! against container deployments, images, processes, Kubernetes API events
//! and network flows.
//!
//! A policy is a list of sections; it is violated when any section matches.
//! A section is a list of field groups, all of which must hold. Policies are
//! compiled once into per-object-kind matchers and reused across many
//! objects.
//!
//! ## Quick Start
//!
//! ```rust
//! use policy_engine::matcher::build_deployment_matcher;
//! use policy_engine::objects::{Container, Deployment, EnhancedDeployment};
//! use policy_engine::validate::{validate, ValidateOptions};
//! use policy_engine::Policy;
//!
//! let policy = Policy::from_yaml_str(r#"
//! name: No latest tag
//! policyVersion: "1.1"
//! lifecycleStages: [DEPLOY]
//! policySections:
//!   - policyGroups:
//!       - fieldName: Image Tag
//!         values: [latest]
//! "#)?;
//! validate(&policy, &ValidateOptions::default())?;
//!
//! let matcher = build_deployment_matcher(&policy)?;
//! let deployment = EnhancedDeployment::new(
//!     Deployment {
//!         id: "d1".to_string(),
//!         containers: vec![Container::new("web", "nginx:latest")],
//!         ..Default::default()
//!     },
//!     vec![],
//! );
//!
//! let violations = matcher.match_deployment(None, &deployment)?;
//! assert_eq!(violations.alert_violations.len(), 1);
//! # Ok::<(), policy_engine::PolicyError>(())
//! ```
//!
//! ## Matching many policies
//!
//! [`DeploymentDetector`] matches one deployment against a set of policies
//! with a shared [`CacheReceptacle`], and batches of deployments in
//! parallel.
//!
//! ## Backends
//!
//! Queries are compiled by the evaluator backend selected with the
//! `POLICY_ENGINE_EVALUATOR` environment variable (see [`config`]). Every
//! backend gives the same results; they differ only in speed.

pub mod augment;
pub mod compiler;
pub mod config;
pub mod convert;
pub mod detector;
pub mod error;
pub mod evaluator;
pub mod fields;
pub mod matcher;
pub mod objects;
pub mod policy;
pub mod query;
pub mod validate;
pub mod violations;

// Core types and errors
pub use error::{PolicyError, Result, ValidationErrors};
pub use policy::{Policy, PolicyGroup, PolicySection};

// Configuration
pub use config::{EngineConfig, EvaluatorMode};

// Matching
pub use detector::{Alert, DeploymentDetector};
pub use evaluator::{Evaluator, EvaluatorFactory};
pub use matcher::{
    build_audit_log_event_matcher, build_deployment_matcher,
    build_deployment_with_network_flow_matcher, build_deployment_with_process_matcher,
    build_image_matcher, build_kube_event_matcher, CacheReceptacle, MatcherBuilder,
};
pub use violations::{AlertViolation, ProcessViolation, ViolationType, Violations};
