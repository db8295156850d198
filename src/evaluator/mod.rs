//! Evaluators: compiled queries run against augmented objects.
//!
//! A [`Query`](crate::query::Query) is laid over the [`ObjectMeta`](crate::augment::ObjectMeta)
//! of one object kind and compiled by a backend into an [`Evaluator`]. The
//! [`EvaluatorFactory`] picks the backend according to the configured
//! [`EvaluatorMode`](crate::config::EvaluatorMode).
//!
//! # Examples
//!
//! ```rust
//! use policy_engine::augment::{AugmentedObj, FieldLabel, ObjectBuilder, ObjectKind};
//! use policy_engine::config::EvaluatorMode;
//! use policy_engine::evaluator::{Evaluator, EvaluatorFactory};
//! use policy_engine::query::{FieldQuery, Query};
//!
//! let query = Query::new(vec![FieldQuery::new(FieldLabel::ImageTag, ["latest"])]);
//! let evaluator = EvaluatorFactory::new(EvaluatorMode::Baseline)
//!     .generate_evaluator(ObjectKind::Image, &query)?;
//!
//! let image = AugmentedObj::new(
//!     ObjectKind::Image,
//!     ObjectBuilder::new().string(FieldLabel::ImageTag, "latest").build(),
//! );
//! let result = evaluator.evaluate(&image).expect("tag matches");
//! assert_eq!(result.matches[0]["Image Tag"], vec!["latest".to_string()]);
//! # Ok::<(), policy_engine::PolicyError>(())
//! ```

pub mod baseline;
pub mod factory;
pub mod literal;

mod leaf;
mod plan;

pub use baseline::{BaselineCompiler, Comparator, ValueMatcher};
pub use factory::{Compilation, EvaluatorFactory, QueryCompiler, ShadowEvaluator};
pub use literal::LiteralCompiler;

use crate::augment::AugmentedObj;
use std::collections::BTreeMap;
use std::fmt::Debug;

/// Matched values per field name.
pub type MatchMap = BTreeMap<String, Vec<String>>;

/// A successful evaluation: one map per matching combination of array
/// elements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvalResult {
    pub matches: Vec<MatchMap>,
}

pub trait Evaluator: Send + Sync + Debug {
    /// `None` when the object does not match.
    fn evaluate(&self, obj: &AugmentedObj) -> Option<EvalResult>;
}

/// Matches every object with a single empty result.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysTrue;

impl Evaluator for AlwaysTrue {
    fn evaluate(&self, _obj: &AugmentedObj) -> Option<EvalResult> {
        Some(EvalResult {
            matches: vec![MatchMap::new()],
        })
    }
}
