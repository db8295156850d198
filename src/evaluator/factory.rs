//! Backend selection.

use super::baseline::BaselineCompiler;
use super::literal::LiteralCompiler;
use super::{EvalResult, Evaluator};
use crate::augment::{AugmentedObj, ObjectKind, ObjectMeta};
use crate::config::{EngineConfig, EvaluatorMode};
use crate::error::{PolicyError, Result};
use crate::query::Query;
use once_cell::sync::Lazy;
use std::fmt::Debug;
use std::sync::Arc;

/// Outcome of handing a query to a backend.
#[derive(Debug)]
pub enum Compilation {
    Compiled(Arc<dyn Evaluator>),
    /// The backend can not express the query; the reason is logged.
    Unsupported(String),
}

/// A backend turning queries into evaluators over one object kind.
pub trait QueryCompiler: Send + Sync + Debug {
    fn name(&self) -> &'static str;

    fn compile_query(&self, meta: &'static ObjectMeta, query: &Query) -> Result<Compilation>;
}

/// Builds evaluators with the backends enabled by an [`EvaluatorMode`].
#[derive(Debug, Clone)]
pub struct EvaluatorFactory {
    mode: EvaluatorMode,
    baseline: Arc<dyn QueryCompiler>,
    alternates: Vec<Arc<dyn QueryCompiler>>,
}

static GLOBAL_FACTORY: Lazy<EvaluatorFactory> =
    Lazy::new(|| EvaluatorFactory::from_config(EngineConfig::global()));

impl Default for EvaluatorFactory {
    fn default() -> Self {
        Self::new(EvaluatorMode::default())
    }
}

impl EvaluatorFactory {
    pub fn new(mode: EvaluatorMode) -> Self {
        Self {
            mode,
            baseline: Arc::new(BaselineCompiler),
            alternates: vec![Arc::new(LiteralCompiler)],
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.evaluator_mode)
    }

    /// Factory configured from the process environment.
    pub fn global() -> &'static EvaluatorFactory {
        &GLOBAL_FACTORY
    }

    /// Replaces the backends tried before the baseline.
    pub fn with_alternates(mut self, alternates: Vec<Arc<dyn QueryCompiler>>) -> Self {
        self.alternates = alternates;
        self
    }

    pub fn mode(&self) -> EvaluatorMode {
        self.mode
    }

    fn baseline_evaluator(
        &self,
        meta: &'static ObjectMeta,
        query: &Query,
    ) -> Result<Arc<dyn Evaluator>> {
        match self.baseline.compile_query(meta, query)? {
            Compilation::Compiled(evaluator) => Ok(evaluator),
            Compilation::Unsupported(reason) => Err(PolicyError::EvaluatorConstruction {
                backend: self.baseline.name().to_string(),
                reason,
            }),
        }
    }

    pub fn generate_evaluator(
        &self,
        kind: ObjectKind,
        query: &Query,
    ) -> Result<Arc<dyn Evaluator>> {
        let meta = ObjectMeta::for_kind(kind);
        match self.mode {
            EvaluatorMode::Baseline => self.baseline_evaluator(meta, query),
            EvaluatorMode::Literal => {
                for backend in &self.alternates {
                    match backend.compile_query(meta, query)? {
                        Compilation::Compiled(evaluator) => return Ok(evaluator),
                        Compilation::Unsupported(reason) => {
                            log::debug!(
                                "{} backend skipped {kind} query: {reason}",
                                backend.name()
                            );
                        }
                    }
                }
                self.baseline_evaluator(meta, query)
            }
            EvaluatorMode::Shadow => {
                let baseline = self.baseline_evaluator(meta, query)?;
                let mut shadows = Vec::new();
                for backend in &self.alternates {
                    match backend.compile_query(meta, query) {
                        Ok(Compilation::Compiled(evaluator)) => {
                            shadows.push((backend.name(), evaluator))
                        }
                        Ok(Compilation::Unsupported(reason)) => {
                            log::debug!(
                                "{} backend not shadowing {kind} query: {reason}",
                                backend.name()
                            );
                        }
                        Err(err) => {
                            log::warn!(
                                "{} backend failed on a query the baseline accepted: {err}",
                                backend.name()
                            );
                        }
                    }
                }
                if shadows.is_empty() {
                    Ok(baseline)
                } else {
                    Ok(Arc::new(ShadowEvaluator { baseline, shadows }))
                }
            }
        }
    }
}

/// Serves baseline results and reports any alternate that disagrees.
#[derive(Debug)]
pub struct ShadowEvaluator {
    baseline: Arc<dyn Evaluator>,
    shadows: Vec<(&'static str, Arc<dyn Evaluator>)>,
}

impl Evaluator for ShadowEvaluator {
    fn evaluate(&self, obj: &AugmentedObj) -> Option<EvalResult> {
        let expected = self.baseline.evaluate(obj);
        for (name, shadow) in &self.shadows {
            let actual = shadow.evaluate(obj);
            if actual != expected {
                log::warn!(
                    "{name} backend disagrees with baseline on {} object: baseline {:?}, {name} {:?}",
                    obj.kind(),
                    expected,
                    actual
                );
            }
        }
        expected
    }
}
