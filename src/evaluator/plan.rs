//! Query plans laid over an object tree.
//!
//! A plan mirrors the part of an [`ObjectMeta`] a query touches. Leaf checks
//! sitting under the same array element are evaluated against that element
//! together, so a section asking for "privileged" and "tag latest" only
//! matches when one container is both.

use super::leaf::{LeafCheck, LeafMatcher};
use super::{EvalResult, Evaluator, MatchMap};
use crate::augment::{AugmentedObj, FieldLabel, Node, ObjectKind, ObjectMeta, Value};
use crate::error::{PolicyError, Result};
use crate::query::{FieldQuery, Query};
use std::fmt;

#[derive(Debug)]
struct LeafPlan<M> {
    label: FieldLabel,
    check: LeafCheck<M>,
}

#[derive(Debug)]
struct ChildPlan<M> {
    key: &'static str,
    each: bool,
    plan: Plan<M>,
}

#[derive(Debug)]
pub(crate) struct Plan<M> {
    leaves: Vec<LeafPlan<M>>,
    children: Vec<ChildPlan<M>>,
}

const ABSENT: &[Value] = &[Value::Null];

impl<M: LeafMatcher> Plan<M> {
    fn empty() -> Self {
        Self {
            leaves: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Lays every field query of `query` onto the paths of `meta`.
    ///
    /// Match-all queries on labels the kind does not carry are dropped;
    /// any other query on such a label is an error.
    pub(crate) fn build<F>(meta: &ObjectMeta, query: &Query, mut compile: F) -> Result<Self>
    where
        F: FnMut(&FieldQuery) -> Result<M>,
    {
        let mut root = Self::empty();
        for fq in &query.field_queries {
            let Some(path) = meta.path(fq.field) else {
                if fq.match_all {
                    continue;
                }
                return Err(PolicyError::FieldNotAvailable {
                    field: fq.field.to_string(),
                    kind: meta.kind().to_string(),
                });
            };

            let check = if fq.match_all {
                LeafCheck::MatchAll
            } else {
                LeafCheck::Values {
                    operator: fq.operator,
                    negate: fq.negate,
                    matcher: compile(fq)?,
                }
            };

            let mut plan = &mut root;
            for step in path {
                let index = match plan.children.iter().position(|c| c.key == step.key) {
                    Some(index) => index,
                    None => {
                        plan.children.push(ChildPlan {
                            key: step.key,
                            each: step.each,
                            plan: Self::empty(),
                        });
                        plan.children.len() - 1
                    }
                };
                plan = &mut plan.children[index].plan;
            }
            plan.leaves.push(LeafPlan {
                label: fq.field,
                check,
            });
        }
        Ok(root)
    }

    fn is_match_all(&self) -> bool {
        self.leaves.iter().all(|leaf| leaf.check.is_match_all())
            && self.children.iter().all(|child| child.plan.is_match_all())
    }

    /// One result map per combination of matching array elements.
    pub(crate) fn evaluate(&self, node: Option<&Node>) -> Option<Vec<MatchMap>> {
        let Some(node) = node else {
            return self.is_match_all().then(|| vec![MatchMap::new()]);
        };

        let mut own = MatchMap::new();
        for leaf in &self.leaves {
            let values = node.leaf(leaf.label).unwrap_or(ABSENT);
            let rendered = leaf.check.evaluate(values)?;
            own.entry(leaf.label.as_str().to_string())
                .or_default()
                .extend(rendered);
        }

        let mut combinations = vec![own];
        for child in &self.children {
            let child_node = node.get(child.key);
            let results = if child.each {
                let elements = child_node.map_or(&[][..], Node::elements);
                let mut results = Vec::new();
                for element in elements {
                    if let Some(maps) = child.plan.evaluate(Some(element.as_ref())) {
                        results.extend(maps);
                    }
                }
                if results.is_empty() {
                    // nothing to report, but an empty array can not fail a
                    // section that only collects context
                    child.plan.evaluate(None)?
                } else {
                    results
                }
            } else {
                child.plan.evaluate(child_node)?
            };
            combinations = product(&combinations, &results);
        }
        Some(combinations)
    }
}

fn product(left: &[MatchMap], right: &[MatchMap]) -> Vec<MatchMap> {
    let mut out = Vec::with_capacity(left.len() * right.len());
    for l in left {
        for r in right {
            let mut merged = l.clone();
            for (key, values) in r {
                merged.entry(key.clone()).or_default().extend(values.iter().cloned());
            }
            out.push(merged);
        }
    }
    out
}

/// Evaluator running a plan over trees of one object kind.
pub(crate) struct PlanEvaluator<M> {
    backend: &'static str,
    kind: ObjectKind,
    plan: Plan<M>,
}

impl<M> PlanEvaluator<M> {
    pub(crate) fn new(backend: &'static str, kind: ObjectKind, plan: Plan<M>) -> Self {
        Self {
            backend,
            kind,
            plan,
        }
    }
}

impl<M> fmt::Debug for PlanEvaluator<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlanEvaluator")
            .field("backend", &self.backend)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl<M: LeafMatcher> Evaluator for PlanEvaluator<M> {
    fn evaluate(&self, obj: &AugmentedObj) -> Option<EvalResult> {
        if obj.kind() != self.kind {
            log::debug!(
                "{} evaluator for {} trees given a {} tree",
                self.backend,
                self.kind,
                obj.kind()
            );
            return None;
        }
        self.plan
            .evaluate(Some(obj.root()))
            .map(|matches| EvalResult { matches })
    }
}
