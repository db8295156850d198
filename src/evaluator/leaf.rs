//! Set semantics of a single leaf query, shared by every backend.

use crate::augment::{Value, EMPTY_VALUE};
use crate::policy::BooleanOperator;
use std::fmt::Debug;

/// Tests leaf values against the compiled values of one field query.
pub(crate) trait LeafMatcher: Send + Sync + Debug {
    /// Number of query values.
    fn len(&self) -> usize;

    /// Pushes the index of every query value that matches `value`.
    fn hits(&self, value: &Value, out: &mut Vec<usize>);
}

#[derive(Debug)]
pub(crate) enum LeafCheck<M> {
    MatchAll,
    Values {
        operator: BooleanOperator,
        negate: bool,
        matcher: M,
    },
}

pub(crate) fn render_all(values: &[Value]) -> Vec<String> {
    if values.is_empty() {
        vec![EMPTY_VALUE.to_string()]
    } else {
        values.iter().map(Value::render).collect()
    }
}

impl<M: LeafMatcher> LeafCheck<M> {
    pub(crate) fn is_match_all(&self) -> bool {
        matches!(self, LeafCheck::MatchAll)
    }

    /// Rendered values that satisfied the check, or `None` when it failed.
    pub(crate) fn evaluate(&self, values: &[Value]) -> Option<Vec<String>> {
        let (operator, negate, matcher) = match self {
            LeafCheck::MatchAll => return Some(render_all(values)),
            LeafCheck::Values {
                operator,
                negate,
                matcher,
            } => (*operator, *negate, matcher),
        };

        // absent scalars never satisfy a negated check
        if negate && matches!(values, [Value::Null]) {
            return None;
        }

        let mut hit_values = Vec::new();
        let mut hit_queries = vec![false; matcher.len()];
        let mut scratch = Vec::new();
        for value in values {
            scratch.clear();
            matcher.hits(value, &mut scratch);
            if !scratch.is_empty() {
                hit_values.push(value);
                for &index in &scratch {
                    hit_queries[index] = true;
                }
            }
        }

        let satisfied = match operator {
            BooleanOperator::Or => !hit_values.is_empty(),
            BooleanOperator::And => !hit_queries.is_empty() && hit_queries.iter().all(|hit| *hit),
        };

        match (satisfied, negate) {
            (true, false) => Some(hit_values.into_iter().map(Value::render).collect()),
            (false, true) => Some(render_all(values)),
            _ => None,
        }
    }
}
