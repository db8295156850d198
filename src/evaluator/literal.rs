//! An aho-corasick backend for queries made only of literal strings.
//!
//! Every value of a field query is folded into one anchored automaton, so a
//! leaf value is tested against all query values in a single pass. Values
//! written as `r/` regexes are accepted when their body has no regex syntax.

use super::baseline::{full_match_regex, NULL_QUERY, REGEX_PREFIX};
use super::factory::{Compilation, QueryCompiler};
use super::leaf::LeafMatcher;
use super::plan::{Plan, PlanEvaluator};
use crate::augment::{FieldLabel, LeafKind, ObjectMeta, Value};
use crate::error::{PolicyError, Result};
use crate::query::{FieldQuery, Query};
use aho_corasick::{AhoCorasick, Anchored, Input, MatchKind, StartKind};
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

pub const LITERAL_BACKEND: &str = "literal";

fn is_literal_regex_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_' | '/' | ':' | '@' | ',')
}

/// Reason a query value can not be served by the automaton.
fn unsupported_value(field: FieldLabel, raw: &str) -> Option<String> {
    if field.kind() != LeafKind::Str {
        return Some(format!("field {field} does not hold strings"));
    }
    if raw == NULL_QUERY {
        return Some(format!("null query on {field}"));
    }
    if !raw.is_ascii() {
        return Some(format!("non-ascii value {raw:?} on {field}"));
    }
    match raw.strip_prefix(REGEX_PREFIX) {
        Some(body) if !body.chars().all(is_literal_regex_char) => {
            Some(format!("regex {raw:?} on {field} is not a literal"))
        }
        _ => None,
    }
}

/// Why the whole query falls outside this backend, if it does.
pub fn unsupported_reason(query: &Query) -> Option<String> {
    query
        .field_queries
        .iter()
        .filter(|fq| !fq.match_all)
        .find_map(|fq| {
            fq.values
                .iter()
                .find_map(|raw| unsupported_value(fq.field, raw))
        })
}

#[derive(Debug)]
pub(crate) struct LiteralMatcher {
    automaton: AhoCorasick,
    /// Query value indices behind each deduplicated pattern.
    pattern_values: Vec<Vec<usize>>,
    /// Full-match regexes of values written as `r/` patterns, used when the
    /// haystack is not ascii and unicode case folding may differ.
    fallbacks: Vec<Option<Regex>>,
}

impl LiteralMatcher {
    pub(crate) fn compile(fq: &FieldQuery) -> Result<Self> {
        let mut patterns: Vec<String> = Vec::new();
        let mut pattern_values: Vec<Vec<usize>> = Vec::new();
        let mut index_of: HashMap<String, usize> = HashMap::new();
        let mut fallbacks = Vec::with_capacity(fq.values.len());

        for (value_index, raw) in fq.values.iter().enumerate() {
            if let Some(reason) = unsupported_value(fq.field, raw) {
                return Err(PolicyError::EvaluatorConstruction {
                    backend: LITERAL_BACKEND.to_string(),
                    reason,
                });
            }
            let literal = match raw.strip_prefix(REGEX_PREFIX) {
                Some(body) => {
                    fallbacks.push(Some(full_match_regex(fq.field, raw, &regex::escape(body))?));
                    body
                }
                None => {
                    fallbacks.push(None);
                    raw.as_str()
                }
            };
            let key = literal.to_ascii_lowercase();
            let pattern_index = *index_of.entry(key.clone()).or_insert_with(|| {
                patterns.push(key);
                pattern_values.push(Vec::new());
                patterns.len() - 1
            });
            pattern_values[pattern_index].push(value_index);
        }

        let automaton = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::LeftmostLongest)
            .start_kind(StartKind::Anchored)
            .build(&patterns)
            .map_err(|err| PolicyError::EvaluatorConstruction {
                backend: LITERAL_BACKEND.to_string(),
                reason: format!("failed to build automaton for {}: {err}", fq.field),
            })?;

        Ok(Self {
            automaton,
            pattern_values,
            fallbacks,
        })
    }

    /// Index of the pattern equal to the whole haystack.
    fn full_match(&self, haystack: &str) -> Option<usize> {
        let found = self
            .automaton
            .find(Input::new(haystack).anchored(Anchored::Yes))?;
        (found.end() == haystack.len()).then(|| found.pattern().as_usize())
    }
}

impl LeafMatcher for LiteralMatcher {
    fn len(&self) -> usize {
        self.fallbacks.len()
    }

    fn hits(&self, value: &Value, out: &mut Vec<usize>) {
        let haystack = match value {
            Value::Null => return,
            Value::Str(s) => std::borrow::Cow::Borrowed(s.as_str()),
            other => std::borrow::Cow::Owned(other.render()),
        };
        let ascii = haystack.is_ascii();

        if let Some(pattern) = self.full_match(&haystack) {
            out.extend(
                self.pattern_values[pattern]
                    .iter()
                    .copied()
                    .filter(|i| ascii || self.fallbacks[*i].is_none()),
            );
        }
        if !ascii {
            for (i, fallback) in self.fallbacks.iter().enumerate() {
                if fallback.as_ref().map_or(false, |re| re.is_match(&haystack)) {
                    out.push(i);
                }
            }
            out.sort_unstable();
        }
    }
}

/// Compiles queries whose every explicit value is a string literal.
#[derive(Debug, Default, Clone, Copy)]
pub struct LiteralCompiler;

impl QueryCompiler for LiteralCompiler {
    fn name(&self) -> &'static str {
        LITERAL_BACKEND
    }

    fn compile_query(&self, meta: &'static ObjectMeta, query: &Query) -> Result<Compilation> {
        if let Some(reason) = unsupported_reason(query) {
            return Ok(Compilation::Unsupported(reason));
        }
        let plan = Plan::build(meta, query, LiteralMatcher::compile)?;
        Ok(Compilation::Compiled(Arc::new(PlanEvaluator::new(
            LITERAL_BACKEND,
            meta.kind(),
            plan,
        ))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(values: &[&str]) -> LiteralMatcher {
        LiteralMatcher::compile(&FieldQuery::new(FieldLabel::ImageTag, values.iter().copied()))
            .unwrap()
    }

    fn hits(m: &LiteralMatcher, value: Value) -> Vec<usize> {
        let mut out = Vec::new();
        m.hits(&value, &mut out);
        out
    }

    #[test]
    fn test_full_matches_only() {
        let m = matcher(&["latest", "r/latest-dev", "LATEST"]);
        assert_eq!(hits(&m, Value::str("Latest")), vec![0, 2]);
        assert_eq!(hits(&m, Value::str("latest-dev")), vec![1]);
        assert!(hits(&m, Value::str("lates")).is_empty());
        assert!(hits(&m, Value::str("latest-")).is_empty());
        assert!(hits(&m, Value::Null).is_empty());
    }

    #[test]
    fn test_non_ascii_haystack_uses_regex_for_patterns() {
        let m = matcher(&["r/k8s", "k8s"]);
        // KELVIN SIGN folds to 'k' under unicode case insensitivity
        let kelvin = Value::str("\u{212A}8s");
        assert_eq!(hits(&m, kelvin), vec![0]);
        assert!(hits(&m, Value::str("k8s")).len() == 2);
    }

    #[test]
    fn test_unsupported_queries() {
        let dotted = Query::new(vec![
            FieldQuery::new(FieldLabel::ImageTag, ["latest", "r/1.0"]),
            FieldQuery::match_all(FieldLabel::Cvss),
        ]);
        assert!(unsupported_reason(&dotted).is_some());

        let supported = Query::new(vec![
            FieldQuery::new(FieldLabel::ImageTag, ["latest", "r/release-1"]),
            FieldQuery::match_all(FieldLabel::ContainerName),
        ]);
        assert_eq!(unsupported_reason(&supported), None);

        for query in [
            FieldQuery::new(FieldLabel::ImageTag, ["r/.*"]),
            FieldQuery::new(FieldLabel::ImageTag, ["-"]),
            FieldQuery::new(FieldLabel::ImageTag, ["é"]),
            FieldQuery::new(FieldLabel::Cvss, ["7"]),
        ] {
            assert!(unsupported_reason(&Query::new(vec![query])).is_some());
        }
    }
}
