//! The baseline backend: every query value compiled to a [`ValueMatcher`].

use super::factory::{Compilation, QueryCompiler};
use super::leaf::LeafMatcher;
use super::plan::{Plan, PlanEvaluator};
use crate::augment::{FieldLabel, LeafKind, ObjectMeta, Value};
use crate::error::{PolicyError, Result};
use crate::query::{FieldQuery, Query};
use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use std::cmp::Ordering;
use std::sync::Arc;

pub const BASELINE_BACKEND: &str = "baseline";

/// Prefix of regex query values.
pub const REGEX_PREFIX: &str = "r/";
/// Query value matching an absent leaf.
pub const NULL_QUERY: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

impl Comparator {
    /// Splits an optional comparator prefix off a query value.
    pub fn split(value: &str) -> (Option<Comparator>, &str) {
        let value = value.trim();
        let (cmp, rest) = if let Some(rest) = value.strip_prefix("<=") {
            (Some(Comparator::LessThanOrEqual), rest)
        } else if let Some(rest) = value.strip_prefix(">=") {
            (Some(Comparator::GreaterThanOrEqual), rest)
        } else if let Some(rest) = value.strip_prefix('<') {
            (Some(Comparator::LessThan), rest)
        } else if let Some(rest) = value.strip_prefix('>') {
            (Some(Comparator::GreaterThan), rest)
        } else {
            (None, value)
        };
        (cmp, rest.trim())
    }

    fn accepts(cmp: Option<Comparator>, ordering: Ordering) -> bool {
        match cmp {
            None => ordering == Ordering::Equal,
            Some(Comparator::LessThan) => ordering == Ordering::Less,
            Some(Comparator::LessThanOrEqual) => ordering != Ordering::Greater,
            Some(Comparator::GreaterThan) => ordering == Ordering::Greater,
            Some(Comparator::GreaterThanOrEqual) => ordering != Ordering::Less,
        }
    }
}

/// One compiled query value.
#[derive(Debug, Clone)]
pub enum ValueMatcher {
    Null,
    /// Case-insensitive equality.
    Exact(String),
    Regex(Regex),
    Numeric {
        cmp: Option<Comparator>,
        value: f64,
    },
    Bool(bool),
    /// Timestamp older than the given number of days.
    OlderThanDays(i64),
    Time {
        cmp: Option<Comparator>,
        value: DateTime<Utc>,
    },
    /// One optional regex per compound part; `None` matches anything.
    Compound(Vec<Option<Regex>>),
    Ordinal {
        cmp: Option<Comparator>,
        rank: usize,
        levels: &'static [&'static str],
    },
}

pub(crate) fn full_match_regex(field: FieldLabel, raw: &str, body: &str) -> Result<Regex> {
    Regex::new(&format!("^(?i:{body})$"))
        .map_err(|err| PolicyError::invalid_value(field.as_str(), raw, err.to_string()))
}

/// Day count of a `>ND` value.
fn relative_days(raw: &str) -> Option<i64> {
    raw.trim()
        .strip_prefix('>')?
        .strip_suffix('D')?
        .trim()
        .parse()
        .ok()
}

fn rank(levels: &[&str], name: &str) -> Option<usize> {
    levels.iter().position(|level| level.eq_ignore_ascii_case(name))
}

impl ValueMatcher {
    pub fn compile(field: FieldLabel, raw: &str) -> Result<Self> {
        if raw == NULL_QUERY {
            return Ok(ValueMatcher::Null);
        }
        if let Some(body) = raw.strip_prefix(REGEX_PREFIX) {
            return full_match_regex(field, raw, body).map(ValueMatcher::Regex);
        }

        let invalid = |reason: &str| PolicyError::invalid_value(field.as_str(), raw, reason);
        match field.kind() {
            LeafKind::Str => Ok(ValueMatcher::Exact(raw.to_string())),
            LeafKind::Number => {
                let (cmp, number) = Comparator::split(raw);
                number
                    .parse::<f64>()
                    .map(|value| ValueMatcher::Numeric { cmp, value })
                    .map_err(|_| invalid("not a number"))
            }
            LeafKind::Bool => crate::augment::tree::parse_bool(raw.trim())
                .map(ValueMatcher::Bool)
                .ok_or_else(|| invalid("not a boolean")),
            LeafKind::Time => {
                if let Some(days) = relative_days(raw) {
                    return Ok(ValueMatcher::OlderThanDays(days));
                }
                let (cmp, time) = Comparator::split(raw);
                DateTime::parse_from_rfc3339(time)
                    .map(|value| ValueMatcher::Time {
                        cmp,
                        value: value.with_timezone(&Utc),
                    })
                    .map_err(|_| invalid("not a timestamp or day count"))
            }
            LeafKind::Compound(parts) => {
                let mut patterns = Vec::with_capacity(parts);
                for part in raw.splitn(parts, '=') {
                    if part.is_empty() {
                        patterns.push(None);
                    } else {
                        patterns.push(Some(full_match_regex(field, raw, part)?));
                    }
                }
                patterns.resize(parts, None);
                Ok(ValueMatcher::Compound(patterns))
            }
            LeafKind::Ordinal(levels) => {
                let (cmp, name) = Comparator::split(raw);
                rank(levels, name)
                    .map(|rank| ValueMatcher::Ordinal { cmp, rank, levels })
                    .ok_or_else(|| invalid("unknown level"))
            }
        }
    }

    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ValueMatcher::Null => value.is_null(),
            _ if value.is_null() => false,
            ValueMatcher::Exact(expected) => match value {
                Value::Str(s) => s.eq_ignore_ascii_case(expected),
                other => other.render().eq_ignore_ascii_case(expected),
            },
            ValueMatcher::Regex(re) => re.is_match(&value.render()),
            ValueMatcher::Numeric { cmp, value: expected } => value
                .as_f64()
                .and_then(|actual| actual.partial_cmp(expected))
                .map_or(false, |ordering| Comparator::accepts(*cmp, ordering)),
            ValueMatcher::Bool(expected) => value.as_bool() == Some(*expected),
            ValueMatcher::OlderThanDays(days) => match value {
                Value::Time(t) => *t < Utc::now() - Duration::days(*days),
                _ => false,
            },
            ValueMatcher::Time { cmp, value: expected } => match value {
                Value::Time(t) => Comparator::accepts(*cmp, t.cmp(expected)),
                _ => false,
            },
            ValueMatcher::Compound(patterns) => match value {
                Value::Compound(parts) => patterns.iter().enumerate().all(|(i, pattern)| {
                    pattern.as_ref().map_or(true, |re| {
                        re.is_match(parts.get(i).map_or("", String::as_str))
                    })
                }),
                _ => false,
            },
            ValueMatcher::Ordinal { cmp, rank: expected, levels } => match value {
                Value::Str(s) => rank(levels, s)
                    .map_or(false, |actual| Comparator::accepts(*cmp, actual.cmp(expected))),
                _ => false,
            },
        }
    }
}

#[derive(Debug)]
pub(crate) struct ValueMatchers(Vec<ValueMatcher>);

impl ValueMatchers {
    pub(crate) fn compile(fq: &FieldQuery) -> Result<Self> {
        fq.values
            .iter()
            .map(|raw| ValueMatcher::compile(fq.field, raw))
            .collect::<Result<Vec<_>>>()
            .map(ValueMatchers)
    }
}

impl LeafMatcher for ValueMatchers {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn hits(&self, value: &Value, out: &mut Vec<usize>) {
        for (i, matcher) in self.0.iter().enumerate() {
            if matcher.matches(value) {
                out.push(i);
            }
        }
    }
}

/// Compiles any query. Never reports [`Compilation::Unsupported`].
#[derive(Debug, Default, Clone, Copy)]
pub struct BaselineCompiler;

impl QueryCompiler for BaselineCompiler {
    fn name(&self) -> &'static str {
        BASELINE_BACKEND
    }

    fn compile_query(&self, meta: &'static ObjectMeta, query: &Query) -> Result<Compilation> {
        let plan = Plan::build(meta, query, ValueMatchers::compile)?;
        Ok(Compilation::Compiled(Arc::new(PlanEvaluator::new(
            BASELINE_BACKEND,
            meta.kind(),
            plan,
        ))))
    }
}
