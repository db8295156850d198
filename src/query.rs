//! Backend independent queries compiled from policy sections.

use crate::augment::FieldLabel;
use crate::policy::BooleanOperator;

/// Constraint on one leaf of an augmented object.
///
/// Value syntax:
/// - `r/<pattern>`: case-insensitive regex matched against the whole value
/// - `-`: the value is absent
/// - `<`, `<=`, `>`, `>=` prefixes: numeric or ordinal comparison
/// - `>ND`: a timestamp older than N days
/// - `a=b[=c]`: one regex per part of a compound value, empty parts match anything
/// - anything else: case-insensitive equality
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldQuery {
    pub field: FieldLabel,
    pub operator: BooleanOperator,
    pub negate: bool,
    pub values: Vec<String>,
    /// Matches every value; used to carry context into results.
    pub match_all: bool,
}

impl FieldQuery {
    pub fn new<I, S>(field: FieldLabel, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            field,
            operator: BooleanOperator::Or,
            negate: false,
            values: values.into_iter().map(Into::into).collect(),
            match_all: false,
        }
    }

    pub fn match_all(field: FieldLabel) -> Self {
        Self {
            field,
            operator: BooleanOperator::Or,
            negate: false,
            values: Vec::new(),
            match_all: true,
        }
    }

    pub fn negated(mut self, negate: bool) -> Self {
        self.negate = negate;
        self
    }

    pub fn with_operator(mut self, operator: BooleanOperator) -> Self {
        self.operator = operator;
        self
    }
}

/// Conjunction of field queries compiled from one policy section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub field_queries: Vec<FieldQuery>,
}

impl Query {
    pub fn new(field_queries: Vec<FieldQuery>) -> Self {
        Self { field_queries }
    }

    pub fn is_empty(&self) -> bool {
        self.field_queries.is_empty()
    }

    pub fn queries(&self, field: FieldLabel) -> bool {
        self.field_queries.iter().any(|fq| fq.field == field)
    }

    /// True when every field query is a match-all.
    pub fn is_match_all(&self) -> bool {
        self.field_queries.iter().all(|fq| fq.match_all)
    }
}
