//! Rules turning one policy group into field queries.

use crate::augment::tree::parse_bool;
use crate::augment::FieldLabel;
use crate::error::{PolicyError, Result};
use crate::policy::{BooleanOperator, PolicyGroup};
use crate::query::FieldQuery;

/// Whether a key/value field flags objects that carry a matching entry or
/// objects that lack one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapCheck {
    ShouldContain,
    ShouldNotContain,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryBuilder {
    /// Values used as written.
    FieldLabel(FieldLabel),
    /// Values are regexes.
    FieldLabelRegex(FieldLabel),
    /// Values compared for case-insensitive equality.
    FieldLabelExact(FieldLabel),
    FieldLabelUpper(FieldLabel),
    FieldLabelMap(FieldLabel, MapCheck),
    /// Values are `a=b[=c]` patterns over a compound leaf.
    Compound(FieldLabel),
    /// Values are a number of days a timestamp must be older than.
    Days(FieldLabel),
    /// `true` asks for an absent value, `false` for a present one.
    Nil(FieldLabel),
    BooleanInverted(FieldLabel),
    DropCapabilities,
    WritableHostMount,
    K8sRbac,
}

const HOST_PATH_VOLUME: &str = "HostPath";

impl QueryBuilder {
    /// Labels the produced queries constrain.
    pub fn labels(&self) -> Vec<FieldLabel> {
        match self {
            QueryBuilder::FieldLabel(label)
            | QueryBuilder::FieldLabelRegex(label)
            | QueryBuilder::FieldLabelExact(label)
            | QueryBuilder::FieldLabelUpper(label)
            | QueryBuilder::FieldLabelMap(label, _)
            | QueryBuilder::Compound(label)
            | QueryBuilder::Days(label)
            | QueryBuilder::Nil(label)
            | QueryBuilder::BooleanInverted(label) => vec![*label],
            QueryBuilder::DropCapabilities => vec![FieldLabel::DropCapabilities],
            QueryBuilder::WritableHostMount => {
                vec![FieldLabel::VolumeType, FieldLabel::VolumeReadonly]
            }
            QueryBuilder::K8sRbac => vec![FieldLabel::ServiceAccountPermissionLevel],
        }
    }

    pub fn field_queries(&self, group: &PolicyGroup) -> Result<Vec<FieldQuery>> {
        if group.values.is_empty() {
            return Err(PolicyError::invalid_value(
                &group.field_name,
                "",
                "group has no values",
            ));
        }
        let values = || group.value_strings();
        let plain = |label: FieldLabel, values: Vec<String>| {
            FieldQuery::new(label, values)
                .with_operator(group.boolean_operator)
                .negated(group.negate)
        };

        let queries = match self {
            QueryBuilder::FieldLabel(label) | QueryBuilder::FieldLabelExact(label) => {
                vec![plain(*label, values().map(str::to_string).collect())]
            }
            QueryBuilder::FieldLabelRegex(label) => {
                vec![plain(*label, values().map(|v| format!("r/{v}")).collect())]
            }
            QueryBuilder::FieldLabelUpper(label) => {
                vec![plain(*label, values().map(str::to_uppercase).collect())]
            }
            QueryBuilder::Compound(label) => {
                vec![plain(*label, values().map(str::to_string).collect())]
            }
            QueryBuilder::FieldLabelMap(label, check) => {
                let negate = match check {
                    MapCheck::ShouldContain => group.negate,
                    MapCheck::ShouldNotContain => !group.negate,
                };
                vec![FieldQuery::new(*label, values().map(str::to_string))
                    .with_operator(group.boolean_operator)
                    .negated(negate)]
            }
            QueryBuilder::Days(label) => {
                let days = values()
                    .map(|v| {
                        v.trim()
                            .parse::<u32>()
                            .map(|n| format!(">{n}D"))
                            .map_err(|_| {
                                PolicyError::invalid_value(
                                    &group.field_name,
                                    v,
                                    "not a number of days",
                                )
                            })
                    })
                    .collect::<Result<Vec<_>>>()?;
                vec![plain(*label, days)]
            }
            QueryBuilder::Nil(label) => {
                let value = single_bool(group)?;
                vec![FieldQuery::new(*label, ["-"]).negated(!value)]
            }
            QueryBuilder::BooleanInverted(label) => {
                let value = single_bool(group)?;
                vec![FieldQuery::new(*label, [(!value).to_string()])]
            }
            QueryBuilder::DropCapabilities => {
                // a container dropping ALL drops every capability
                let patterns = values()
                    .map(|v| format!("r/(ALL|{})", v.to_uppercase()))
                    .collect::<Vec<_>>();
                vec![FieldQuery::new(FieldLabel::DropCapabilities, patterns)
                    .with_operator(group.boolean_operator)
                    .negated(true)]
            }
            QueryBuilder::WritableHostMount => {
                let writable = single_bool(group)?;
                vec![
                    FieldQuery::new(FieldLabel::VolumeType, [HOST_PATH_VOLUME]),
                    FieldQuery::new(FieldLabel::VolumeReadonly, [(!writable).to_string()]),
                ]
            }
            QueryBuilder::K8sRbac => vec![plain(
                FieldLabel::ServiceAccountPermissionLevel,
                values().map(|v| format!(">={}", v.trim())).collect(),
            )
            .with_operator(BooleanOperator::Or)],
        };
        Ok(queries)
    }
}

fn single_bool(group: &PolicyGroup) -> Result<bool> {
    let mut values = group.value_strings();
    match (values.next(), values.next()) {
        (Some(value), None) => parse_bool(value.trim()).ok_or_else(|| {
            PolicyError::invalid_value(&group.field_name, value, "not a boolean")
        }),
        _ => Err(PolicyError::invalid_value(
            &group.field_name,
            group.value_strings().collect::<Vec<_>>().join(","),
            "expected exactly one boolean value",
        )),
    }
}
