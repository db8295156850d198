//! Policy section compiler.
//!
//! A section is compiled into a backend independent [`Query`]: each group
//! goes through its field's [`QueryBuilder`](query_builders::QueryBuilder),
//! then the context fields of every queried field are appended as match-all
//! queries so violation messages can be rendered.
//!
//! # Examples
//!
//! ```rust
//! use policy_engine::compiler::section_to_query;
//! use policy_engine::policy::{LifecycleStage, PolicyGroup, PolicySection};
//!
//! let section = PolicySection::new("", vec![PolicyGroup::new("Image Tag", ["latest"])]);
//! let query = section_to_query(&section, LifecycleStage::Deploy)?;
//!
//! // the tag constraint plus the container name for the message
//! assert_eq!(query.field_queries.len(), 2);
//! assert!(query.field_queries[1].match_all);
//! # Ok::<(), policy_engine::PolicyError>(())
//! ```

pub mod query_builders;

use crate::error::{PolicyError, Result};
use crate::fields::{registry, RuntimeFieldCategory};
use crate::policy::{LifecycleStage, PolicySection};
use crate::query::{FieldQuery, Query};
use std::collections::BTreeSet;

pub fn section_to_query(section: &PolicySection, stage: LifecycleStage) -> Result<Query> {
    if section.policy_groups.is_empty() {
        return Err(PolicyError::EmptySection(section.section_name.clone()));
    }

    let registry = registry();
    let mut field_queries = Vec::new();
    let mut contexts = Vec::new();
    for group in &section.policy_groups {
        let metadata = registry.lookup(&group.field_name)?;
        field_queries.extend(metadata.builder().field_queries(group)?);
        if !contexts.contains(&metadata.context()) {
            contexts.push(metadata.context());
        }
    }

    for context in contexts {
        for label in context.for_stage(stage) {
            if !field_queries.iter().any(|fq: &FieldQuery| fq.field == *label) {
                field_queries.push(FieldQuery::match_all(*label));
            }
        }
    }
    Ok(Query::new(field_queries))
}

/// Field queries of the groups whose field belongs to `category`. Context
/// fields are not added.
pub fn section_type_to_field_queries(
    section: &PolicySection,
    category: RuntimeFieldCategory,
) -> Result<Vec<FieldQuery>> {
    let registry = registry();
    let mut field_queries = Vec::new();
    for group in &section.policy_groups {
        let metadata = registry.lookup(&group.field_name)?;
        if metadata.runtime_category() == Some(category) {
            field_queries.extend(metadata.builder().field_queries(group)?);
        }
    }
    Ok(field_queries)
}

/// Runtime categories of the fields in a section.
pub fn section_runtime_categories(
    section: &PolicySection,
) -> Result<BTreeSet<RuntimeFieldCategory>> {
    let registry = registry();
    let mut categories = BTreeSet::new();
    for group in &section.policy_groups {
        if let Some(category) = registry.lookup(&group.field_name)?.runtime_category() {
            categories.insert(category);
        }
    }
    Ok(categories)
}

/// Fails when a section combines runtime categories that can not be
/// evaluated against the same event.
pub fn check_section_categories(
    section: &PolicySection,
    index: usize,
) -> Result<BTreeSet<RuntimeFieldCategory>> {
    let categories = section_runtime_categories(section)?;
    let compatible = categories
        .iter()
        .all(|a| categories.iter().all(|b| a.compatible_with(*b)));
    if compatible {
        Ok(categories)
    } else {
        Err(PolicyError::MixedRuntimeCategories {
            section: section.display_name(index),
            categories: categories
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        })
    }
}

/// Checks every section of a policy, see [`check_section_categories`].
pub fn contains_discrete_runtime_field_category_sections(sections: &[PolicySection]) -> Result<()> {
    for (index, section) in sections.iter().enumerate() {
        check_section_categories(section, index)?;
    }
    Ok(())
}
