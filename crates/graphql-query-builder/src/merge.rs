//! Merging one query definition into another.
//!
//! Merges are transactional: [`merge_definitions`] works on a copy of the
//! target's fields and hands back a [`MergeResult`], so a failed merge leaves
//! the target untouched.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::definition::QueryDefinition;
use crate::error::{QueryBuilderError, Result};
use crate::field::{names_match, unique_key, FieldDefinition, FieldKey, FieldMap};
use crate::path::FieldPathResolver;
use crate::query_map::QueryMap;

/// How fields of an included query are combined with existing fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MergingStrategy {
    /// Graft incoming fields into the existing tree by path.
    #[default]
    MergeByDefault,
    /// Always insert incoming fields under a fresh key.
    NeverMerge,
    /// Merge into an existing field with the same name and compatible
    /// arguments, otherwise insert under a fresh key.
    MergeByFieldPath,
}

impl MergingStrategy {
    /// Picks the strategy for merging a child into a root.
    ///
    /// A child asking for [`NeverMerge`](Self::NeverMerge) always wins. A
    /// root using [`MergeByDefault`](Self::MergeByDefault) defers to the
    /// child. Otherwise the root's strategy applies.
    #[must_use]
    pub const fn resolve(root: Self, child: Self) -> Self {
        match (root, child) {
            (_, Self::NeverMerge) => Self::NeverMerge,
            (Self::MergeByDefault, child) => child,
            (root, _) => root,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MergeByDefault => "mergeByDefault",
            Self::NeverMerge => "neverMerge",
            Self::MergeByFieldPath => "mergeByFieldPath",
        }
    }
}

impl fmt::Display for MergingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MergingStrategy {
    type Err = QueryBuilderError;

    fn from_str(s: &str) -> Result<Self> {
        [Self::MergeByDefault, Self::NeverMerge, Self::MergeByFieldPath]
            .into_iter()
            .find(|strategy| strategy.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| QueryBuilderError::UnknownMergingStrategy {
                value: s.to_string(),
            })
    }
}

/// Outcome of one merge, applied by the caller to its definition.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeResult {
    /// Where each merged query name landed.
    pub query_map: QueryMap,
    /// The target's complete top-level fields after the merge.
    pub fields: FieldMap,
    /// The strategy that was applied.
    pub strategy: MergingStrategy,
}

/// Computes the result of merging `incoming` into `target`.
///
/// `incoming_map` is the query map of the incoming builder; its entries are
/// carried over and re-pointed to the keys their fields landed under.
#[tracing::instrument(skip_all, fields(
    target = %target.name(),
    incoming = %incoming.name(),
    incoming_fields = incoming.definitions_count(),
))]
pub fn merge_definitions(
    target: &QueryDefinition,
    incoming: &QueryDefinition,
    incoming_map: &QueryMap,
) -> Result<MergeResult> {
    let strategy =
        MergingStrategy::resolve(target.merging_strategy(), incoming.merging_strategy());
    let resolver = FieldPathResolver::new(target.default_type());
    let mut fields = target.fields().clone();
    let mut query_map = QueryMap::new();

    for (key, field) in incoming.fields() {
        let landed = match strategy {
            MergingStrategy::MergeByDefault => resolver.include(&mut fields, field),
            MergingStrategy::NeverMerge => insert_unique(&mut fields, field),
            MergingStrategy::MergeByFieldPath => {
                merge_by_field_path(&mut fields, field, incoming.name())?
            }
        };
        tracing::trace!(field = %key, landed = %landed, "Merged top-level field");

        query_map.insert_if_absent(incoming.name(), &landed);
        for (name, mapped) in incoming_map.iter() {
            if names_match(mapped, key.as_str()) || names_match(mapped, field.alias_or_name()) {
                query_map.insert_if_absent(name, &landed);
            }
        }
    }

    tracing::debug!(
        %strategy,
        fields = fields.len(),
        mapped = query_map.len(),
        "Merge complete"
    );
    Ok(MergeResult {
        query_map,
        fields,
        strategy,
    })
}

fn merge_by_field_path(
    fields: &mut FieldMap,
    incoming: &FieldDefinition,
    query_name: &str,
) -> Result<String> {
    let candidate = fields
        .iter()
        .find(|(_, existing)| {
            names_match(existing.name(), incoming.name()) && can_merge_fields(existing, incoming)
        })
        .map(|(key, _)| key.clone());

    let Some(key) = candidate else {
        return Ok(insert_unique(fields, incoming));
    };
    if let Some(existing) = fields.get_mut(&key) {
        merge_fields(existing, incoming, query_name)?;
    }
    Ok(key.to_string())
}

/// Inserts a copy of `incoming` under a key that collides with nothing in
/// `fields`. If the key differs from the field's alias-or-name, the key is
/// forced as its alias so the rendered document uses it.
fn insert_unique(fields: &mut FieldMap, incoming: &FieldDefinition) -> String {
    let base = incoming.alias_or_name();
    let key = unique_key(fields, base);

    let mut copy = incoming.clone();
    if key != base {
        copy.alias = Some(key.clone());
    }
    copy.rebase(&key);
    fields.insert(FieldKey::new(key.as_str()), copy);
    key
}

/// Returns true if `incoming` can be merged into `existing` without
/// changing the meaning of either.
///
/// Both sides need identical arguments, every child present on one side
/// only must carry no arguments anywhere in its subtree, and shared
/// children must be mergeable themselves.
#[must_use]
pub fn can_merge_fields(existing: &FieldDefinition, incoming: &FieldDefinition) -> bool {
    if existing.arguments() != incoming.arguments() {
        return false;
    }

    for (key, child) in existing.fields() {
        let compatible = match incoming.fields().get(key) {
            Some(other) => can_merge_fields(child, other),
            None => !child.has_arguments_in_subtree(),
        };
        if !compatible {
            return false;
        }
    }

    incoming
        .fields()
        .iter()
        .filter(|(key, _)| !existing.fields().contains_key(*key))
        .all(|(_, child)| !child.has_arguments_in_subtree())
}

/// Merges `incoming` into `existing`: children are unioned by key
/// (recursing into shared keys) and arguments deep-merge with incoming
/// values winning.
///
/// Fails with [`QueryBuilderError::QueryMerge`] when both sides declare
/// different non-empty types for the same field.
pub fn merge_fields(
    existing: &mut FieldDefinition,
    incoming: &FieldDefinition,
    query_name: &str,
) -> Result<()> {
    if !existing.field_type.is_empty()
        && !incoming.field_type.is_empty()
        && existing.field_type != incoming.field_type
    {
        return Err(QueryBuilderError::QueryMerge {
            query_name: query_name.to_string(),
            field_name: incoming.name().to_string(),
            existing_type: existing.field_type.clone(),
            incoming_type: incoming.field_type.clone(),
        });
    }

    existing.arguments.merge(&incoming.arguments);
    existing.fill_alias(incoming.alias());

    for (key, child) in &incoming.fields {
        if let Some(current) = existing.fields.get_mut(key) {
            merge_fields(current, child, query_name)?;
        } else {
            let mut copy = child.clone();
            copy.rebase(&format!("{}.{key}", existing.path));
            existing.fields.insert(key.clone(), copy);
        }
    }

    Ok(())
}
