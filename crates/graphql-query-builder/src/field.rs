//! The field definition tree.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use serde::Serialize;

use crate::arguments::Arguments;
use crate::error::{QueryBuilderError, Result};

/// Type assigned to fields added by name only.
pub const DEFAULT_FIELD_TYPE: &str = "String";

/// Type of any field that carries a sub-selection.
pub const OBJECT_TYPE: &str = "object";

/// Pure list marker with no base type.
pub const ARRAY_MARKER: &str = "[]";

/// Pure nullable marker with no base type.
pub const NULLABLE_MARKER: &str = "?";

/// Scalar type names that are replaced by [`OBJECT_TYPE`] once the field
/// receives children.
const PROMOTABLE_TYPES: &[&str] = &[
    "int", "integer", "string", "boolean", "bool", "float", "double", "decimal",
];

/// Freeform key/value data attached to fields and queries. Never rendered.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// Child fields keyed case-insensitively.
pub type FieldMap = BTreeMap<FieldKey, FieldDefinition>;

/// Compares two names the way field keys are compared.
#[must_use]
pub fn names_match(a: &str, b: &str) -> bool {
    compare_ignore_case(a, b) == Ordering::Equal
}

pub(crate) fn compare_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

/// Returns true if a field of type `field_type` should become an
/// [`OBJECT_TYPE`] when a nested field is attached beneath it.
///
/// Only the default type and plain scalar names are promoted. Object types,
/// list and nullable markers, and custom type names are kept as given.
#[must_use]
pub fn should_convert_to_object_type(field_type: &str, default_type: &str) -> bool {
    if field_type.eq_ignore_ascii_case(OBJECT_TYPE) || is_wrapped_type(field_type) {
        return false;
    }

    field_type.is_empty()
        || field_type == default_type
        || PROMOTABLE_TYPES
            .iter()
            .any(|primitive| primitive.eq_ignore_ascii_case(field_type))
}

fn is_wrapped_type(field_type: &str) -> bool {
    field_type == ARRAY_MARKER
        || field_type == NULLABLE_MARKER
        || field_type.starts_with('[')
        || field_type.ends_with(']')
        || field_type.ends_with('?')
}

/// Key of a field inside its parent's [`FieldMap`].
///
/// Ordering, equality and hashing ignore case, so `User` and `user` address
/// the same field. The original spelling is kept for rendering.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct FieldKey(String);

impl FieldKey {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for FieldKey {
    fn eq(&self, other: &Self) -> bool {
        names_match(&self.0, &other.0)
    }
}

impl Eq for FieldKey {}

impl PartialOrd for FieldKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FieldKey {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_ignore_case(&self.0, &other.0)
    }
}

impl Hash for FieldKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for c in self.0.chars().flat_map(char::to_lowercase) {
            c.hash(state);
        }
    }
}

impl std::fmt::Display for FieldKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FieldKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

/// A node of the field tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    name: String,
    #[serde(rename = "type")]
    pub(crate) field_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) alias: Option<String>,
    #[serde(skip_serializing_if = "Arguments::is_empty")]
    pub(crate) arguments: Arguments,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub(crate) fields: FieldMap,
    pub(crate) path: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub(crate) metadata: Metadata,
}

impl FieldDefinition {
    /// Creates a detached field. The path defaults to the name.
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Result<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(QueryBuilderError::EmptyFieldName);
        }
        let path = name.clone();
        Ok(Self::with_path(name, field_type.into(), path))
    }

    pub(crate) fn with_path(name: String, field_type: String, path: String) -> Self {
        Self {
            name,
            field_type,
            alias: None,
            arguments: Arguments::new(),
            fields: FieldMap::new(),
            path,
            metadata: Metadata::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn field_type(&self) -> &str {
        &self.field_type
    }

    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// The name this field is rendered under: its alias if set, else its name.
    #[must_use]
    pub fn alias_or_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    #[must_use]
    pub const fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    #[must_use]
    pub const fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// Looks up a direct child by key.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Self> {
        self.fields.get(&FieldKey::new(key))
    }

    /// Dotted key chain from the query root to this field.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub const fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    #[must_use]
    pub fn has_fields(&self) -> bool {
        !self.fields.is_empty()
    }

    /// Sets the alias unless one is already present.
    pub(crate) fn fill_alias(&mut self, alias: Option<&str>) {
        if self.alias.is_none() {
            self.alias = alias.map(str::to_string);
        }
    }

    /// Applies an incoming terminal type. The default type never overrides a
    /// more specific one, and a scalar type never demotes a field that
    /// already has children.
    pub(crate) fn apply_type(&mut self, incoming: &str, default_type: &str) {
        if incoming.is_empty() || incoming == self.field_type || incoming == default_type {
            return;
        }
        if self.has_fields() && should_convert_to_object_type(incoming, default_type) {
            return;
        }
        self.field_type = incoming.to_string();
    }

    /// Promotes this field to [`OBJECT_TYPE`] if its type allows it.
    pub(crate) fn promote_to_object(&mut self, default_type: &str) -> bool {
        if should_convert_to_object_type(&self.field_type, default_type) {
            self.field_type = OBJECT_TYPE.to_string();
            return true;
        }
        false
    }

    /// True if this field or any descendant carries arguments.
    #[must_use]
    pub fn has_arguments_in_subtree(&self) -> bool {
        !self.arguments.is_empty() || self.fields.values().any(Self::has_arguments_in_subtree)
    }

    /// Re-roots this subtree so that this field lives at `path`.
    pub(crate) fn rebase(&mut self, path: &str) {
        self.path = path.to_string();
        for (key, child) in &mut self.fields {
            child.rebase(&format!("{path}.{key}"));
        }
    }
}

/// Returns `base` if it is free in `fields`, else the first free
/// `base_1`, `base_2`, ...
///
/// A candidate is taken when it matches an existing key or the response
/// name (alias or name) of an existing field. Collisions are checked
/// case-insensitively.
#[must_use]
pub fn unique_key(fields: &FieldMap, base: &str) -> String {
    let is_taken = |candidate: &str| {
        fields.contains_key(&FieldKey::new(candidate))
            || fields
                .values()
                .any(|field| names_match(field.alias_or_name(), candidate))
    };
    if !is_taken(base) {
        return base.to_string();
    }

    let mut suffix = 1usize;
    loop {
        let candidate = format!("{base}_{suffix}");
        if !is_taken(&candidate) {
            return candidate;
        }
        suffix += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_key_ignores_case() {
        let mut fields = FieldMap::new();
        fields.insert(
            FieldKey::new("User"),
            FieldDefinition::new("User", DEFAULT_FIELD_TYPE).unwrap(),
        );
        assert!(fields.contains_key(&FieldKey::new("user")));
        assert!(fields.contains_key(&FieldKey::new("USER")));
        assert!(!fields.contains_key(&FieldKey::new("users")));
    }

    #[test]
    fn test_should_convert_to_object_type() {
        assert!(should_convert_to_object_type("String", "String"));
        assert!(should_convert_to_object_type("int", "String"));
        assert!(should_convert_to_object_type("Boolean", "String"));
        assert!(should_convert_to_object_type("DECIMAL", "String"));
        assert!(should_convert_to_object_type("", "String"));

        assert!(!should_convert_to_object_type("object", "String"));
        assert!(!should_convert_to_object_type("[]", "String"));
        assert!(!should_convert_to_object_type("?", "String"));
        assert!(!should_convert_to_object_type("[User]", "String"));
        assert!(!should_convert_to_object_type("User?", "String"));
        assert!(!should_convert_to_object_type("User", "String"));
    }

    #[test]
    fn test_unique_key() {
        let mut fields = FieldMap::new();
        assert_eq!(unique_key(&fields, "tables"), "tables");

        fields.insert(
            FieldKey::new("Tables"),
            FieldDefinition::new("tables", OBJECT_TYPE).unwrap(),
        );
        assert_eq!(unique_key(&fields, "tables"), "tables_1");

        fields.insert(
            FieldKey::new("tables_1"),
            FieldDefinition::new("tables", OBJECT_TYPE).unwrap(),
        );
        assert_eq!(unique_key(&fields, "tables"), "tables_2");
    }

    #[test]
    fn test_unique_key_avoids_aliases() {
        let mut fields = FieldMap::new();
        let mut tables = FieldDefinition::new("tables", OBJECT_TYPE).unwrap();
        tables.alias = Some("t".to_string());
        fields.insert(FieldKey::new("tables"), tables);

        assert_eq!(unique_key(&fields, "t"), "t_1");
        assert_eq!(unique_key(&fields, "T"), "T_1");
        assert_eq!(unique_key(&fields, "orders"), "orders");
    }

    #[test]
    fn test_empty_name_is_rejected() {
        assert_eq!(
            FieldDefinition::new("  ", DEFAULT_FIELD_TYPE),
            Err(QueryBuilderError::EmptyFieldName)
        );
    }

    #[test]
    fn test_apply_type() {
        let mut field = FieldDefinition::new("id", DEFAULT_FIELD_TYPE).unwrap();
        field.apply_type("Int", DEFAULT_FIELD_TYPE);
        assert_eq!(field.field_type(), "Int");

        field.apply_type(DEFAULT_FIELD_TYPE, DEFAULT_FIELD_TYPE);
        assert_eq!(field.field_type(), "Int");
    }

    #[test]
    fn test_arguments_in_subtree() {
        let mut parent = FieldDefinition::new("user", OBJECT_TYPE).unwrap();
        let mut child = FieldDefinition::new("posts", OBJECT_TYPE).unwrap();
        assert!(!parent.has_arguments_in_subtree());

        child.arguments.insert("first", 3);
        parent.fields.insert(FieldKey::new("posts"), child);
        assert!(parent.has_arguments_in_subtree());
    }
}
