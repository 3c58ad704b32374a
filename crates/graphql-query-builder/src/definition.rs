//! The root definition owned by a query builder.

use serde::Serialize;

use crate::arguments::Arguments;
use crate::error::Result;
use crate::field::{names_match, FieldDefinition, FieldKey, FieldMap, Metadata, DEFAULT_FIELD_TYPE};
use crate::merge::MergingStrategy;
use crate::path::{FieldPathResolver, PathCache};
use crate::variable::VariableSet;

/// Name, variables and field tree of one operation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryDefinition {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) description: Option<String>,
    pub(crate) fields: FieldMap,
    pub(crate) variables: VariableSet,
    #[serde(skip_serializing_if = "Metadata::is_empty")]
    pub(crate) metadata: Metadata,
    pub(crate) merging_strategy: MergingStrategy,
    #[serde(skip)]
    pub(crate) default_type: String,
    #[serde(skip)]
    pub(crate) path_cache: PathCache,
}

impl PartialEq for QueryDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.description == other.description
            && self.fields == other.fields
            && self.variables == other.variables
            && self.metadata == other.metadata
            && self.merging_strategy == other.merging_strategy
            && self.default_type == other.default_type
    }
}

impl QueryDefinition {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: FieldMap::new(),
            variables: VariableSet::new(),
            metadata: Metadata::new(),
            merging_strategy: MergingStrategy::default(),
            default_type: DEFAULT_FIELD_TYPE.to_string(),
            path_cache: PathCache::default(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Top-level fields.
    #[must_use]
    pub const fn fields(&self) -> &FieldMap {
        &self.fields
    }

    #[must_use]
    pub fn field(&self, key: &str) -> Option<&FieldDefinition> {
        self.fields.get(&FieldKey::new(key))
    }

    #[must_use]
    pub const fn variables(&self) -> &VariableSet {
        &self.variables
    }

    #[must_use]
    pub const fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    #[must_use]
    pub const fn merging_strategy(&self) -> MergingStrategy {
        self.merging_strategy
    }

    /// The type given to fields added without an explicit type.
    #[must_use]
    pub fn default_type(&self) -> &str {
        &self.default_type
    }

    /// Number of top-level field definitions.
    #[must_use]
    pub fn definitions_count(&self) -> usize {
        self.fields.len()
    }

    /// Looks up a top-level field by response name: an alias match wins
    /// over a key match.
    #[must_use]
    pub fn root_field(&self, key: &str) -> Option<&FieldDefinition> {
        self.fields
            .values()
            .find(|field| field.alias().is_some_and(|alias| names_match(alias, key)))
            .or_else(|| self.field(key))
    }

    /// Resolves `path` (relative to `parent_path`), merges `arguments` into
    /// it and attaches `sub_fields` beneath it.
    ///
    /// Blank paths are a no-op and return `None`. Otherwise returns the key
    /// chain of the resolved field.
    pub(crate) fn add_field(
        &mut self,
        parent_path: Option<&str>,
        path: &str,
        arguments: Option<&Arguments>,
        sub_fields: &[&str],
    ) -> Result<Option<String>> {
        if path.trim().is_empty() {
            return Ok(None);
        }
        if let Some(arguments) = arguments {
            self.variables.extract_from_arguments(arguments);
        }

        let resolver = FieldPathResolver::new(&self.default_type);
        let node = resolver.create_or_get_cached(
            &mut self.fields,
            &mut self.path_cache,
            path,
            None,
            arguments,
            parent_path,
        )?;
        let node_path = node.path().to_string();

        for sub_field in sub_fields.iter().filter(|f| !f.trim().is_empty()) {
            resolver.create_or_get_cached(
                &mut self.fields,
                &mut self.path_cache,
                sub_field,
                None,
                None,
                Some(&node_path),
            )?;
        }

        Ok(Some(node_path))
    }

    /// Resolves `path` and merges `metadata` into the field's metadata.
    pub(crate) fn add_field_metadata(
        &mut self,
        parent_path: Option<&str>,
        path: &str,
        metadata: Metadata,
    ) -> Result<()> {
        if path.trim().is_empty() {
            return Ok(());
        }

        let resolver = FieldPathResolver::new(&self.default_type);
        let node = resolver.create_or_get_cached(
            &mut self.fields,
            &mut self.path_cache,
            path,
            None,
            None,
            parent_path,
        )?;
        node.metadata.extend(metadata);
        Ok(())
    }
}
