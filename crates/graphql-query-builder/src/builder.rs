//! The query builder façade.

use std::fmt;

use crate::arguments::Arguments;
use crate::definition::QueryDefinition;
use crate::error::Result;
use crate::field::Metadata;
use crate::merge::{merge_definitions, MergingStrategy};
use crate::options::QueryBuilderOptions;
use crate::query_map::QueryMap;
use crate::render::render_definition;
use crate::request::GraphQLRequest;
use crate::variable::{Variable, VariableSet};

/// Builds one `query` document from dotted field paths.
///
/// Every mutation goes straight into the owned [`QueryDefinition`]; the
/// text is re-rendered from that state on each call to [`build`](Self::build)
/// or `to_string`.
///
/// # Example
///
/// ```
/// use graphql_query_builder::QueryBuilder;
///
/// let mut builder = QueryBuilder::new("SimpleQuery");
/// builder.add_field("parent.child")?;
///
/// assert_eq!(
///     builder.build(),
///     "query SimpleQuery{\n    parent{\n        child\n    }\n}"
/// );
/// # Ok::<(), graphql_query_builder::QueryBuilderError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct QueryBuilder {
    definition: QueryDefinition,
    query_map: QueryMap,
}

impl QueryBuilder {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            definition: QueryDefinition::new(name),
            query_map: QueryMap::new(),
        }
    }

    #[must_use]
    pub fn with_strategy(name: impl Into<String>, strategy: MergingStrategy) -> Self {
        let mut builder = Self::new(name);
        builder.definition.merging_strategy = strategy;
        builder
    }

    #[must_use]
    pub fn with_options(name: impl Into<String>, options: QueryBuilderOptions) -> Self {
        let mut builder = Self::with_strategy(name, options.merging_strategy);
        let default_type = options.default_type.trim();
        if !default_type.is_empty() {
            builder.definition.default_type = default_type.to_string();
        }
        builder
    }

    /// Adds the field at `path`, creating every missing ancestor.
    pub fn add_field(&mut self, path: &str) -> Result<&mut Self> {
        self.add_field_with(path, None, &[])
    }

    /// Adds the field at `path` and the given children beneath it.
    pub fn add_field_with_subfields(&mut self, path: &str, sub_fields: &[&str]) -> Result<&mut Self> {
        self.add_field_with(path, None, sub_fields)
    }

    /// Adds the field at `path` and merges `arguments` into it.
    pub fn add_field_with_arguments(
        &mut self,
        path: &str,
        arguments: impl Into<Arguments>,
    ) -> Result<&mut Self> {
        self.add_field_with(path, Some(&arguments.into()), &[])
    }

    /// Adds the field at `path` with optional arguments and children.
    ///
    /// Variables referenced by the arguments are registered on the query.
    pub fn add_field_with(
        &mut self,
        path: &str,
        arguments: Option<&Arguments>,
        sub_fields: &[&str],
    ) -> Result<&mut Self> {
        self.definition.add_field(None, path, arguments, sub_fields)?;
        self.query_map.update_root_mapping(&self.definition);
        Ok(self)
    }

    /// Adds the field at `path` and lets `build` add fields relative to it.
    ///
    /// ```
    /// use graphql_query_builder::QueryBuilder;
    ///
    /// let mut builder = QueryBuilder::new("Q");
    /// builder.add_field_nested("user", |user| {
    ///     user.add_field("name")?.add_field("address.city")?;
    ///     Ok(())
    /// })?;
    ///
    /// assert_eq!(
    ///     builder.build(),
    ///     "query Q{\n    user{\n        address{\n            city\n        }\n        name\n    }\n}"
    /// );
    /// # Ok::<(), graphql_query_builder::QueryBuilderError>(())
    /// ```
    pub fn add_field_nested<F>(&mut self, path: &str, build: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut FieldBuilder<'_>) -> Result<()>,
    {
        if let Some(node_path) = self.definition.add_field(None, path, None, &[])? {
            build(&mut FieldBuilder {
                definition: &mut self.definition,
                parent_path: node_path,
            })?;
        }
        self.query_map.update_root_mapping(&self.definition);
        Ok(self)
    }

    /// Sets the strategy used when other builders are included.
    pub fn with_merging_strategy(&mut self, strategy: MergingStrategy) -> &mut Self {
        self.definition.merging_strategy = strategy;
        self
    }

    /// Merges `metadata` into the query's metadata. Metadata is never
    /// rendered.
    pub fn with_metadata(&mut self, metadata: Metadata) -> &mut Self {
        self.definition.metadata.extend(metadata);
        self
    }

    pub fn with_description(&mut self, description: impl Into<String>) -> &mut Self {
        let description = description.into();
        self.definition.description = (!description.trim().is_empty()).then_some(description);
        self
    }

    /// Merges `metadata` into the field at `path`, creating it if needed.
    pub fn with_field_metadata(&mut self, path: &str, metadata: Metadata) -> Result<&mut Self> {
        self.definition.add_field_metadata(None, path, metadata)?;
        self.query_map.update_root_mapping(&self.definition);
        Ok(self)
    }

    /// Declares a variable on the query whether or not an argument uses it.
    pub fn add_variable(&mut self, variable: Variable) -> &mut Self {
        self.definition.variables.add(variable);
        self
    }

    /// Merges another builder's definition into this one.
    ///
    /// The effective strategy comes from [`MergingStrategy::resolve`]. The
    /// merge is computed in full before anything is applied, so on error
    /// this builder is unchanged.
    #[tracing::instrument(skip_all, fields(
        target = %self.definition.name(),
        incoming = %other.definition.name(),
    ))]
    pub fn include(&mut self, other: &Self) -> Result<&mut Self> {
        let result = merge_definitions(&self.definition, &other.definition, &other.query_map)?;

        self.definition.fields = result.fields;
        self.definition.path_cache.clear();
        self.definition.variables.extend(&other.definition.variables);
        self.query_map.extend(result.query_map);
        self.query_map.update_root_mapping(&self.definition);

        tracing::debug!(
            strategy = %result.strategy,
            definitions = self.definition.definitions_count(),
            "Included query"
        );
        Ok(self)
    }

    /// Path segments leading to the parent of `node_path` inside the part of
    /// the tree that `query_name` was merged into.
    ///
    /// See [`QueryMap::get_path_to`].
    #[must_use]
    pub fn get_path_to(&self, query_name: &str, node_path: Option<&str>) -> Vec<String> {
        self.query_map
            .get_path_to(&self.definition, query_name, node_path)
    }

    /// Number of top-level fields.
    #[must_use]
    pub fn definitions_count(&self) -> usize {
        self.definition.definitions_count()
    }

    #[must_use]
    pub const fn definition(&self) -> &QueryDefinition {
        &self.definition
    }

    #[must_use]
    pub const fn query_map(&self) -> &QueryMap {
        &self.query_map
    }

    #[must_use]
    pub const fn variables(&self) -> &VariableSet {
        self.definition.variables()
    }

    /// Renders the query document.
    #[must_use]
    pub fn build(&self) -> String {
        render_definition(&self.definition)
    }

    /// Builds the transport payload, binding `variables` by name.
    #[must_use]
    pub fn to_request(
        &self,
        variables: impl IntoIterator<Item = (String, serde_json::Value)>,
    ) -> GraphQLRequest {
        variables.into_iter().fold(
            GraphQLRequest::new(self.build()).with_operation_name(self.definition.name()),
            |request, (name, value)| request.with_variable(&name, value),
        )
    }
}

impl fmt::Display for QueryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.build())
    }
}

/// Adds fields relative to a parent field.
///
/// Handed to the callback of [`QueryBuilder::add_field_nested`].
#[derive(Debug)]
pub struct FieldBuilder<'a> {
    definition: &'a mut QueryDefinition,
    parent_path: String,
}

impl FieldBuilder<'_> {
    /// Key chain of the parent field.
    #[must_use]
    pub fn parent_path(&self) -> &str {
        &self.parent_path
    }

    pub fn add_field(&mut self, path: &str) -> Result<&mut Self> {
        self.add_field_with(path, None, &[])
    }

    pub fn add_field_with_subfields(&mut self, path: &str, sub_fields: &[&str]) -> Result<&mut Self> {
        self.add_field_with(path, None, sub_fields)
    }

    pub fn add_field_with_arguments(
        &mut self,
        path: &str,
        arguments: impl Into<Arguments>,
    ) -> Result<&mut Self> {
        self.add_field_with(path, Some(&arguments.into()), &[])
    }

    pub fn add_field_with(
        &mut self,
        path: &str,
        arguments: Option<&Arguments>,
        sub_fields: &[&str],
    ) -> Result<&mut Self> {
        self.definition
            .add_field(Some(self.parent_path.as_str()), path, arguments, sub_fields)?;
        Ok(self)
    }

    pub fn add_field_nested<F>(&mut self, path: &str, build: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut FieldBuilder<'_>) -> Result<()>,
    {
        if let Some(node_path) =
            self.definition
                .add_field(Some(self.parent_path.as_str()), path, None, &[])?
        {
            build(&mut FieldBuilder {
                definition: &mut *self.definition,
                parent_path: node_path,
            })?;
        }
        Ok(self)
    }

    /// Merges `metadata` into the field at `path` below the parent.
    pub fn with_field_metadata(&mut self, path: &str, metadata: Metadata) -> Result<&mut Self> {
        self.definition
            .add_field_metadata(Some(self.parent_path.as_str()), path, metadata)?;
        Ok(self)
    }
}
