//! Ad-hoc selection blocks for the fluent query/mutation model.
//!
//! [`QueryBlock`] is a lighter tree than the field definition tree: a block
//! holds a name, optional alias, arguments, and a selection list mixing
//! plain field names and nested blocks, kept sorted case-insensitively.
//!
//! # Example
//!
//! ```
//! use graphql_query_builder::{QueryBlock, Variable};
//!
//! let id = Variable::new("$id", "ID!")?;
//! let mut user = QueryBlock::field("user")?.with_argument("id", id);
//! user.add_fields(["name", "email"])?;
//!
//! let mut query = QueryBlock::query("GetUser");
//! query.add_block(user);
//!
//! assert_eq!(
//!     query.to_string(),
//!     "query GetUser($id:ID!){\n    user(id:$id){\n        email\n        name\n    }\n}"
//! );
//! # Ok::<(), graphql_query_builder::QueryBuilderError>(())
//! ```

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

use crate::arguments::Arguments;
use crate::error::{QueryBuilderError, Result};
use crate::field::compare_ignore_case;
use crate::render::render_block;
use crate::request::GraphQLRequest;
use crate::value::Value;
use crate::variable::{Variable, VariableSet};

/// Root operation keyword of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OperationType {
    Query,
    Mutation,
}

impl OperationType {
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
        }
    }
}

/// One entry of a block's selection list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldItem {
    Field(String),
    Block(QueryBlock),
}

impl FieldItem {
    pub(crate) fn sort_key(&self) -> &str {
        match self {
            Self::Field(name) => name,
            Self::Block(block) if block.is_empty => "",
            Self::Block(block) => block.alias_or_name(),
        }
    }
}

impl TryFrom<&serde_json::Value> for FieldItem {
    type Error = QueryBuilderError;

    /// Strings become field names. Objects become blocks and may carry
    /// `name`, `alias`, `arguments` and `fields`.
    fn try_from(value: &serde_json::Value) -> Result<Self> {
        let unsupported = || QueryBuilderError::UnsupportedFieldValue {
            value: value.to_string(),
        };

        match value {
            serde_json::Value::String(name) if !name.trim().is_empty() => {
                Ok(Self::Field(name.trim().to_string()))
            }
            serde_json::Value::Object(object) => {
                let name = object
                    .get("name")
                    .and_then(serde_json::Value::as_str)
                    .ok_or_else(unsupported)?;
                let mut block = QueryBlock::field(name)?;

                if let Some(alias) = object.get("alias").and_then(serde_json::Value::as_str) {
                    block = block.with_alias(alias);
                }
                if let Some(arguments) = object.get("arguments") {
                    block = block.with_arguments(Arguments::from_serialize(arguments)?);
                }
                if let Some(fields) = object.get("fields") {
                    let items = fields.as_array().ok_or_else(unsupported)?;
                    for item in items {
                        block.add_selection_json(item)?;
                    }
                }
                Ok(Self::Block(block))
            }
            _ => Err(unsupported()),
        }
    }
}

fn collect_selection(value: &serde_json::Value, items: &mut Vec<FieldItem>) -> Result<()> {
    if let serde_json::Value::Array(entries) = value {
        for entry in entries {
            collect_selection(entry, items)?;
        }
        return Ok(());
    }
    items.push(FieldItem::try_from(value)?);
    Ok(())
}

/// Types that know the selection they should contribute to a block.
///
/// This is the typed counterpart of reflecting over a struct's fields:
/// implement it once per response shape and pull the shape into any block
/// with [`QueryBlock::include`].
pub trait GraphQLFields {
    fn selection(block: &mut QueryBlock) -> Result<()>;
}

/// A node of the fluent selection tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryBlock {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    alias: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    operation: Option<OperationType>,
    #[serde(skip_serializing_if = "Arguments::is_empty")]
    arguments: Arguments,
    #[serde(skip_serializing_if = "VariableSet::is_empty")]
    variables: VariableSet,
    fields: Vec<FieldItem>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    is_empty: bool,
}

impl QueryBlock {
    fn new(name: String, operation: Option<OperationType>) -> Self {
        Self {
            name,
            alias: None,
            operation,
            arguments: Arguments::new(),
            variables: VariableSet::new(),
            fields: Vec::new(),
            is_empty: false,
        }
    }

    /// Creates a root `query` block. The name may be empty for an
    /// anonymous operation.
    #[must_use]
    pub fn query(name: impl Into<String>) -> Self {
        Self::new(name.into().trim().to_string(), Some(OperationType::Query))
    }

    /// Creates a root `mutation` block.
    #[must_use]
    pub fn mutation(name: impl Into<String>) -> Self {
        Self::new(name.into().trim().to_string(), Some(OperationType::Mutation))
    }

    /// Creates a nested field block.
    pub fn field(name: impl Into<String>) -> Result<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(QueryBuilderError::EmptyFieldName);
        }
        Ok(Self::new(name, None))
    }

    /// A nameless block whose selection renders inline in its parent.
    fn inline() -> Self {
        let mut block = Self::new(String::new(), None);
        block.is_empty = true;
        block
    }

    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        let alias = alias.into().trim().to_string();
        self.alias = (!alias.is_empty()).then_some(alias);
        self
    }

    /// Adds an argument, registering any variable it references.
    #[must_use]
    pub fn with_argument(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.variables.extract_from_value(&value);
        self.arguments.insert(key, value);
        self
    }

    #[must_use]
    pub fn with_arguments(mut self, arguments: Arguments) -> Self {
        self.variables.extract_from_arguments(&arguments);
        self.arguments.merge(&arguments);
        self
    }

    #[must_use]
    pub fn with_variable(mut self, variable: Variable) -> Self {
        self.add_variable(variable);
        self
    }

    /// Registers a variable on this block without referencing it.
    pub fn add_variable(&mut self, variable: Variable) -> &mut Self {
        self.variables.add(variable);
        self
    }

    /// Adds a plain field name to the selection.
    pub fn add_field(&mut self, name: &str) -> Result<&mut Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(QueryBuilderError::EmptyFieldName);
        }

        self.push_field(name.to_string());
        Ok(self)
    }

    fn push_field(&mut self, name: String) {
        let exists = self
            .fields
            .iter()
            .any(|item| matches!(item, FieldItem::Field(existing) if *existing == name));
        if !exists {
            self.insert_sorted(FieldItem::Field(name));
        }
    }

    pub fn add_fields<I, S>(&mut self, names: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.add_field(name.as_ref())?;
        }
        Ok(self)
    }

    /// Adds a nested block. Its variables are registered on this block too,
    /// so they end up declared on the root.
    pub fn add_block(&mut self, block: Self) -> &mut Self {
        self.variables.extend(&block.variables);
        self.insert_sorted(FieldItem::Block(block));
        self
    }

    /// Adds the selection described by `T` inline.
    pub fn include<T: GraphQLFields>(&mut self) -> Result<&mut Self> {
        let mut inline = Self::inline();
        T::selection(&mut inline)?;
        Ok(self.add_block(inline))
    }

    /// Adds a selection entry described as JSON.
    ///
    /// Arrays are flattened. Every entry is converted before any is added,
    /// so an unsupported entry leaves the block untouched.
    pub fn add_selection_json(&mut self, value: &serde_json::Value) -> Result<&mut Self> {
        let mut items = Vec::new();
        collect_selection(value, &mut items)?;

        for item in items {
            match item {
                FieldItem::Field(name) => self.push_field(name),
                FieldItem::Block(block) => {
                    self.add_block(block);
                }
            }
        }
        Ok(self)
    }

    fn insert_sorted(&mut self, item: FieldItem) {
        let key = item.sort_key();
        let index = self
            .fields
            .partition_point(|existing| compare_ignore_case(existing.sort_key(), key) != Ordering::Greater);
        self.fields.insert(index, item);
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    #[must_use]
    pub fn alias_or_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    #[must_use]
    pub const fn operation(&self) -> Option<OperationType> {
        self.operation
    }

    #[must_use]
    pub const fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    #[must_use]
    pub const fn variables(&self) -> &VariableSet {
        &self.variables
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldItem] {
        &self.fields
    }

    /// True for inline blocks that contribute fields but no name.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.is_empty
    }

    /// Builds the transport payload for this block.
    #[must_use]
    pub fn to_request(&self) -> GraphQLRequest {
        GraphQLRequest::new(render_block(self)).with_operation_name(self.name.clone())
    }
}

impl fmt::Display for QueryBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_block(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_are_sorted_case_insensitively() {
        let mut block = QueryBlock::field("user").unwrap();
        block.add_fields(["name", "Email", "age", "name"]).unwrap();
        let names: Vec<&str> = block.fields().iter().map(FieldItem::sort_key).collect();
        assert_eq!(names, vec!["age", "Email", "name"]);
    }

    #[test]
    fn test_blocks_sort_by_alias() {
        let mut root = QueryBlock::query("Q");
        root.add_field("m").unwrap();
        root.add_block(QueryBlock::field("zebra").unwrap().with_alias("a"));
        let names: Vec<&str> = root.fields().iter().map(FieldItem::sort_key).collect();
        assert_eq!(names, vec!["a", "m"]);
    }

    #[test]
    fn test_empty_field_name_is_rejected() {
        assert_eq!(QueryBlock::field(" "), Err(QueryBuilderError::EmptyFieldName));
        let mut block = QueryBlock::query("Q");
        assert!(matches!(
            block.add_field(""),
            Err(QueryBuilderError::EmptyFieldName)
        ));
    }

    #[test]
    fn test_nested_variables_bubble_up() {
        let id = Variable::new("$id", "Int").unwrap();
        let mut posts = QueryBlock::field("posts").unwrap().with_argument("author", id);
        posts.add_field("title").unwrap();
        let mut user = QueryBlock::field("user").unwrap();
        user.add_block(posts);
        let mut root = QueryBlock::query("Q");
        root.add_block(user);

        assert_eq!(root.variables().to_declaration_list(), "($id:Int)");
    }

    #[test]
    fn test_selection_json() {
        let mut root = QueryBlock::query("Q");
        root.add_selection_json(&serde_json::json!([
            "id",
            { "name": "posts", "alias": "p", "arguments": { "first": 2 }, "fields": ["title"] }
        ]))
        .unwrap();

        assert_eq!(root.fields().len(), 2);
        let FieldItem::Block(posts) = &root.fields()[1] else {
            panic!("expected a block");
        };
        assert_eq!(posts.alias(), Some("p"));
        assert_eq!(posts.arguments().render(), "(first:2)");
    }

    #[test]
    fn test_selection_json_rejects_other_values() {
        let mut root = QueryBlock::query("Q");
        let err = root.add_selection_json(&serde_json::json!(42)).unwrap_err();
        assert_eq!(
            err,
            QueryBuilderError::UnsupportedFieldValue {
                value: "42".to_string()
            }
        );
        assert!(root
            .add_selection_json(&serde_json::json!({ "alias": "x" }))
            .is_err());
    }

    #[test]
    fn test_selection_json_array_is_all_or_nothing() {
        let mut root = QueryBlock::query("Q");
        root.add_field("name").unwrap();

        let err = root
            .add_selection_json(&serde_json::json!([
                "id",
                { "name": "user", "arguments": { "id": 1 }, "fields": ["login"] },
                42
            ]))
            .unwrap_err();
        assert!(matches!(err, QueryBuilderError::UnsupportedFieldValue { .. }));

        let names: Vec<&str> = root.fields().iter().map(FieldItem::sort_key).collect();
        assert_eq!(names, vec!["name"]);
    }
}
