//! Programmatic construction of GraphQL query documents.
//!
//! This crate assembles GraphQL `query`/`mutation` text from code: dotted
//! field paths, arguments, nested selections and typed variables. The
//! central piece is the field-path resolver, which turns paths such as
//! `"user.home:address.city"` into a field tree, and the merger, which
//! combines independently built queries into one document.
//!
//! Two models are provided:
//!
//! - [`QueryBuilder`] keeps a keyed field tree and supports merging other
//!   builders in with a [`MergingStrategy`].
//! - [`QueryBlock`] is a plain selection tree for hand-written queries and
//!   mutations.
//!
//! # Examples
//!
//! ## Building from paths
//!
//! ```
//! use graphql_query_builder::{Arguments, QueryBuilder, Variable};
//!
//! let id = Variable::new("$id", "Int")?;
//! let mut builder = QueryBuilder::new("GetUser");
//! builder
//!     .add_field_with_arguments("user", Arguments::new().with("id", id))?
//!     .add_field("user.name")?;
//!
//! assert_eq!(
//!     builder.to_string(),
//!     "query GetUser($id:Int){\n    user(id:$id){\n        name\n    }\n}"
//! );
//! # Ok::<(), graphql_query_builder::QueryBuilderError>(())
//! ```
//!
//! ## Merging queries
//!
//! ```
//! use graphql_query_builder::{MergingStrategy, QueryBuilder};
//!
//! let mut root = QueryBuilder::new("Dashboard");
//! root.add_field("tables.id")?;
//!
//! let mut other = QueryBuilder::with_strategy("Archive", MergingStrategy::NeverMerge);
//! other.add_field("tables.name")?;
//!
//! root.include(&other)?;
//! assert_eq!(root.definitions_count(), 2);
//! assert_eq!(root.get_path_to("Archive", None), vec!["tables_1"]);
//! # Ok::<(), graphql_query_builder::QueryBuilderError>(())
//! ```

mod arguments;
mod block;
mod builder;
mod definition;
mod error;
mod field;
mod merge;
mod options;
mod path;
mod query_map;
mod render;
mod request;
mod value;
mod variable;

pub use arguments::Arguments;
pub use block::{FieldItem, GraphQLFields, OperationType, QueryBlock};
pub use builder::{FieldBuilder, QueryBuilder};
pub use definition::QueryDefinition;
pub use error::{QueryBuilderError, Result};
pub use field::{
    should_convert_to_object_type, unique_key, FieldDefinition, FieldKey, FieldMap, Metadata,
    DEFAULT_FIELD_TYPE, OBJECT_TYPE,
};
pub use merge::{can_merge_fields, merge_definitions, merge_fields, MergeResult, MergingStrategy};
pub use options::QueryBuilderOptions;
pub use path::{FieldPath, FieldPathResolver, PathSegment};
pub use query_map::QueryMap;
pub use render::{render_block, render_definition};
pub use request::GraphQLRequest;
pub use value::{date_time, Value};
pub use variable::{Variable, VariableSet};
