use thiserror::Error;

pub type Result<T> = std::result::Result<T, QueryBuilderError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryBuilderError {
    #[error("Field path '{path}' does not contain any field name")]
    EmptyFieldPath { path: String },

    #[error("Field name must not be empty")]
    EmptyFieldName,

    #[error("Invalid variable name '{name}': must start with '$' and be non-empty")]
    InvalidVariableName { name: String },

    #[error("Variable '{name}' must declare a non-empty type")]
    InvalidVariableType { name: String },

    #[error(
        "Failed to merge query '{query_name}': field '{field_name}' has type '{existing_type}' but the merged query declares '{incoming_type}'"
    )]
    QueryMerge {
        query_name: String,
        field_name: String,
        existing_type: String,
        incoming_type: String,
    },

    #[error("Unknown merging strategy '{value}'")]
    UnknownMergingStrategy { value: String },

    #[error("Unsupported field value in selection: {value}")]
    UnsupportedFieldValue { value: String },

    #[error("Failed to convert value into a GraphQL argument: {0}")]
    ValueSerialization(String),
}
