//! The request payload handed to a GraphQL transport.

use serde::Serialize;

/// `{ query, variables, operationName }` body of a GraphQL HTTP request.
///
/// Building the payload is as far as this crate goes; sending it is up to
/// the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQLRequest {
    pub query: String,
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    pub variables: serde_json::Map<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
}

impl GraphQLRequest {
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            variables: serde_json::Map::new(),
            operation_name: None,
        }
    }

    /// Binds a variable value. A leading `$` on the name is dropped.
    #[must_use]
    pub fn with_variable(mut self, name: &str, value: impl Into<serde_json::Value>) -> Self {
        self.variables
            .insert(name.trim_start_matches('$').to_string(), value.into());
        self
    }

    #[must_use]
    pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.operation_name = (!name.is_empty()).then_some(name);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_request() {
        let request = GraphQLRequest::new("query Q{\n    id\n}")
            .with_operation_name("Q")
            .with_variable("$id", 5);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "query": "query Q{\n    id\n}",
                "variables": { "id": 5 },
                "operationName": "Q"
            })
        );
    }

    #[test]
    fn test_empty_parts_are_omitted() {
        let json = serde_json::to_value(GraphQLRequest::new("{ a }").with_operation_name("")).unwrap();
        assert_eq!(json, serde_json::json!({ "query": "{ a }" }));
    }
}
