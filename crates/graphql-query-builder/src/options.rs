//! Builder options.

use serde::{Deserialize, Serialize};

use crate::field::DEFAULT_FIELD_TYPE;
use crate::merge::MergingStrategy;

/// Options applied when a [`QueryBuilder`](crate::QueryBuilder) is created.
///
/// Deserializable from any serde format so callers can keep them in their
/// own configuration files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryBuilderOptions {
    /// Strategy used when other builders are included into this one.
    pub merging_strategy: MergingStrategy,
    /// Type given to fields added without an explicit type.
    pub default_type: String,
}

impl Default for QueryBuilderOptions {
    fn default() -> Self {
        Self {
            merging_strategy: MergingStrategy::default(),
            default_type: DEFAULT_FIELD_TYPE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_partial_options() {
        let options: QueryBuilderOptions =
            serde_json::from_str(r#"{ "mergingStrategy": "mergeByFieldPath" }"#).unwrap();
        assert_eq!(options.merging_strategy, MergingStrategy::MergeByFieldPath);
        assert_eq!(options.default_type, "String");
    }

    #[test]
    fn test_deserialize_empty_options() {
        let options: QueryBuilderOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, QueryBuilderOptions::default());
    }

    #[test]
    fn test_unknown_strategy_is_rejected() {
        let result: Result<QueryBuilderOptions, _> =
            serde_json::from_str(r#"{ "mergingStrategy": "sometimes" }"#);
        assert!(result.is_err());
    }
}
