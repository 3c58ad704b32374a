//! Field argument lists.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{QueryBuilderError, Result};
use crate::value::Value;

/// Arguments attached to a field, kept sorted by key.
///
/// Arguments accumulate: [`Arguments::merge`] adds new keys, deep-merges
/// object values and replaces everything else with the incoming value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Arguments(BTreeMap<String, Value>);

impl Arguments {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Builds an argument list from the top-level fields of any serializable
    /// struct or map.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        match Value::from_serialize(value)? {
            Value::Object(map) => Ok(Self(map.into_iter().collect())),
            Value::Null => Ok(Self::new()),
            other => Err(QueryBuilderError::ValueSerialization(format!(
                "arguments must serialize to an object, got {other}"
            ))),
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.0.values()
    }

    /// Merges `incoming` into this list.
    pub fn merge(&mut self, incoming: &Self) {
        for (key, value) in &incoming.0 {
            match self.0.get_mut(key) {
                Some(existing) => existing.merge(value),
                None => {
                    self.0.insert(key.clone(), value.clone());
                }
            }
        }
    }

    /// Renders `(key:value, key:value)`, or nothing for an empty list.
    #[must_use]
    pub fn render(&self) -> String {
        if self.0.is_empty() {
            return String::new();
        }

        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(key, value)| format!("{key}:{value}"))
            .collect();
        format!("({})", parts.join(", "))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Arguments {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for Arguments {
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::Variable;

    #[test]
    fn test_render_sorted_by_key() {
        let arguments = Arguments::new().with("last", 5).with("first", "a");
        assert_eq!(arguments.render(), "(first:\"a\", last:5)");
        assert_eq!(Arguments::new().render(), "");
    }

    #[test]
    fn test_variables_render_as_references() {
        let id = Variable::new("$id", "Int").unwrap();
        let arguments = Arguments::from([("id", id)]);
        assert_eq!(arguments.render(), "(id:$id)");
    }

    #[test]
    fn test_merge_accumulates() {
        let mut existing = Arguments::new()
            .with("first", 10)
            .with("where", Value::from_iter([("a", 1)]));
        let incoming = Arguments::new()
            .with("first", 20)
            .with("after", "cursor")
            .with("where", Value::from_iter([("b", 2)]));

        existing.merge(&incoming);
        assert_eq!(
            existing.render(),
            "(after:\"cursor\", first:20, where:{a:1, b:2})"
        );
    }

    #[derive(Serialize)]
    struct Page {
        first: u32,
        after: Option<String>,
    }

    #[test]
    fn test_from_serialize() {
        let arguments = Arguments::from_serialize(&Page {
            first: 3,
            after: None,
        })
        .unwrap();
        assert_eq!(arguments.render(), "(after:null, first:3)");

        assert!(Arguments::from_serialize(&vec![1, 2]).is_err());
    }
}
