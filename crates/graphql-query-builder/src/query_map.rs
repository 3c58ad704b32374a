//! Lookup index from merged sub-query names to where they landed.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::definition::QueryDefinition;
use crate::field::{names_match, FieldDefinition};

/// Maps each logical query name to the top-level key its fields ended up
/// under after merging.
///
/// The map does not own field data. It is updated whenever definitions are
/// merged and re-validated against the tree with
/// [`QueryMap::update_root_mapping`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct QueryMap(BTreeMap<String, String>);

impl QueryMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, query_name: &str) -> Option<&str> {
        self.0.get(query_name).map(String::as_str)
    }

    pub fn insert(&mut self, query_name: impl Into<String>, root_key: impl Into<String>) {
        self.0.insert(query_name.into(), root_key.into());
    }

    /// Records `query_name` unless it is already mapped.
    pub fn insert_if_absent(&mut self, query_name: &str, root_key: &str) {
        self.0
            .entry(query_name.to_string())
            .or_insert_with(|| root_key.to_string());
    }

    /// Copies every entry of `fragment` into this map, replacing existing
    /// entries with the same name.
    pub fn extend(&mut self, fragment: Self) {
        self.0.extend(fragment.0);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Makes sure the definition's own name maps to a top-level field that
    /// still exists, falling back to the first field's alias or name.
    pub fn update_root_mapping(&mut self, definition: &QueryDefinition) {
        let name = definition.name();
        if self
            .get(name)
            .is_some_and(|key| definition.root_field(key).is_some())
        {
            return;
        }

        match definition.fields().values().next() {
            Some(first) => {
                self.0
                    .insert(name.to_string(), first.alias_or_name().to_string());
            }
            None => {
                self.0.remove(name);
            }
        }
    }

    /// Returns the path segments leading to the parent of the field named by
    /// the last segment of `node_path`, starting at `query_name`'s root.
    ///
    /// Without a `node_path` the result is just the root segment. An unknown
    /// query name yields an empty path; an unknown node yields the root only.
    #[must_use]
    pub fn get_path_to(
        &self,
        definition: &QueryDefinition,
        query_name: &str,
        node_path: Option<&str>,
    ) -> Vec<String> {
        let Some(root_key) = self.get(query_name) else {
            tracing::debug!(query_name, "No mapping for query");
            return Vec::new();
        };
        let mut trail = vec![root_key.to_string()];

        let Some(target) = node_path.and_then(last_segment) else {
            return trail;
        };
        let Some(root) = definition.root_field(root_key) else {
            return trail;
        };

        if find_parent_trail(root, target, &mut trail) {
            trail
        } else {
            vec![root_key.to_string()]
        }
    }
}

fn last_segment(node_path: &str) -> Option<&str> {
    let segment = node_path.rsplit('.').next()?.trim();
    // `alias:name` addresses the field by name
    let segment = segment.rsplit(':').next()?.trim();
    (!segment.is_empty()).then_some(segment)
}

fn find_parent_trail(node: &FieldDefinition, target: &str, trail: &mut Vec<String>) -> bool {
    for child in node.fields().values() {
        if names_match(child.name(), target) || child.alias().is_some_and(|a| names_match(a, target))
        {
            return true;
        }

        trail.push(child.alias_or_name().to_string());
        if find_parent_trail(child, target, trail) {
            return true;
        }
        trail.pop();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(name: &str, paths: &[&str]) -> QueryDefinition {
        let mut definition = QueryDefinition::new(name);
        for path in paths {
            definition.add_field(None, path, None, &[]).unwrap();
        }
        definition
    }

    #[test]
    fn test_update_root_mapping_falls_back_to_first_field() {
        let definition = definition("Users", &["users.id", "accounts.id"]);
        let mut map = QueryMap::new();
        map.update_root_mapping(&definition);
        assert_eq!(map.get("Users"), Some("accounts"));
    }

    #[test]
    fn test_update_root_mapping_keeps_valid_mapping() {
        let definition = definition("Users", &["users.id", "accounts.id"]);
        let mut map = QueryMap::new();
        map.insert("Users", "users");
        map.update_root_mapping(&definition);
        assert_eq!(map.get("Users"), Some("users"));

        map.insert("Users", "missing");
        map.update_root_mapping(&definition);
        assert_eq!(map.get("Users"), Some("accounts"));
    }

    #[test]
    fn test_get_path_to() {
        let definition = definition("Users", &["users.address.city", "users.posts.title"]);
        let mut map = QueryMap::new();
        map.insert("Users", "users");

        assert_eq!(map.get_path_to(&definition, "Users", None), vec!["users"]);
        assert_eq!(
            map.get_path_to(&definition, "Users", Some("address.city")),
            vec!["users", "address"]
        );
        assert_eq!(
            map.get_path_to(&definition, "Users", Some("POSTS")),
            vec!["users"]
        );
        assert_eq!(
            map.get_path_to(&definition, "Users", Some("unknown")),
            vec!["users"]
        );
        assert!(map.get_path_to(&definition, "Other", Some("city")).is_empty());
    }

    #[test]
    fn test_get_path_to_accumulates_aliases() {
        let definition = definition("Q", &["users.home:address.city"]);
        let mut map = QueryMap::new();
        map.update_root_mapping(&definition);
        assert_eq!(
            map.get_path_to(&definition, "Q", Some("city")),
            vec!["users", "home"]
        );
        assert_eq!(
            map.get_path_to(&definition, "Q", Some("home")),
            vec!["users"]
        );
    }
}
