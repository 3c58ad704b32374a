//! Dotted field path resolution.
//!
//! A field path looks like `"Type alias:parent.child.leaf"`:
//!
//! - an optional leading type token, separated by whitespace, that applies
//!   to the last segment. It is only recognized when it contains no dot and
//!   starts with an uppercase letter or `[`;
//! - dot-separated segments, each optionally written `alias:name`.
//!
//! Empty segments are skipped. Resolving a path walks the tree from the
//! root, reusing nodes that already exist and creating the missing ones, so
//! a path is materialized at most once per tree.

use std::collections::HashMap;

use crate::arguments::Arguments;
use crate::error::{QueryBuilderError, Result};
use crate::field::{FieldDefinition, FieldKey, FieldMap, OBJECT_TYPE};

/// One `alias:name` segment of a field path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathSegment<'a> {
    pub name: &'a str,
    pub alias: Option<&'a str>,
}

impl<'a> PathSegment<'a> {
    /// Splits an `alias:name` segment. Anything but exactly one colon with
    /// text on both sides is taken as a plain name.
    #[must_use]
    pub fn parse(segment: &'a str) -> Self {
        if segment.matches(':').count() == 1 {
            if let Some((alias, name)) = segment.split_once(':') {
                let (alias, name) = (alias.trim(), name.trim());
                if !alias.is_empty() && !name.is_empty() {
                    return Self {
                        name,
                        alias: Some(alias),
                    };
                }
            }
        }

        Self {
            name: segment,
            alias: None,
        }
    }
}

/// A field path split into its optional type token and segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath<'a> {
    pub field_type: Option<&'a str>,
    pub segments: Vec<PathSegment<'a>>,
}

impl<'a> FieldPath<'a> {
    #[must_use]
    pub fn parse(path: &'a str) -> Self {
        let (field_type, rest) = split_type_token(path.trim());
        let segments = rest
            .split('.')
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(PathSegment::parse)
            .collect();

        Self {
            field_type,
            segments,
        }
    }
}

fn split_type_token(path: &str) -> (Option<&str>, &str) {
    let Some((head, rest)) = path.split_once(char::is_whitespace) else {
        return (None, path);
    };

    let is_type_token = !head.contains('.')
        && head
            .chars()
            .next()
            .is_some_and(|c| c.is_uppercase() || c == '[');

    if is_type_token {
        (Some(head), rest.trim())
    } else {
        (None, path)
    }
}

/// Remembers where resolved paths landed.
///
/// Keys are the exact `(parent_path, path)` request. Each entry holds the
/// node's key chain and the type token written in the path. An entry is
/// only used while its node is still in the tree.
#[derive(Debug, Clone, Default)]
pub(crate) struct PathCache {
    entries: HashMap<(Option<String>, String), CachedPath>,
}

#[derive(Debug, Clone)]
struct CachedPath {
    keys: Vec<String>,
    field_type: Option<String>,
}

impl PathCache {
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

const fn plain_segment(name: &str) -> PathSegment<'_> {
    PathSegment { name, alias: None }
}

fn node_exists(fields: &FieldMap, keys: &[String]) -> bool {
    let mut level = Some(fields);
    for key in keys {
        level = level
            .and_then(|map| map.get(&FieldKey::new(key.as_str())))
            .map(|node| &node.fields);
    }
    !keys.is_empty() && level.is_some()
}

/// Resolves field paths against a [`FieldMap`].
#[derive(Debug, Clone, Copy)]
pub struct FieldPathResolver<'a> {
    default_type: &'a str,
}

impl<'a> FieldPathResolver<'a> {
    #[must_use]
    pub const fn new(default_type: &'a str) -> Self {
        Self { default_type }
    }

    /// Returns the field at `path`, creating any missing node on the way.
    ///
    /// `field_type` overrides a type token written in the path. `arguments`
    /// are merged into the terminal field. `parent_path` is a key chain
    /// (as returned by [`FieldDefinition::path`]) that `path` is relative to.
    ///
    /// Intermediate nodes are created as objects. Existing nodes keep their
    /// alias and are promoted to objects when a child is attached beneath a
    /// scalar-typed node.
    pub fn create_or_get<'t>(
        &self,
        fields: &'t mut FieldMap,
        path: &str,
        field_type: Option<&str>,
        arguments: Option<&Arguments>,
        parent_path: Option<&str>,
    ) -> Result<&'t mut FieldDefinition> {
        let parsed = FieldPath::parse(path);
        let Some((terminal, intermediate)) = parsed.segments.split_last() else {
            return Err(QueryBuilderError::EmptyFieldPath {
                path: path.to_string(),
            });
        };

        let parents = parent_path
            .into_iter()
            .flat_map(|p| p.split('.'))
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(plain_segment);

        Ok(self.resolve(
            fields,
            parents.chain(intermediate.iter().copied()),
            *terminal,
            field_type.or(parsed.field_type),
            arguments,
        ))
    }

    /// [`create_or_get`](Self::create_or_get) backed by a [`PathCache`].
    ///
    /// A repeated request skips path parsing and alias handling and walks
    /// straight down the key chain it resolved to the first time.
    pub(crate) fn create_or_get_cached<'t>(
        &self,
        fields: &'t mut FieldMap,
        cache: &mut PathCache,
        path: &str,
        field_type: Option<&str>,
        arguments: Option<&Arguments>,
        parent_path: Option<&str>,
    ) -> Result<&'t mut FieldDefinition> {
        let request = (parent_path.map(str::to_string), path.to_string());
        let hit = cache
            .entries
            .get(&request)
            .filter(|cached| node_exists(fields, &cached.keys))
            .cloned();

        let Some(cached) = hit else {
            let node = self.create_or_get(fields, path, field_type, arguments, parent_path)?;
            cache.entries.insert(
                request,
                CachedPath {
                    keys: node.path.split('.').map(str::to_string).collect(),
                    field_type: FieldPath::parse(path).field_type.map(str::to_string),
                },
            );
            return Ok(node);
        };

        let Some((terminal, parents)) = cached.keys.split_last() else {
            return Err(QueryBuilderError::EmptyFieldPath {
                path: path.to_string(),
            });
        };
        tracing::trace!(path = %cached.keys.join("."), "Resolved field path from cache");

        Ok(self.resolve(
            fields,
            parents.iter().map(String::as_str).map(plain_segment),
            plain_segment(terminal),
            field_type.or(cached.field_type.as_deref()),
            arguments,
        ))
    }

    fn resolve<'t, 's>(
        &self,
        fields: &'t mut FieldMap,
        parents: impl Iterator<Item = PathSegment<'s>>,
        terminal: PathSegment<'_>,
        requested_type: Option<&str>,
        arguments: Option<&Arguments>,
    ) -> &'t mut FieldDefinition {
        let mut current_path = String::new();
        let mut level = fields;
        for segment in parents {
            let node = self.resolve_intermediate(level, segment, &mut current_path);
            level = &mut node.fields;
        }

        let node = self.resolve_node(level, terminal, &mut current_path, requested_type);
        if let Some(requested) = requested_type {
            node.apply_type(requested, self.default_type);
        }
        if let Some(arguments) = arguments {
            node.arguments.merge(arguments);
        }
        node
    }

    fn resolve_intermediate<'t>(
        &self,
        level: &'t mut FieldMap,
        segment: PathSegment<'_>,
        current_path: &mut String,
    ) -> &'t mut FieldDefinition {
        let node = self.resolve_node(level, segment, current_path, Some(OBJECT_TYPE));
        if node.promote_to_object(self.default_type) {
            tracing::trace!(path = %node.path, "Promoted field to object type");
        }
        node
    }

    fn resolve_node<'t>(
        &self,
        level: &'t mut FieldMap,
        segment: PathSegment<'_>,
        current_path: &mut String,
        new_type: Option<&str>,
    ) -> &'t mut FieldDefinition {
        if !current_path.is_empty() {
            current_path.push('.');
        }
        current_path.push_str(segment.name);

        let node = level.entry(FieldKey::new(segment.name)).or_insert_with(|| {
            tracing::trace!(path = %current_path, "Creating field");
            FieldDefinition::with_path(
                segment.name.to_string(),
                new_type.unwrap_or(self.default_type).to_string(),
                current_path.clone(),
            )
        });

        // Keep the accumulated path on the node's actual key spelling.
        if node.path != *current_path {
            current_path.clone_from(&node.path);
        }
        node.fill_alias(segment.alias);
        node
    }

    /// Grafts a copy of `definition` and its subtree into `fields` at the
    /// definition's recorded path, merging into nodes that already exist.
    ///
    /// Returns the key of the top-level field the graft landed under.
    pub fn include(&self, fields: &mut FieldMap, definition: &FieldDefinition) -> String {
        let path = if definition.path.trim().is_empty() {
            definition.name()
        } else {
            definition.path.as_str()
        };
        let keys: Vec<&str> = path
            .split('.')
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .collect();
        let Some((_, parents)) = keys.split_last() else {
            return self.graft(fields, definition.name(), definition, "");
        };

        let mut current_path = String::new();
        let mut level = fields;
        for &name in parents {
            let node = self.resolve_intermediate(level, plain_segment(name), &mut current_path);
            level = &mut node.fields;
        }

        let key = keys.last().copied().unwrap_or(definition.name());
        let landed = self.graft(level, key, definition, &current_path);
        match current_path.split('.').next() {
            Some(root) if !root.is_empty() => root.to_string(),
            _ => landed,
        }
    }

    fn graft(
        &self,
        level: &mut FieldMap,
        key: &str,
        definition: &FieldDefinition,
        parent_path: &str,
    ) -> String {
        let key = FieldKey::new(key);
        let Some(existing) = level.get_mut(&key) else {
            let mut copy = definition.clone();
            copy.rebase(&join_path(parent_path, key.as_str()));
            let landed = key.to_string();
            level.insert(key, copy);
            return landed;
        };

        existing.fill_alias(definition.alias());
        existing.arguments.merge(&definition.arguments);
        if definition.has_fields() {
            existing.promote_to_object(self.default_type);
        } else {
            existing.apply_type(&definition.field_type, self.default_type);
        }
        for (key, value) in &definition.metadata {
            existing
                .metadata
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }

        let existing_path = existing.path.clone();
        for (child_key, child) in &definition.fields {
            self.graft(&mut existing.fields, child_key.as_str(), child, &existing_path);
        }

        existing_path
            .rsplit('.')
            .next()
            .unwrap_or(key.as_str())
            .to_string()
    }
}

fn join_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}
