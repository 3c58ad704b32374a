//! Text rendering of query documents.
//!
//! Both trees render the same way: four spaces per nesting level, `{`/`}`
//! block delimiters, one field per line and `(key:value, key:value)`
//! argument lists.

use crate::block::{FieldItem, QueryBlock};
use crate::definition::QueryDefinition;
use crate::field::{compare_ignore_case, FieldDefinition, FieldMap};
use crate::value::Value;
use crate::variable::VariableSet;

const INDENT: &str = "    ";

/// Renders a [`QueryDefinition`] as a `query` document.
///
/// Fields are ordered by alias-or-name, then name, ignoring case.
#[must_use]
#[tracing::instrument(skip(definition), fields(
    name = %definition.name(),
    fields = definition.definitions_count(),
    variables = definition.variables().len()
))]
pub fn render_definition(definition: &QueryDefinition) -> String {
    let mut text = String::from("query");
    if !definition.name().is_empty() {
        text.push(' ');
        text.push_str(definition.name());
    }
    text.push_str(&definition.variables().to_declaration_list());
    text.push_str("{\n");
    write_fields(&mut text, definition.fields(), 1);
    text.push('}');

    tracing::debug!(length = text.len(), "Rendered query definition");
    text
}

fn sorted_fields(fields: &FieldMap) -> Vec<&FieldDefinition> {
    let mut sorted: Vec<&FieldDefinition> = fields.values().collect();
    sorted.sort_by(|a, b| {
        compare_ignore_case(a.alias_or_name(), b.alias_or_name())
            .then_with(|| compare_ignore_case(a.name(), b.name()))
            .then_with(|| a.path().cmp(b.path()))
    });
    sorted
}

fn write_fields(text: &mut String, fields: &FieldMap, depth: usize) {
    let indent = INDENT.repeat(depth);
    for field in sorted_fields(fields) {
        text.push_str(&indent);
        if let Some(alias) = field.alias() {
            text.push_str(alias);
            text.push(':');
        }
        text.push_str(field.name());
        text.push_str(&field.arguments().render());

        if field.has_fields() {
            text.push_str("{\n");
            write_fields(text, field.fields(), depth + 1);
            text.push_str(&indent);
            text.push_str("}\n");
        } else {
            text.push('\n');
        }
    }
}

/// Renders a [`QueryBlock`] tree.
///
/// The `query`/`mutation` keyword is only printed for the root block. Root
/// arguments holding variables render as declarations (`$id:Int`), and any
/// variable registered on the root but not passed as a root argument is
/// declared after them. Below the root, variables render as `$id`.
#[must_use]
#[tracing::instrument(skip(block), fields(name = %block.name()))]
pub fn render_block(block: &QueryBlock) -> String {
    let mut text = String::new();
    write_block(&mut text, block, 0);
    text.truncate(text.trim_end().len());

    tracing::debug!(length = text.len(), "Rendered query block");
    text
}

fn write_block(text: &mut String, block: &QueryBlock, depth: usize) {
    let indent = INDENT.repeat(depth);
    text.push_str(&indent);

    if depth == 0 {
        if let Some(operation) = block.operation() {
            text.push_str(operation.keyword());
            if !block.name().is_empty() {
                text.push(' ');
            }
        }
    }
    if let Some(alias) = block.alias() {
        text.push_str(alias);
        text.push(':');
    }
    text.push_str(block.name());

    if depth == 0 {
        text.push_str(&root_arguments(block));
    } else {
        text.push_str(&block.arguments().render());
    }

    if block.fields().is_empty() {
        text.push('\n');
        return;
    }

    text.push_str("{\n");
    write_selection(text, block.fields(), depth + 1);
    text.push_str(&indent);
    text.push_str("}\n");
}

fn write_selection(text: &mut String, items: &[FieldItem], depth: usize) {
    for item in visible_items(items) {
        match item {
            FieldItem::Field(name) => {
                text.push_str(&INDENT.repeat(depth));
                text.push_str(name);
                text.push('\n');
            }
            FieldItem::Block(block) => write_block(text, block, depth),
        }
    }
}

/// Splices the items of inline blocks into their parent's selection, drops
/// repeated field names and orders the result case-insensitively.
fn visible_items(items: &[FieldItem]) -> Vec<&FieldItem> {
    fn flatten<'a>(items: &'a [FieldItem], out: &mut Vec<&'a FieldItem>) {
        for item in items {
            match item {
                FieldItem::Block(block) if block.is_empty() => flatten(block.fields(), out),
                FieldItem::Field(name) if out.iter().any(|seen| is_field_named(seen, name)) => {}
                _ => out.push(item),
            }
        }
    }

    let mut visible = Vec::new();
    flatten(items, &mut visible);
    visible.sort_by(|a, b| compare_ignore_case(a.sort_key(), b.sort_key()));
    visible
}

fn is_field_named(item: &FieldItem, name: &str) -> bool {
    matches!(item, FieldItem::Field(existing) if existing == name)
}

fn root_arguments(block: &QueryBlock) -> String {
    let mut declared = VariableSet::new();
    let mut parts = Vec::new();

    for (key, value) in block.arguments().iter() {
        match value {
            Value::Variable(variable) => {
                if declared.add(variable.clone()) {
                    parts.push(variable.declaration());
                }
            }
            _ => parts.push(format!("{key}:{value}")),
        }
    }
    for variable in block.variables() {
        if !declared.contains(variable) {
            parts.push(variable.declaration());
        }
    }

    if parts.is_empty() {
        String::new()
    } else {
        format!("({})", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arguments::Arguments;
    use crate::variable::Variable;

    #[test]
    fn test_render_empty_definition() {
        let definition = QueryDefinition::new("Empty");
        assert_eq!(render_definition(&definition), "query Empty{\n}");
    }

    #[test]
    fn test_render_sorts_by_alias_or_name() {
        let mut definition = QueryDefinition::new("Q");
        for path in ["zeta", "b:alpha", "Gamma"] {
            definition.add_field(None, path, None, &[]).unwrap();
        }
        assert_eq!(
            render_definition(&definition),
            "query Q{\n    b:alpha\n    Gamma\n    zeta\n}"
        );
    }

    #[test]
    fn test_render_arguments_and_variables() {
        let id = Variable::new("$id", "Int").unwrap();
        let mut definition = QueryDefinition::new("GetUser");
        let arguments = Arguments::new().with("id", id).with("active", true);
        definition
            .add_field(None, "user", Some(&arguments), &["name"])
            .unwrap();

        assert_eq!(
            render_definition(&definition),
            "query GetUser($id:Int){\n    user(active:true, id:$id){\n        name\n    }\n}"
        );
    }

    #[test]
    fn test_root_block_declares_variables() {
        let id = Variable::new("$id", "Int").unwrap();
        let mut root = QueryBlock::query("GetUser").with_argument("id", id);
        root.add_field("viewer").unwrap();
        assert_eq!(
            render_block(&root),
            "query GetUser($id:Int){\n    viewer\n}"
        );
    }

    struct Audit;

    impl crate::block::GraphQLFields for Audit {
        fn selection(block: &mut QueryBlock) -> crate::error::Result<()> {
            block.add_fields(["updatedAt", "id", "createdAt"])?;
            Ok(())
        }
    }

    #[test]
    fn test_inline_selection_is_merged_into_sorted_order() {
        let mut user = QueryBlock::field("user").unwrap();
        user.add_fields(["name", "Email"]).unwrap();
        user.include::<Audit>().unwrap();
        user.add_field("id").unwrap();
        let mut root = QueryBlock::query("Q");
        root.add_block(user);

        assert_eq!(
            render_block(&root),
            "query Q{\n    user{\n        createdAt\n        Email\n        id\n        name\n        updatedAt\n    }\n}"
        );
    }
}
