//! Tests for the `QueryBlock` selection model and its rendering.

use graphql_query_builder::{
    Arguments, GraphQLFields, QueryBlock, QueryBuilderError, Result, Value, Variable,
};

struct Author;

impl GraphQLFields for Author {
    fn selection(block: &mut QueryBlock) -> Result<()> {
        block.add_fields(["id", "name"])?;
        Ok(())
    }
}

struct Post;

impl GraphQLFields for Post {
    fn selection(block: &mut QueryBlock) -> Result<()> {
        block.add_field("title")?;
        let mut author = QueryBlock::field("author")?;
        author.include::<Author>()?;
        block.add_block(author);
        Ok(())
    }
}

#[test]
fn test_query_with_nested_blocks() {
    let mut user = QueryBlock::field("user").unwrap().with_argument("id", 1);
    user.add_fields(["name", "email"]).unwrap();
    let mut posts = QueryBlock::field("posts")
        .unwrap()
        .with_alias("recent")
        .with_argument("first", 3);
    posts.add_field("title").unwrap();
    user.add_block(posts);

    let mut query = QueryBlock::query("UserPage");
    query.add_block(user);

    insta::assert_snapshot!(query.to_string(), @r"
    query UserPage{
        user(id:1){
            email
            name
            recent:posts(first:3){
                title
            }
        }
    }
    ");
}

#[test]
fn test_root_variable_renders_declaration() {
    let id = Variable::new("$id", "Int").unwrap();
    let mut query = QueryBlock::query("GetUser").with_argument("id", id);
    query.add_field("name").unwrap();

    assert_eq!(query.to_string(), "query GetUser($id:Int){\n    name\n}");
}

#[test]
fn test_nested_variable_renders_reference() {
    let id = Variable::new("$id", "Int").unwrap();
    let mut user = QueryBlock::field("user").unwrap().with_argument("id", id);
    user.add_field("name").unwrap();
    let mut query = QueryBlock::query("GetUser");
    query.add_block(user);

    assert_eq!(
        query.to_string(),
        "query GetUser($id:Int){\n    user(id:$id){\n        name\n    }\n}"
    );
}

#[test]
fn test_mutation() {
    let input = Variable::new("$input", "UserInput!").unwrap();
    let mut update = QueryBlock::field("updateUser")
        .unwrap()
        .with_arguments(Arguments::new().with("input", input).with("notify", false));
    update.add_fields(["id", "updatedAt"]).unwrap();

    let mut mutation = QueryBlock::mutation("UpdateUser");
    mutation.add_block(update);

    insta::assert_snapshot!(mutation.to_string(), @r"
    mutation UpdateUser($input:UserInput!){
        updateUser(input:$input, notify:false){
            id
            updatedAt
        }
    }
    ");
}

#[test]
fn test_anonymous_query() {
    let mut query = QueryBlock::query("");
    query.add_field("viewer").unwrap();
    assert_eq!(query.to_string(), "query{\n    viewer\n}");
}

#[test]
fn test_type_driven_selection_renders_inline() {
    let mut posts = QueryBlock::field("posts").unwrap();
    posts.include::<Post>().unwrap();
    posts.add_field("id").unwrap();
    let mut query = QueryBlock::query("Feed");
    query.add_block(posts);

    insta::assert_snapshot!(query.to_string(), @r"
    query Feed{
        posts{
            author{
                id
                name
            }
            id
            title
        }
    }
    ");
}

#[test]
fn test_selection_from_json() {
    let mut query = QueryBlock::query("Search");
    query
        .add_selection_json(&serde_json::json!({
            "name": "search",
            "arguments": { "term": "graphql", "limit": 5 },
            "fields": ["id", { "name": "owner", "alias": "by", "fields": ["login"] }]
        }))
        .unwrap();

    insta::assert_snapshot!(query.to_string(), @r#"
    query Search{
        search(limit:5, term:"graphql"){
            by:owner{
                login
            }
            id
        }
    }
    "#);
}

#[test]
fn test_unsupported_selection_values() {
    let mut query = QueryBlock::query("Q");
    for value in [
        serde_json::json!(true),
        serde_json::json!(null),
        serde_json::json!({ "fields": ["id"] }),
        serde_json::json!(["id", 42]),
        serde_json::json!(["id", { "name": "owner", "fields": ["login", false] }]),
    ] {
        assert!(matches!(
            query.add_selection_json(&value),
            Err(QueryBuilderError::UnsupportedFieldValue { .. })
        ));
    }
    assert!(query.fields().is_empty());
}

#[test]
fn test_structured_arguments() {
    let when = chrono::DateTime::parse_from_rfc3339("2024-05-01T08:30:00.250+02:00").unwrap();
    let mut events = QueryBlock::field("events")
        .unwrap()
        .with_argument("since", when)
        .with_argument("tags", vec!["a", "b"])
        .with_argument("status", Value::enum_value("OPEN"));
    events.add_field("id").unwrap();
    let mut query = QueryBlock::query("Events");
    query.add_block(events);

    assert_eq!(
        query.to_string(),
        "query Events{\n    events(since:\"2024-05-01T08:30:00.250+02:00\", status:OPEN, tags:[\"a\", \"b\"]){\n        id\n    }\n}"
    );
}

#[test]
fn test_block_request_payload() {
    let mut query = QueryBlock::query("Viewer");
    query.add_field("login").unwrap();

    let json = serde_json::to_value(query.to_request()).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "query": "query Viewer{\n    login\n}",
            "operationName": "Viewer"
        })
    );
}
