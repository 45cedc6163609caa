use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use maplit::hashmap;
use pretty_assertions::assert_eq;
use route_resolver::BoxError;
use route_resolver::ExecutionParameters;
use route_resolver::Executor;
use route_resolver::ResolveError;
use route_resolver::Route;
use route_resolver::Router;
use route_resolver::SelectionContext;
use route_resolver::error::ErrorExtension;
use route_resolver::json_ext::Value;
use route_resolver::operation::Operation;
use route_resolver::schema::Schema;
use serde_json_bytes::json;

const SCHEMA: &str = r#"
query: Query
types:
  Query:
    users:
      type: "[User!]!"
      arguments:
        role: { type: "String!" }
        first: { type: Int, default: 10 }
  User:
    id: { type: "ID!" }
    name: { type: String }
    posts: { type: "[Post!]!" }
  Post:
    id: { type: "ID!" }
    authorId: { type: "ID!" }
    title: { type: String }
    comments: { type: "[Comment!]!" }
  Comment:
    postId: { type: "ID!" }
    body: { type: String }
"#;

/// Counts action executions per route coordinate.
#[derive(Clone, Default)]
struct CallRegistry(Arc<Mutex<HashMap<String, usize>>>);

impl CallRegistry {
    fn record(&self, input: &SelectionContext) {
        *self
            .0
            .lock()
            .unwrap()
            .entry(input.route().to_string())
            .or_default() += 1;
    }

    fn totals(&self) -> HashMap<String, usize> {
        self.0.lock().unwrap().clone()
    }
}

fn ids(response: Option<&Value>, field: &str) -> Vec<Value> {
    response
        .and_then(Value::as_array)
        .map(|records| {
            records
                .iter()
                .filter_map(|record| record.as_object()?.get(field).cloned())
                .collect()
        })
        .unwrap_or_default()
}

fn posts_table() -> Value {
    json!([
        {"id": 10, "authorId": 1, "title": "first"},
        {"id": 11, "authorId": 2, "title": "second"},
        {"id": 12, "authorId": 1, "title": "third"},
        {"id": 13, "authorId": 3, "title": "orphan"},
    ])
}

fn router(schema: &Schema, calls: &CallRegistry) -> Router {
    let registry = calls.clone();
    let users = Route::new(schema, "Query.users", move |input: &SelectionContext| {
        registry.record(input);
        let role = input.get("role").and_then(Value::as_str).unwrap_or_default();
        Ok(json!([
            {"id": 1, "name": format!("ada ({role})")},
            {"id": 2, "name": format!("grace ({role})")},
        ]))
    })
    .unwrap();

    let registry = calls.clone();
    let posts = Route::new(schema, "User.posts", move |input: &SelectionContext| {
        registry.record(input);
        // one batch for every user of the parent response
        let authors = ids(input.parent_response(), "id");
        let posts = posts_table();
        let batch: Vec<Value> = posts
            .as_array()
            .into_iter()
            .flatten()
            .filter(|post| {
                post.as_object()
                    .and_then(|post| post.get("authorId"))
                    .is_some_and(|author| authors.contains(author))
            })
            .cloned()
            .collect();
        Ok(Value::Array(batch))
    })
    .unwrap()
    .with_relation("id", "authorId");

    let registry = calls.clone();
    let comments = Route::new(schema, "Post.comments", move |input: &SelectionContext| {
        registry.record(input);
        let posts = ids(input.parent_response(), "id");
        Ok(Value::Array(
            posts
                .into_iter()
                .map(|post| {
                    let body = format!("on {}", post.as_i64().unwrap_or_default());
                    json!({"postId": post, "body": body})
                })
                .collect(),
        ))
    })
    .unwrap()
    .with_relation("id", "postId");

    Router::new()
        .with_route(users)
        .with_route(posts)
        .with_route(comments)
}

fn executor(calls: &CallRegistry) -> Executor {
    let schema = Arc::new(Schema::from_yaml(SCHEMA).unwrap());
    let router = router(&schema, calls);
    Executor::new(ExecutionParameters::new(schema), Arc::new(router))
}

fn operation(value: serde_json::Value) -> Operation {
    serde_json::from_value(value).unwrap()
}

#[test_log::test]
fn nested_routes_run_once_per_occurrence() {
    let calls = CallRegistry::default();
    let data = executor(&calls)
        .execute(&operation(serde_json::json!({
            "selectionSet": [{
                "name": "users",
                "arguments": {"role": "admin"},
                "selectionSet": [
                    {"name": "name"},
                    {"name": "posts", "selectionSet": [
                        {"name": "title"},
                        {"name": "comments", "selectionSet": [{"name": "body"}]}
                    ]}
                ]
            }]
        })))
        .unwrap();

    assert_eq!(
        data,
        json!({
            "users": [
                {"name": "ada (admin)", "posts": [
                    {"title": "first", "comments": [{"body": "on 10"}]},
                    {"title": "third", "comments": [{"body": "on 12"}]},
                ]},
                {"name": "grace (admin)", "posts": [
                    {"title": "second", "comments": [{"body": "on 11"}]},
                ]},
            ]
        })
    );
    assert_eq!(
        calls.totals(),
        hashmap! {
            "Query.users".to_string() => 1,
            "User.posts".to_string() => 1,
            "Post.comments".to_string() => 1,
        }
    );
}

#[test_log::test]
fn aliases_are_separate_occurrences() {
    let calls = CallRegistry::default();
    let data = executor(&calls)
        .execute(&operation(serde_json::json!({
            "selectionSet": [{
                "name": "users",
                "alias": "people",
                "arguments": {"role": "guest"},
                "selectionSet": [
                    {"name": "id"},
                    {"name": "posts", "selectionSet": [{"name": "id"}]},
                    {"name": "posts", "alias": "writings", "selectionSet": [{"name": "title"}]}
                ]
            }]
        })))
        .unwrap();

    assert_eq!(
        data,
        json!({
            "people": [
                {
                    "id": 1,
                    "posts": [{"id": 10}, {"id": 12}],
                    "writings": [{"title": "first"}, {"title": "third"}],
                },
                {
                    "id": 2,
                    "posts": [{"id": 11}],
                    "writings": [{"title": "second"}],
                },
            ]
        })
    );
    assert_eq!(
        calls.totals(),
        hashmap! {
            "Query.users".to_string() => 1,
            "User.posts".to_string() => 2,
        }
    );
}

#[test]
fn missing_required_argument_stops_execution() {
    let calls = CallRegistry::default();
    let error = executor(&calls)
        .execute(&operation(serde_json::json!({
            "selectionSet": [{"name": "users", "selectionSet": [{"name": "id"}]}]
        })))
        .unwrap_err();

    assert_eq!(error.to_string(), "argument 'role' is required for 'Query.users'");
    assert_eq!(error.extension_code(), "MISSING_ARGUMENT");
    assert!(calls.totals().is_empty());
}

#[test]
fn action_errors_surface_unchanged() {
    #[derive(Debug, thiserror::Error)]
    #[error("posts backend is down")]
    struct Unavailable;

    let schema = Arc::new(Schema::from_yaml(SCHEMA).unwrap());
    let users = Route::new(&schema, "Query.users", |_: &SelectionContext| {
        Ok(json!([{"id": 1}]))
    })
    .unwrap();
    let posts = Route::new(&schema, "User.posts", |_: &SelectionContext| {
        Err::<Value, BoxError>(Box::new(Unavailable))
    })
    .unwrap();
    let executor = Executor::new(
        ExecutionParameters::new(schema),
        Arc::new(Router::new().with_route(users).with_route(posts)),
    );

    let error = executor
        .execute(&operation(serde_json::json!({
            "selectionSet": [{
                "name": "users",
                "arguments": {"role": "admin"},
                "selectionSet": [{"name": "posts", "selectionSet": [{"name": "id"}]}]
            }]
        })))
        .unwrap_err();

    match error {
        ResolveError::Action(source) => assert!(source.downcast_ref::<Unavailable>().is_some()),
        other => panic!("unexpected error {other:?}"),
    }
}
