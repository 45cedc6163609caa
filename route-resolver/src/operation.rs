//! The requested field tree of one operation.
//!
//! Produced by an external query parser; only consumed here.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::json_ext::Object;
use crate::selection::SelectionNode;
use crate::selection::SelectionSet;

/// The kind of operation being executed.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    #[default]
    Query,
    Mutation,
    Subscription,
}

impl OperationKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Query => "query",
            OperationKind::Mutation => "mutation",
            OperationKind::Subscription => "subscription",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A requested operation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default)]
    pub kind: OperationKind,

    pub selection_set: Vec<Field>,
}

/// A requested field.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// An optional alias for the field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    /// The name of the field.
    pub name: String,

    /// Raw argument values, as written in the request.
    #[serde(default, skip_serializing_if = "Object::is_empty")]
    pub arguments: Object,

    /// The selections for the field.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selection_set: Vec<Field>,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// The key this field is written under in the response.
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(self.name.as_str())
    }

    /// The requested sub-fields keyed by field name.
    ///
    /// A field requested several times (under different aliases) appears once,
    /// with its sub-selections merged.
    pub fn field_selection(&self) -> SelectionSet {
        let mut selection = SelectionSet::new();
        for field in &self.selection_set {
            let node = if field.selection_set.is_empty() {
                SelectionNode::Leaf
            } else {
                SelectionNode::Branch(field.field_selection())
            };
            selection.merge_field(field.name.clone(), node);
        }
        selection
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn deserializes_requested_fields() {
        let operation: Operation = serde_json::from_str(
            r#"{
                "kind": "mutation",
                "selectionSet": [
                    {"alias": "me", "name": "user", "arguments": {"id": 1}, "selectionSet": [{"name": "id"}]}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(operation.kind, OperationKind::Mutation);
        let field = &operation.selection_set[0];
        assert_eq!(field.response_key(), "me");
        assert_eq!(field.arguments.get("id").and_then(|v| v.as_i64()), Some(1));
        assert_eq!(field.selection_set, vec![Field::new("id")]);
    }

    #[test]
    fn field_selection_merges_repeated_fields() {
        let mut posts = Field::new("posts");
        posts.selection_set = vec![Field::new("title")];
        let mut aliased = Field::new("posts");
        aliased.alias = Some("drafts".to_string());
        aliased.selection_set = vec![Field::new("id")];
        let mut user = Field::new("user");
        user.selection_set = vec![Field::new("name"), posts, aliased];

        let selection = user.field_selection();
        assert_eq!(
            selection.keys().collect::<Vec<_>>(),
            vec!["name", "posts"]
        );
        match selection.get("posts") {
            Some(SelectionNode::Branch(children)) => {
                assert_eq!(children.keys().collect::<Vec<_>>(), vec!["title", "id"]);
            }
            other => panic!("unexpected selection {other:?}"),
        }
    }
}
