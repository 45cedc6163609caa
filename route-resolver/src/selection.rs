//! The requested sub-tree of a field, keyed by field name.
use indexmap::IndexMap;

use crate::error::ResolveError;
use crate::json_ext::Value;

/// One requested field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionNode {
    /// The field is requested without sub-selection.
    Leaf,

    /// The field is requested with the given sub-selection.
    Branch(SelectionSet),
}

impl SelectionNode {
    /// Whether the node counts as requested: a leaf, or a non-empty branch.
    pub fn is_truthy(&self) -> bool {
        match self {
            SelectionNode::Leaf => true,
            SelectionNode::Branch(children) => !children.is_empty(),
        }
    }

    pub fn children(&self) -> Option<&SelectionSet> {
        match self {
            SelectionNode::Leaf => None,
            SelectionNode::Branch(children) => Some(children),
        }
    }

    fn merge(self, other: SelectionNode) -> SelectionNode {
        match (self, other) {
            (SelectionNode::Branch(mut left), SelectionNode::Branch(right)) => {
                for (name, node) in right.0 {
                    left.merge_field(name, node);
                }
                SelectionNode::Branch(left)
            }
            (SelectionNode::Leaf, other) => other,
            (branch, SelectionNode::Leaf) => branch,
        }
    }
}

/// Requested fields in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet(IndexMap<String, SelectionNode>);

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a selection from raw nested data: every entry is either a boolean
    /// marker or a nested mapping of the same shape.
    ///
    /// A `false` marker means the field was not requested and is left out.
    pub fn from_value(value: &Value) -> Result<Self, ResolveError> {
        Self::from_value_at(value, None)
    }

    fn from_value_at(value: &Value, prefix: Option<&str>) -> Result<Self, ResolveError> {
        let object = value.as_object().ok_or_else(|| ResolveError::SelectionShape {
            field: prefix.unwrap_or_default().to_string(),
            reason: format!("expected a mapping, found {}", value_kind(value)),
        })?;

        let mut selection = SelectionSet::new();
        for (name, sub) in object.iter() {
            let name = name.as_str();
            let path = match prefix {
                Some(prefix) => format!("{prefix}.{name}"),
                None => name.to_string(),
            };
            match sub {
                Value::Bool(true) => selection.insert(name, SelectionNode::Leaf),
                Value::Bool(false) => {}
                Value::Object(_) => {
                    let children = Self::from_value_at(sub, Some(&path))?;
                    selection.insert(name, SelectionNode::Branch(children));
                }
                other => {
                    return Err(ResolveError::SelectionShape {
                        field: path,
                        reason: format!(
                            "expected a boolean or a mapping, found {}",
                            value_kind(other)
                        ),
                    });
                }
            }
        }
        Ok(selection)
    }

    pub fn insert(&mut self, name: impl Into<String>, node: SelectionNode) {
        self.0.insert(name.into(), node);
    }

    /// Adds a field, merging it with an already requested field of the same name.
    pub fn merge_field(&mut self, name: String, node: SelectionNode) {
        match self.0.get_mut(&name) {
            Some(existing) => {
                let current = std::mem::replace(existing, SelectionNode::Leaf);
                *existing = current.merge(node);
            }
            None => {
                self.0.insert(name, node);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&SelectionNode> {
        self.0.get(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, SelectionNode> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The selection as seen `depth` levels deep: non-empty branches below
    /// that depth are reported as leaves.
    pub fn truncated(&self, depth: usize) -> SelectionSet {
        SelectionSet(
            self.0
                .iter()
                .map(|(name, node)| {
                    let node = match node {
                        SelectionNode::Branch(children) if depth > 0 => {
                            SelectionNode::Branch(children.truncated(depth - 1))
                        }
                        SelectionNode::Branch(children) if !children.is_empty() => {
                            SelectionNode::Leaf
                        }
                        other => other.clone(),
                    };
                    (name.clone(), node)
                })
                .collect(),
        )
    }

    /// Finds the node at a `delimiter`-separated path.
    pub fn lookup(&self, path: &str, delimiter: &str) -> Option<&SelectionNode> {
        let mut segments = path.split(delimiter);
        let mut node = self.get(segments.next()?)?;
        for segment in segments {
            node = node.children()?.get(segment)?;
        }
        Some(node)
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}
