//! JSON helpers shared by the resolver.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// A JSON value.
pub type Value = serde_json_bytes::Value;

/// A JSON object.
pub type Object = serde_json_bytes::Map<serde_json_bytes::ByteString, Value>;

/// A response path element.
///
/// Keys are response keys (the alias when one was given), indexes are
/// positions inside a list value.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathElement {
    /// An index in a list.
    Index(usize),

    /// A response key.
    Key(String),
}

impl fmt::Display for PathElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathElement::Index(index) => write!(f, "{index}"),
            PathElement::Key(key) => write!(f, "{key}"),
        }
    }
}

impl From<&str> for PathElement {
    fn from(key: &str) -> Self {
        PathElement::Key(key.to_string())
    }
}

impl From<String> for PathElement {
    fn from(key: String) -> Self {
        PathElement::Key(key)
    }
}

impl From<usize> for PathElement {
    fn from(index: usize) -> Self {
        PathElement::Index(index)
    }
}

/// A path into a response, e.g. `/items/2/name`.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(pub Vec<PathElement>);

impl Path {
    pub fn empty() -> Path {
        Path(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathElement> {
        self.0.iter()
    }

    pub fn last(&self) -> Option<&PathElement> {
        self.0.last()
    }

    /// Returns a new path with `element` appended.
    pub fn join(&self, element: impl Into<PathElement>) -> Path {
        let mut elements = self.0.clone();
        elements.push(element.into());
        Path(elements)
    }

    pub fn push(&mut self, element: impl Into<PathElement>) {
        self.0.push(element.into())
    }

    /// The path without its last element.
    pub fn parent(&self) -> Path {
        let mut elements = self.0.clone();
        elements.pop();
        Path(elements)
    }

    /// Renders the response keys of this path joined by `delimiter`.
    ///
    /// List indexes and blank keys are dropped, so every element of a list
    /// shares the same rendering.
    pub fn to_key_string(&self, delimiter: &str) -> String {
        self.0
            .iter()
            .filter_map(|element| match element {
                PathElement::Key(key) if !key.trim().is_empty() => Some(key.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(delimiter)
    }
}

impl<T> From<Vec<T>> for Path
where
    T: Into<PathElement>,
{
    fn from(elements: Vec<T>) -> Self {
        Path(elements.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for element in &self.0 {
            write!(f, "/{element}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_string_drops_indexes_and_blank_keys() {
        let path = Path(vec![
            PathElement::Key("items".to_string()),
            PathElement::Index(2),
            PathElement::Key(" ".to_string()),
            PathElement::Key("name".to_string()),
        ]);
        assert_eq!(path.to_key_string("."), "items.name");
        assert_eq!(path.to_key_string("/"), "items/name");
        assert_eq!(path.to_string(), "/items/2/ /name");
    }

    #[test]
    fn parent_drops_the_last_element() {
        let path = Path::empty().join("items").join(3usize);
        assert_eq!(path.parent(), Path::empty().join("items"));
        assert_eq!(path.last(), Some(&PathElement::Index(3)));
        assert_eq!(Path::empty().parent(), Path::empty());
    }

    #[test]
    fn deserializes_mixed_elements() {
        let path: Path = serde_json::from_str(r#"["items", 2, "name"]"#).unwrap();
        assert_eq!(
            path,
            Path(vec![
                PathElement::Key("items".to_string()),
                PathElement::Index(2),
                PathElement::Key("name".to_string()),
            ])
        );
    }
}
