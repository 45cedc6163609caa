use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;

use crate::error::SchemaError;

/// A type reference as written in a field or argument declaration, e.g. `[Post!]!`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// A type referenced by name, e.g. `Post`.
    Named(String),
    /// A list of the wrapped type, e.g. `[Post]`.
    List(Box<FieldType>),
    /// The wrapped type without `null`, e.g. `Post!`.
    NonNull(Box<FieldType>),
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Named(ty) => write!(f, "{ty}"),
            FieldType::List(ty) => write!(f, "[{ty}]"),
            FieldType::NonNull(ty) => write!(f, "{ty}!"),
        }
    }
}

impl FieldType {
    pub fn named(name: impl Into<String>) -> Self {
        FieldType::Named(name.into())
    }

    /// The named type once list and non-null wrappers are removed.
    pub fn inner_named_type(&self) -> &str {
        match self {
            FieldType::Named(name) => name.as_str(),
            FieldType::List(ty) | FieldType::NonNull(ty) => ty.inner_named_type(),
        }
    }

    pub fn is_non_null(&self) -> bool {
        matches!(self, FieldType::NonNull(_))
    }

    /// Whether the value of this type is a list, ignoring the outer non-null wrapper.
    pub fn is_list(&self) -> bool {
        match self {
            FieldType::List(_) => true,
            FieldType::NonNull(ty) => ty.is_list(),
            FieldType::Named(_) => false,
        }
    }
}

impl FromStr for FieldType {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SchemaError::InvalidTypeReference(s.to_string());
        let trimmed = s.trim();

        if let Some(inner) = trimmed.strip_suffix('!') {
            let inner: FieldType = inner.parse().map_err(|_| invalid())?;
            if inner.is_non_null() {
                return Err(invalid());
            }
            return Ok(FieldType::NonNull(Box::new(inner)));
        }

        if let Some(inner) = trimmed.strip_prefix('[') {
            let inner = inner.strip_suffix(']').ok_or_else(invalid)?;
            let inner: FieldType = inner.parse().map_err(|_| invalid())?;
            return Ok(FieldType::List(Box::new(inner)));
        }

        let is_name = trimmed
            .chars()
            .enumerate()
            .all(|(i, c)| c == '_' || c.is_ascii_alphabetic() || (i > 0 && c.is_ascii_digit()));
        if trimmed.is_empty() || !is_name {
            return Err(invalid());
        }
        Ok(FieldType::Named(trimmed.to_string()))
    }
}

impl Serialize for FieldType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("Int", "Int", false, false)]
    #[case("Int!", "Int", true, false)]
    #[case("[Post]", "Post", false, true)]
    #[case("[Post!]!", "Post", true, true)]
    #[case("[[ID]]", "ID", false, true)]
    fn parses_type_references(
        #[case] reference: &str,
        #[case] named: &str,
        #[case] non_null: bool,
        #[case] list: bool,
    ) {
        let ty: FieldType = reference.parse().unwrap();
        assert_eq!(ty.inner_named_type(), named);
        assert_eq!(ty.is_non_null(), non_null);
        assert_eq!(ty.is_list(), list);
        assert_eq!(ty.to_string(), reference);
    }

    #[rstest]
    #[case("")]
    #[case("[Int")]
    #[case("Int!!")]
    #[case("9Lives")]
    #[case("Foo Bar")]
    fn rejects_invalid_references(#[case] reference: &str) {
        assert_eq!(
            reference.parse::<FieldType>(),
            Err(SchemaError::InvalidTypeReference(reference.to_string()))
        );
    }
}
