//! Resolver errors.
use displaydoc::Display;
use heck::ToShoutySnakeCase;
use thiserror::Error;

pub use crate::configuration::ConfigurationError;
use crate::json_ext::Object;

/// The error type returned by route actions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error types for field resolution.
///
/// Any of them aborts the current resolution: nothing is written to the
/// store for the occurrence that failed.
#[derive(Error, Display, Debug)]
#[non_exhaustive]
pub enum ResolveError {
    /// argument '{argument}' is required for '{route}'
    MissingArgument {
        /// Name of the missing argument.
        argument: String,
        /// Coordinate of the route declaring it.
        route: String,
    },

    /// invalid selection for field '{field}': {reason}
    SelectionShape {
        /// The field whose selection has an unexpected shape.
        field: String,
        /// What was found instead of a boolean or a mapping.
        reason: String,
    },

    /// cannot query field '{field}' on type '{type_name}'
    UnknownField { field: String, type_name: String },

    /// type '{0}' is not an object type of the schema
    UnknownType(String),

    /// field '{path}' expects a single value but resolved {count}
    AmbiguousResult { path: String, count: usize },

    /// selection recursion limit({0}) exceeded
    RecursionLimitExceeded(usize),

    /// {0}
    Action(#[source] BoxError),
}

/// Errors raised while loading field and argument declarations.
#[derive(Error, Display, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SchemaError {
    /// invalid type reference '{0}'
    InvalidTypeReference(String),
    /// unknown type '{0}'
    UnknownType(String),
    /// cannot find field '{field}' on type '{type_name}'
    UnknownField { field: String, type_name: String },
    /// invalid field coordinate '{0}', expected 'Type.field'
    InvalidCoordinate(String),
    /// could not deserialize schema: {0}
    Deserialize(String),
}

/// Extension data attached to an error when it is reported to a client.
pub trait ErrorExtension
where
    Self: Sized,
{
    fn extension_code(&self) -> String {
        std::any::type_name::<Self>()
            .rsplit("::")
            .next()
            .unwrap_or_default()
            .to_shouty_snake_case()
    }

    fn custom_extension_details(&self) -> Option<Object> {
        None
    }
}

impl ErrorExtension for ResolveError {
    fn extension_code(&self) -> String {
        match self {
            ResolveError::MissingArgument { .. } => "MISSING_ARGUMENT",
            ResolveError::SelectionShape { .. } => "INVALID_SELECTION",
            ResolveError::UnknownField { .. } => "INVALID_FIELD",
            ResolveError::UnknownType(_) => "INVALID_TYPE",
            ResolveError::AmbiguousResult { .. } => "AMBIGUOUS_RESULT",
            ResolveError::RecursionLimitExceeded(_) => "RECURSION_LIMIT_EXCEEDED",
            ResolveError::Action(_) => "ACTION_FAILED",
        }
        .to_string()
    }

    fn custom_extension_details(&self) -> Option<Object> {
        let mut obj = Object::new();
        match self {
            ResolveError::MissingArgument { argument, route } => {
                obj.insert("argument", argument.clone().into());
                obj.insert("route", route.clone().into());
            }
            ResolveError::UnknownField { field, type_name } => {
                obj.insert("type", type_name.clone().into());
                obj.insert("field", field.clone().into());
            }
            ResolveError::UnknownType(ty) => {
                obj.insert("type", ty.clone().into());
            }
            _ => (),
        }

        (!obj.is_empty()).then_some(obj)
    }
}

impl ErrorExtension for SchemaError {}

impl From<SchemaError> for ResolveError {
    fn from(error: SchemaError) -> Self {
        match error {
            SchemaError::UnknownType(ty) => ResolveError::UnknownType(ty),
            SchemaError::UnknownField { field, type_name } => {
                ResolveError::UnknownField { field, type_name }
            }
            other => ResolveError::Action(Box::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn missing_argument_message_and_extensions() {
        let error = ResolveError::MissingArgument {
            argument: "id".to_string(),
            route: "Query.user".to_string(),
        };
        assert_eq!(error.to_string(), "argument 'id' is required for 'Query.user'");
        assert_eq!(error.extension_code(), "MISSING_ARGUMENT");
        let details = error.custom_extension_details().unwrap();
        assert_eq!(details.get("argument").unwrap().as_str(), Some("id"));
        assert_eq!(details.get("route").unwrap().as_str(), Some("Query.user"));
    }

    #[test]
    fn action_errors_keep_their_source() {
        let error = ResolveError::Action("database is gone".into());
        assert_eq!(error.to_string(), "database is gone");
        assert_eq!(error.source().unwrap().to_string(), "database is gone");
        assert!(error.custom_extension_details().is_none());
    }

    #[test]
    fn schema_errors_use_the_type_name_as_code() {
        let error = SchemaError::InvalidTypeReference("[Int".to_string());
        assert_eq!(error.extension_code(), "SCHEMA_ERROR");
    }
}
