//! Read-only field, argument and type declarations.
//!
//! Declarations are produced by an external SDL front end. They can be built
//! in code or loaded from a YAML/JSON document:
//!
//! ```yaml
//! query: Query
//! types:
//!   Query:
//!     users:
//!       type: "[User!]!"
//!       arguments:
//!         limit: { type: Int, default: 10 }
//!   User:
//!     id: { type: "ID!" }
//! ```

mod field_type;

use std::sync::Arc;

pub use field_type::FieldType;
use indexmap::IndexMap;
use serde::Deserialize;
use serde::Deserializer;

use crate::error::SchemaError;
use crate::json_ext::Value;
use crate::operation::OperationKind;

/// A declared argument of a field.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentDefinition {
    name: String,
    ty: FieldType,
    /// `Some(Value::Null)` is a declared `null` default, `None` means no default.
    default_value: Option<Value>,
}

impl ArgumentDefinition {
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
            default_value: None,
        }
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &FieldType {
        &self.ty
    }

    pub fn has_default_value(&self) -> bool {
        self.default_value.is_some()
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default_value.as_ref()
    }

    pub fn is_non_null(&self) -> bool {
        self.ty.is_non_null()
    }
}

/// A declared field of an object type.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    name: String,
    ty: FieldType,
    arguments: Vec<ArgumentDefinition>,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
            arguments: Vec::new(),
        }
    }

    pub fn with_argument(mut self, argument: ArgumentDefinition) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &FieldType {
        &self.ty
    }

    /// Arguments in declaration order.
    pub fn arguments(&self) -> &[ArgumentDefinition] {
        &self.arguments
    }
}

/// An object type and its fields, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectType {
    name: String,
    fields: IndexMap<String, Arc<FieldDefinition>>,
}

impl ObjectType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: IndexMap::new(),
        }
    }

    pub fn with_field(mut self, field: FieldDefinition) -> Self {
        self.fields.insert(field.name.clone(), Arc::new(field));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field(&self, name: &str) -> Option<&Arc<FieldDefinition>> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = &Arc<FieldDefinition>> {
        self.fields.values()
    }
}

/// The set of object types routes are declared against.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    query_type: String,
    mutation_type: Option<String>,
    subscription_type: Option<String>,
    types: IndexMap<String, ObjectType>,
}

impl Schema {
    pub fn new(query_type: impl Into<String>) -> Self {
        Self {
            query_type: query_type.into(),
            mutation_type: None,
            subscription_type: None,
            types: IndexMap::new(),
        }
    }

    pub fn with_type(mut self, object_type: ObjectType) -> Self {
        self.types.insert(object_type.name.clone(), object_type);
        self
    }

    pub fn with_mutation_type(mut self, name: impl Into<String>) -> Self {
        self.mutation_type = Some(name.into());
        self
    }

    pub fn with_subscription_type(mut self, name: impl Into<String>) -> Self {
        self.subscription_type = Some(name.into());
        self
    }

    pub fn from_yaml(s: &str) -> Result<Self, SchemaError> {
        let document: SchemaDocument =
            serde_yaml::from_str(s).map_err(|err| SchemaError::Deserialize(err.to_string()))?;
        document.try_into()
    }

    pub fn from_json(s: &str) -> Result<Self, SchemaError> {
        let document: SchemaDocument =
            serde_json::from_str(s).map_err(|err| SchemaError::Deserialize(err.to_string()))?;
        document.try_into()
    }

    pub fn object_type(&self, name: &str) -> Option<&ObjectType> {
        self.types.get(name)
    }

    /// The root type an operation of `kind` starts from.
    pub fn root_type(&self, kind: OperationKind) -> Option<&ObjectType> {
        let name = match kind {
            OperationKind::Query => Some(&self.query_type),
            OperationKind::Mutation => self.mutation_type.as_ref(),
            OperationKind::Subscription => self.subscription_type.as_ref(),
        }?;
        self.object_type(name)
    }

    pub fn field(&self, type_name: &str, field: &str) -> Result<&Arc<FieldDefinition>, SchemaError> {
        self.object_type(type_name)
            .ok_or_else(|| SchemaError::UnknownType(type_name.to_string()))?
            .field(field)
            .ok_or_else(|| SchemaError::UnknownField {
                field: field.to_string(),
                type_name: type_name.to_string(),
            })
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaDocument {
    query: String,
    #[serde(default)]
    mutation: Option<String>,
    #[serde(default)]
    subscription: Option<String>,
    types: IndexMap<String, IndexMap<String, FieldDocument>>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct FieldDocument {
    #[serde(rename = "type")]
    ty: FieldType,
    #[serde(default)]
    arguments: IndexMap<String, ArgumentDocument>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ArgumentDocument {
    #[serde(rename = "type")]
    ty: FieldType,
    #[serde(default, deserialize_with = "deserialize_present")]
    default: Option<Value>,
}

// An explicit `default: null` must stay distinguishable from a missing default.
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl TryFrom<SchemaDocument> for Schema {
    type Error = SchemaError;

    fn try_from(document: SchemaDocument) -> Result<Self, Self::Error> {
        let SchemaDocument {
            query,
            mutation,
            subscription,
            types,
        } = document;

        for root in std::iter::once(&query).chain(&mutation).chain(&subscription) {
            if !types.contains_key(root) {
                return Err(SchemaError::UnknownType(root.clone()));
            }
        }

        let mut schema = Schema::new(query);
        schema.mutation_type = mutation;
        schema.subscription_type = subscription;

        for (type_name, fields) in types {
            let mut object_type = ObjectType::new(type_name);
            for (field_name, field) in fields {
                let mut definition = FieldDefinition::new(field_name, field.ty);
                for (argument_name, argument) in field.arguments {
                    let mut argument_definition = ArgumentDefinition::new(argument_name, argument.ty);
                    argument_definition.default_value = argument.default;
                    definition = definition.with_argument(argument_definition);
                }
                object_type = object_type.with_field(definition);
            }
            schema = schema.with_type(object_type);
        }

        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json_bytes::json;

    use super::*;

    const SCHEMA: &str = r#"
query: Query
mutation: Mutation
types:
  Query:
    users:
      type: "[User!]!"
      arguments:
        limit: { type: Int, default: 10 }
        cursor: { type: String, default: null }
        role: { type: "Role!" }
  Mutation:
    touch: { type: Boolean }
  User:
    id: { type: "ID!" }
    name: { type: String }
"#;

    #[test]
    fn loads_yaml_declarations() {
        let schema = Schema::from_yaml(SCHEMA).unwrap();
        let users = schema.field("Query", "users").unwrap();
        assert_eq!(users.ty().to_string(), "[User!]!");
        assert_eq!(users.ty().inner_named_type(), "User");

        let arguments = users.arguments();
        assert_eq!(
            arguments.iter().map(|a| a.name()).collect::<Vec<_>>(),
            vec!["limit", "cursor", "role"]
        );
        assert_eq!(arguments[0].default_value(), Some(&json!(10)));
        assert_eq!(arguments[1].default_value(), Some(&Value::Null));
        assert!(!arguments[2].has_default_value());
        assert!(arguments[2].is_non_null());

        assert_eq!(
            schema.root_type(OperationKind::Mutation).map(ObjectType::name),
            Some("Mutation")
        );
        assert!(schema.root_type(OperationKind::Subscription).is_none());
    }

    #[test]
    fn loads_json_declarations() {
        let schema = Schema::from_json(
            r#"{"query": "Query", "types": {"Query": {"hello": {"type": "String"}}}}"#,
        )
        .unwrap();
        assert_eq!(
            schema.root_type(OperationKind::Query).unwrap().fields().count(),
            1
        );
    }

    #[test]
    fn missing_root_type_is_rejected() {
        let error = Schema::from_yaml("query: Root\ntypes: {}\n").unwrap_err();
        assert_eq!(error, SchemaError::UnknownType("Root".to_string()));
    }

    #[test]
    fn unknown_field_lookup() {
        let schema = Schema::from_yaml(SCHEMA).unwrap();
        assert_eq!(
            schema.field("User", "email").unwrap_err(),
            SchemaError::UnknownField {
                field: "email".to_string(),
                type_name: "User".to_string()
            }
        );
        assert_eq!(
            schema.field("Post", "id").unwrap_err(),
            SchemaError::UnknownType("Post".to_string())
        );
    }
}
