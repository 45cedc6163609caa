//! Routes: the declared handlers bound to fields.
use std::collections::HashMap;
use std::sync::Arc;

use derivative::Derivative;

use crate::context::SelectionContext;
use crate::error::BoxError;
use crate::error::ResolveError;
use crate::error::SchemaError;
use crate::json_ext::Value;
use crate::schema::ArgumentDefinition;
use crate::schema::FieldDefinition;
use crate::schema::Schema;
use crate::store::ResultBox;

/// The executable part of a route.
///
/// The context passed in carries the bound arguments and, for nested fields,
/// the attached parent value.
pub trait Action: Send + Sync {
    fn call(&self, input: &SelectionContext) -> Result<Value, BoxError>;
}

impl<F> Action for F
where
    F: Fn(&SelectionContext) -> Result<Value, BoxError> + Send + Sync,
{
    fn call(&self, input: &SelectionContext) -> Result<Value, BoxError> {
        self(input)
    }
}

/// Links a child record to a parent record: `child[child_field] == parent[parent_field]`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Relation {
    parent_field: String,
    child_field: String,
}

impl Relation {
    pub fn new(parent_field: impl Into<String>, child_field: impl Into<String>) -> Self {
        Self {
            parent_field: parent_field.into(),
            child_field: child_field.into(),
        }
    }

    pub fn parent_field(&self) -> &str {
        &self.parent_field
    }

    pub fn child_field(&self) -> &str {
        &self.child_field
    }

    /// Both fields must be present, and equal without any coercion.
    pub fn matches(&self, parent: &ResultBox, child: &ResultBox) -> bool {
        match (parent.get(&self.parent_field), child.get(&self.child_field)) {
            (Some(parent_value), Some(child_value)) => parent_value == child_value,
            _ => false,
        }
    }
}

/// A field handler: the action, the field declaration it is bound to and the
/// relations linking its results to the parent's.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct Route {
    coordinate: String,
    parent_type: String,
    field: Arc<FieldDefinition>,
    #[derivative(Debug = "ignore")]
    action: Arc<dyn Action>,
    relations: Vec<Relation>,
}

impl Route {
    /// Binds `action` to the field at `coordinate` (`Type.field`).
    pub fn new<F>(schema: &Schema, coordinate: &str, action: F) -> Result<Self, SchemaError>
    where
        F: Fn(&SelectionContext) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        Self::from_action(schema, coordinate, Arc::new(action))
    }

    pub fn from_action(
        schema: &Schema,
        coordinate: &str,
        action: Arc<dyn Action>,
    ) -> Result<Self, SchemaError> {
        let (parent_type, field_name) = coordinate
            .split_once('.')
            .filter(|(ty, field)| !ty.is_empty() && !field.is_empty())
            .ok_or_else(|| SchemaError::InvalidCoordinate(coordinate.to_string()))?;
        let field = schema.field(parent_type, field_name)?.clone();

        Ok(Self {
            coordinate: coordinate.to_string(),
            parent_type: parent_type.to_string(),
            field,
            action,
            relations: Vec::new(),
        })
    }

    /// Declares that a child result belongs to a parent result when
    /// `child[child_field] == parent[parent_field]`.
    pub fn with_relation(
        mut self,
        parent_field: impl Into<String>,
        child_field: impl Into<String>,
    ) -> Self {
        self.relations.push(Relation::new(parent_field, child_field));
        self
    }

    pub fn coordinate(&self) -> &str {
        &self.coordinate
    }

    pub fn parent_type(&self) -> &str {
        &self.parent_type
    }

    pub fn field_name(&self) -> &str {
        self.field.name()
    }

    pub fn field(&self) -> &FieldDefinition {
        &self.field
    }

    pub fn arguments(&self) -> &[ArgumentDefinition] {
        self.field.arguments()
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    /// Whether `child` belongs to `parent` through any declared relation.
    ///
    /// A route without relations links no child to any parent.
    pub fn matches(&self, parent: &ResultBox, child: &ResultBox) -> bool {
        self.relations
            .iter()
            .any(|relation| relation.matches(parent, child))
    }

    pub(crate) fn call(&self, input: &SelectionContext) -> Result<Value, ResolveError> {
        self.action.call(input).map_err(ResolveError::Action)
    }
}

/// The routes of a schema, by field coordinate.
#[derive(Clone, Debug, Default)]
pub struct Router {
    routes: HashMap<String, Arc<Route>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a route, replacing any route already bound to the same field.
    pub fn insert(&mut self, route: Route) -> &mut Self {
        if let Some(previous) = self
            .routes
            .insert(route.coordinate.clone(), Arc::new(route))
        {
            tracing::warn!("route {} was registered twice", previous.coordinate);
        }
        self
    }

    pub fn with_route(mut self, route: Route) -> Self {
        self.insert(route);
        self
    }

    pub fn get(&self, type_name: &str, field: &str) -> Option<&Arc<Route>> {
        self.routes.get(&format!("{type_name}.{field}"))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
