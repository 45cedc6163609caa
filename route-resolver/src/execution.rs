//! Depth-first execution of a requested operation.
//!
//! Routed fields go through the [`Resolver`]; every other field reads the
//! property of the same name on its parent value.
use std::sync::Arc;

use crate::context::ExecutionParameters;
use crate::context::FieldPosition;
use crate::context::SelectionContext;
use crate::error::ResolveError;
use crate::json_ext::Object;
use crate::json_ext::Path;
use crate::json_ext::Value;
use crate::operation::Field;
use crate::operation::Operation;
use crate::operation::OperationKind;
use crate::resolver::Resolver;
use crate::route::Router;
use crate::schema::FieldDefinition;
use crate::schema::ObjectType;
use crate::store::ResultBox;

pub(crate) const FIELD_SPAN_NAME: &str = "resolve_field";

/// Executes operations against a schema and its routes.
#[derive(Clone, Debug)]
pub struct Executor {
    parameters: ExecutionParameters,
    router: Arc<Router>,
}

impl Executor {
    pub fn new(parameters: ExecutionParameters, router: Arc<Router>) -> Self {
        Self { parameters, router }
    }

    pub fn parameters(&self) -> &ExecutionParameters {
        &self.parameters
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Resolves every requested field of `operation`.
    ///
    /// The returned object is keyed by response key. Each call gets its own
    /// result store, so nothing is shared between two executions.
    pub fn execute(&self, operation: &Operation) -> Result<Value, ResolveError> {
        let root = self
            .parameters
            .schema
            .root_type(operation.kind)
            .ok_or_else(|| ResolveError::UnknownType(operation.kind.to_string()))?;

        let mut traversal = Traversal {
            parameters: &self.parameters,
            router: &self.router,
            kind: operation.kind,
            resolver: Resolver::new(),
        };
        traversal.resolve_selection(root, &operation.selection_set, &Path::empty(), None, 0)
    }
}

struct Traversal<'a> {
    parameters: &'a ExecutionParameters,
    router: &'a Router,
    kind: OperationKind,
    resolver: Resolver,
}

impl Traversal<'_> {
    fn resolve_selection(
        &mut self,
        parent_type: &ObjectType,
        selection_set: &[Field],
        path: &Path,
        parent: Option<&ResultBox>,
        depth: usize,
    ) -> Result<Value, ResolveError> {
        let mut output = Object::with_capacity(selection_set.len());
        for field in selection_set {
            let value = self.resolve_field(parent_type, field, path, parent, depth)?;
            output.insert(field.response_key().to_string(), value);
        }
        Ok(Value::Object(output))
    }

    fn resolve_field(
        &mut self,
        parent_type: &ObjectType,
        field: &Field,
        path: &Path,
        parent: Option<&ResultBox>,
        depth: usize,
    ) -> Result<Value, ResolveError> {
        let limit = self.parameters.configuration.recursion_limit();
        if depth >= limit {
            return Err(ResolveError::RecursionLimitExceeded(limit));
        }

        let definition =
            parent_type
                .field(&field.name)
                .ok_or_else(|| ResolveError::UnknownField {
                    field: field.name.clone(),
                    type_name: parent_type.name().to_string(),
                })?;
        let path = path.join(field.response_key());
        let span = tracing::debug_span!(FIELD_SPAN_NAME, "graphql.path" = %path);
        let _guard = span.enter();

        let boxes = match self.router.get(parent_type.name(), &field.name) {
            Some(route) => {
                let position = FieldPosition::new(path.clone(), field.name.clone())
                    .with_operation(self.kind)
                    .with_selection(field.field_selection());
                let input =
                    SelectionContext::new(route, position, &field.arguments, self.parameters)?;
                Some(self.resolver.call(route, &input, parent)?)
            }
            None => property(parent_type, &field.name, parent),
        };
        let Some(boxes) = boxes else {
            return Ok(Value::Null);
        };

        if definition.ty().is_list() {
            let mut elements = Vec::with_capacity(boxes.len());
            for (index, element) in boxes.iter().enumerate() {
                elements.push(self.complete(
                    definition,
                    field,
                    &path.join(index),
                    element,
                    depth,
                )?);
            }
            return Ok(Value::Array(elements));
        }

        match boxes.as_slice() {
            [] => Ok(Value::Null),
            [single] => self.complete(definition, field, &path, single, depth),
            _ => Err(ResolveError::AmbiguousResult {
                path: path.to_string(),
                count: boxes.len(),
            }),
        }
    }

    fn complete(
        &mut self,
        definition: &FieldDefinition,
        field: &Field,
        path: &Path,
        result: &ResultBox,
        depth: usize,
    ) -> Result<Value, ResolveError> {
        if field.selection_set.is_empty() || result.value().is_null() {
            return Ok(result.value().clone());
        }

        let type_name = definition.ty().inner_named_type();
        let object_type = self
            .parameters
            .schema
            .object_type(type_name)
            .ok_or_else(|| ResolveError::UnknownType(type_name.to_string()))?;
        self.resolve_selection(object_type, &field.selection_set, path, Some(result), depth + 1)
    }
}

/// Default resolution: the property named after the field on the parent
/// value. `None` when there is no such property or it is `null`.
fn property(
    parent_type: &ObjectType,
    field_name: &str,
    parent: Option<&ResultBox>,
) -> Option<Vec<ResultBox>> {
    let value = parent?.get(field_name)?;
    let coordinate = format!("{}.{field_name}", parent_type.name());
    let response = Arc::new(value.clone());

    let boxes = match response.as_array() {
        Some(elements) => elements
            .iter()
            .map(|element| {
                ResultBox::new(
                    coordinate.clone(),
                    Arc::new(element.clone()),
                    response.clone(),
                )
            })
            .collect(),
        None => vec![ResultBox::new(coordinate, response.clone(), response.clone())],
    };
    Some(boxes)
}
