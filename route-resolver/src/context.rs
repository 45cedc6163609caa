//! The per-occurrence view handed to route actions.
//!
//! A [`SelectionContext`] is built once for each field occurrence. Building it
//! binds the route's arguments; the resolver later attaches the parent value
//! before the action runs.

use std::sync::Arc;

use derivative::Derivative;
use once_cell::sync::OnceCell;

use crate::configuration::Configuration;
use crate::error::ResolveError;
use crate::json_ext::Object;
use crate::json_ext::Path;
use crate::json_ext::PathElement;
use crate::json_ext::Value;
use crate::operation::OperationKind;
use crate::route::Route;
use crate::schema::ArgumentDefinition;
use crate::schema::FieldDefinition;
use crate::schema::ObjectType;
use crate::schema::Schema;
use crate::selection::SelectionNode;
use crate::selection::SelectionSet;

/// Transforms a supplied (or default) argument value before an action sees it.
///
/// Called exactly once per declared argument of each occurrence.
pub type ArgumentHook = Arc<dyn Fn(&ArgumentDefinition, Value) -> Value + Send + Sync>;

/// A hook passing values through untouched.
pub fn identity_hook() -> ArgumentHook {
    Arc::new(|_: &ArgumentDefinition, value: Value| value)
}

/// What an occurrence context needs besides the route and its position.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct ExecutionParameters {
    pub schema: Arc<Schema>,
    pub configuration: Arc<Configuration>,
    #[derivative(Debug = "ignore")]
    pub hook: ArgumentHook,
}

impl ExecutionParameters {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            configuration: Arc::new(Configuration::default()),
            hook: identity_hook(),
        }
    }

    pub fn with_configuration(mut self, configuration: Configuration) -> Self {
        self.configuration = Arc::new(configuration);
        self
    }

    pub fn with_hook(mut self, hook: ArgumentHook) -> Self {
        self.hook = hook;
        self
    }
}

/// Where an occurrence sits in the requested tree, as reported by the
/// traversal driver.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldPosition {
    /// Response path from the root down to this occurrence, ending with its
    /// response key (the alias when there is one).
    pub path: Path,
    /// The declared name of the field.
    pub field_name: String,
    pub operation: OperationKind,
    /// What is requested below this occurrence.
    pub selection: SelectionSet,
}

impl FieldPosition {
    pub fn new(path: impl Into<Path>, field_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            field_name: field_name.into(),
            ..Default::default()
        }
    }

    pub fn with_operation(mut self, operation: OperationKind) -> Self {
        self.operation = operation;
        self
    }

    pub fn with_selection(mut self, selection: SelectionSet) -> Self {
        self.selection = selection;
        self
    }
}

#[derive(Debug)]
struct AttachedParent {
    value: Arc<Value>,
    response: Arc<Value>,
}

/// One field occurrence: its bound arguments, its position and the parent
/// value attached by the resolver.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct SelectionContext {
    route: String,
    field: Arc<FieldDefinition>,
    position: Path,
    alias: String,
    operation: OperationKind,
    selection: SelectionSet,
    arguments: Object,
    delimiter: String,
    #[derivative(Debug = "ignore")]
    schema: Arc<Schema>,
    path: OnceCell<String>,
    parent_path: OnceCell<String>,
    parent: OnceCell<AttachedParent>,
}

impl SelectionContext {
    /// Builds the context of one occurrence of `route`, binding its arguments
    /// from `input`.
    pub fn new(
        route: &Route,
        position: FieldPosition,
        input: &Object,
        parameters: &ExecutionParameters,
    ) -> Result<Self, ResolveError> {
        let arguments = resolve_arguments(route, input, &parameters.hook)?;
        let field = parameters
            .schema
            .field(route.parent_type(), route.field_name())?
            .clone();

        let FieldPosition {
            path: mut position,
            field_name,
            operation,
            selection,
        } = position;
        let alias = match position.last() {
            Some(PathElement::Key(alias)) => alias.clone(),
            _ => {
                position.push(field_name.as_str());
                field_name
            }
        };

        Ok(Self {
            route: route.coordinate().to_string(),
            field,
            position,
            alias,
            operation,
            selection,
            arguments,
            delimiter: parameters.configuration.path_delimiter().to_string(),
            schema: parameters.schema.clone(),
            path: OnceCell::new(),
            parent_path: OnceCell::new(),
            parent: OnceCell::new(),
        })
    }

    /// Coordinate of the route this occurrence belongs to.
    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn field_definition(&self) -> &FieldDefinition {
        &self.field
    }

    /// Every declared argument, after defaults and the argument hook.
    pub fn all(&self) -> &Object {
        &self.arguments
    }

    pub fn get(&self, argument: &str) -> Option<&Value> {
        self.arguments.get(argument)
    }

    pub fn get_or(&self, argument: &str, default: Value) -> Value {
        self.get(argument).cloned().unwrap_or(default)
    }

    /// Whether the argument resolved to a non-null value.
    ///
    /// An explicit `null` reads the same as an argument that was not supplied.
    pub fn has(&self, argument: &str) -> bool {
        self.get(argument).is_some_and(|value| !value.is_null())
    }

    /// Flattened relation paths of the requested sub-tree, down to `depth`
    /// levels below this field, parents before children.
    pub fn relations(&self, depth: usize) -> Relations<'_> {
        let root = self.field.ty().inner_named_type();
        let error = (!self.selection.is_empty() && self.schema.object_type(root).is_none())
            .then(|| ResolveError::UnknownType(root.to_string()));
        let stack = self
            .schema
            .object_type(root)
            .map(|ty| RelationFrame {
                ty,
                prefix: None,
                depth,
                nodes: self.selection.iter(),
            })
            .into_iter()
            .collect();

        Relations {
            schema: &self.schema,
            delimiter: &self.delimiter,
            stack,
            error,
        }
    }

    /// Whether any of the dotted relation paths is requested.
    ///
    /// The lookup depth is taken from the names themselves: a name must spell
    /// out the nesting it expects to find.
    pub fn has_relation<S: AsRef<str>>(&self, names: &[S]) -> bool {
        let depth = names
            .iter()
            .map(|name| name.as_ref().matches(self.delimiter.as_str()).count())
            .max()
            .unwrap_or(0);
        let selection = self.selection.truncated(depth);

        names.iter().any(|name| {
            selection
                .lookup(name.as_ref(), &self.delimiter)
                .is_some_and(SelectionNode::is_truthy)
        })
    }

    /// The occurrence path: response keys down to this occurrence, list
    /// indexes removed. Elements of a list share the same path.
    pub fn path(&self) -> &str {
        self.path
            .get_or_init(|| self.position.to_key_string(&self.delimiter))
    }

    pub(crate) fn parent_path(&self) -> &str {
        self.parent_path
            .get_or_init(|| self.position.parent().to_key_string(&self.delimiter))
    }

    /// The full response path, list indexes included.
    pub fn position(&self) -> &Path {
        &self.position
    }

    pub fn field_name(&self) -> &str {
        self.field.name()
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn has_alias(&self) -> bool {
        self.alias != self.field_name()
    }

    pub fn operation(&self) -> OperationKind {
        self.operation
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn parent(&self) -> Option<&Value> {
        self.parent.get().map(|parent| parent.value.as_ref())
    }

    pub fn parent_response(&self) -> Option<&Value> {
        self.parent.get().map(|parent| parent.response.as_ref())
    }

    /// Attaches the parent. Only the first call has an effect.
    pub(crate) fn update_parent(&self, value: Arc<Value>, response: Arc<Value>) {
        if self
            .parent
            .set(AttachedParent { value, response })
            .is_err()
        {
            tracing::warn!("parent of {} is already attached", self.path());
        }
    }
}

/// Binds the declared arguments of `route` from the supplied `input`.
///
/// Every declared argument gets an entry: the supplied value when there is
/// one, the declared default (or `null`) otherwise, in both cases passed
/// through `hook`. A non-null argument without default must be supplied.
pub fn resolve_arguments(
    route: &Route,
    input: &Object,
    hook: &ArgumentHook,
) -> Result<Object, ResolveError> {
    let mut arguments = Object::with_capacity(route.arguments().len());

    for argument in route.arguments() {
        let value = match input.get(argument.name()) {
            Some(value) => value.clone(),
            None if !argument.has_default_value() && argument.is_non_null() => {
                return Err(ResolveError::MissingArgument {
                    argument: argument.name().to_string(),
                    route: route.coordinate().to_string(),
                });
            }
            None => argument.default_value().cloned().unwrap_or_default(),
        };
        arguments.insert(argument.name().to_string(), hook(argument, value));
    }

    Ok(arguments)
}

struct RelationFrame<'a> {
    ty: &'a ObjectType,
    prefix: Option<String>,
    depth: usize,
    nodes: indexmap::map::Iter<'a, String, SelectionNode>,
}

/// Iterator returned by [`SelectionContext::relations`].
///
/// Yields `(path, field)` pairs. A field or type missing from the schema is
/// reported once as an error, after which the iterator is exhausted.
pub struct Relations<'a> {
    schema: &'a Schema,
    delimiter: &'a str,
    stack: Vec<RelationFrame<'a>>,
    error: Option<ResolveError>,
}

impl<'a> Iterator for Relations<'a> {
    type Item = Result<(String, &'a FieldDefinition), ResolveError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(error) = self.error.take() {
            self.stack.clear();
            return Some(Err(error));
        }

        loop {
            let frame = self.stack.last_mut()?;
            let Some((name, node)) = frame.nodes.next() else {
                self.stack.pop();
                continue;
            };

            let ty = frame.ty;
            let depth = frame.depth;
            let relation = match &frame.prefix {
                Some(prefix) => format!("{prefix}{}{name}", self.delimiter),
                None => name.clone(),
            };

            let Some(field) = ty.field(name) else {
                self.stack.clear();
                return Some(Err(ResolveError::UnknownField {
                    field: name.clone(),
                    type_name: ty.name().to_string(),
                }));
            };

            match node {
                SelectionNode::Branch(children) if depth > 0 && !children.is_empty() => {
                    let target = field.ty().inner_named_type();
                    let Some(child_type) = self.schema.object_type(target) else {
                        self.stack.clear();
                        return Some(Err(ResolveError::UnknownType(target.to_string())));
                    };
                    self.stack.push(RelationFrame {
                        ty: child_type,
                        prefix: Some(relation.clone()),
                        depth: depth - 1,
                        nodes: children.iter(),
                    });
                }
                _ => {}
            }

            return Some(Ok((relation, field.as_ref())));
        }
    }
}
