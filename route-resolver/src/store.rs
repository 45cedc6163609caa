//! Query-scoped storage of executed route results.
use std::collections::HashMap;
use std::sync::Arc;

use crate::context::SelectionContext;
use crate::json_ext::Value;
use crate::route::Route;

/// One executed value, together with the whole response of the execution
/// that produced it.
///
/// For a list result every element gets its own box, all sharing the same
/// response.
#[derive(Clone, Debug, PartialEq)]
pub struct ResultBox {
    route: String,
    value: Arc<Value>,
    response: Arc<Value>,
}

impl ResultBox {
    pub(crate) fn new(route: impl Into<String>, value: Arc<Value>, response: Arc<Value>) -> Self {
        Self {
            route: route.into(),
            value,
            response,
        }
    }

    /// Wraps the result of one action execution.
    pub(crate) fn from_response(route: &Route, response: Value) -> Vec<ResultBox> {
        let response = Arc::new(response);
        match response.as_array() {
            Some(elements) => elements
                .iter()
                .map(|element| {
                    ResultBox::new(route.coordinate(), Arc::new(element.clone()), response.clone())
                })
                .collect(),
            None => vec![ResultBox::new(
                route.coordinate(),
                response.clone(),
                response.clone(),
            )],
        }
    }

    /// Re-tags a stored box for `route` without executing anything.
    pub fn rebuild(route: &Route, stored: &ResultBox) -> ResultBox {
        ResultBox {
            route: route.coordinate().to_string(),
            value: stored.value.clone(),
            response: stored.response.clone(),
        }
    }

    /// Coordinate of the route this box is tagged with.
    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn response(&self) -> &Value {
        &self.response
    }

    pub(crate) fn shared_value(&self) -> &Arc<Value> {
        &self.value
    }

    pub(crate) fn shared_response(&self) -> &Arc<Value> {
        &self.response
    }

    /// Reads a field of the boxed object. Absent and `null` fields both read as `None`.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.value
            .as_object()
            .and_then(|object| object.get(field))
            .filter(|value| !value.is_null())
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// Whether both boxes hold the very same stored value.
    pub(crate) fn same_value(&self, other: &ResultBox) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }

    pub fn into_value(self) -> Value {
        Arc::try_unwrap(self.value).unwrap_or_else(|shared| (*shared).clone())
    }
}

/// Results of executed routes, keyed by occurrence path.
///
/// A store lives for one query execution. Every element of a list shares the
/// same occurrence path, so a field nested under a list is executed once for
/// all of its parents.
#[derive(Debug, Default)]
pub struct Store {
    entries: HashMap<String, Vec<ResultBox>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, input: &SelectionContext) -> bool {
        self.entries.contains_key(input.path())
    }

    /// Every box stored for the occurrence, in execution order.
    pub fn get(&self, input: &SelectionContext) -> &[ResultBox] {
        self.entries
            .get(input.path())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The entry stored for the occurrence's logical parent.
    pub fn get_parent(&self, input: &SelectionContext) -> &[ResultBox] {
        self.entries
            .get(input.parent_path())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn rebuild(&self, route: &Route, stored: &ResultBox) -> ResultBox {
        ResultBox::rebuild(route, stored)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn insert(&mut self, input: &SelectionContext, boxes: Vec<ResultBox>) {
        if self
            .entries
            .insert(input.path().to_string(), boxes)
            .is_some()
        {
            tracing::warn!(
                "results for {} were stored more than once, keeping the latest",
                input.path()
            );
        }
    }
}
