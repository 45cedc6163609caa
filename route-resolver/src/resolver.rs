//! Executes routes at most once per occurrence and extracts the results
//! belonging to the current parent.
use crate::context::SelectionContext;
use crate::error::ResolveError;
use crate::route::Route;
use crate::store::ResultBox;
use crate::store::Store;

/// Resolves field occurrences for one query execution.
///
/// The resolver owns the result store of that execution: create one per
/// query and drop it once the query has been resolved.
#[derive(Debug, Default)]
pub struct Resolver {
    store: Store,
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Resolves one occurrence of `route`.
    ///
    /// With a parent, the action only runs the first time the occurrence is
    /// seen; later calls reuse the stored results and keep those related to
    /// `parent`. Without a parent, the action always runs and every result is
    /// returned.
    ///
    /// Cardinality is left to the caller: a singular field may get zero or
    /// several boxes back.
    pub fn call(
        &mut self,
        route: &Route,
        input: &SelectionContext,
        parent: Option<&ResultBox>,
    ) -> Result<Vec<ResultBox>, ResolveError> {
        let parent = parent.map(|parent| self.attach_parent(route, input, parent));

        if parent.is_none() || !self.store.has(input) {
            tracing::trace!(
                route = route.coordinate(),
                path = input.path(),
                "executing route"
            );
            let response = route.call(input)?;
            self.store
                .insert(input, ResultBox::from_response(route, response));
        } else {
            tracing::debug!(
                route = route.coordinate(),
                path = input.path(),
                "reusing stored results"
            );
        }

        Ok(self.extract(route, input, parent.as_ref()))
    }

    fn attach_parent(
        &self,
        route: &Route,
        input: &SelectionContext,
        parent: &ResultBox,
    ) -> ResultBox {
        // Prefer the live stored box: `parent` may be a copy of it.
        let candidates = self.store.get_parent(input);
        let stored = candidates
            .iter()
            .find(|stored| stored.same_value(parent))
            .or_else(|| {
                candidates
                    .iter()
                    .find(|stored| stored.value() == parent.value())
            })
            .unwrap_or(parent);
        let rebuilt = self.store.rebuild(route, stored);
        input.update_parent(
            rebuilt.shared_value().clone(),
            rebuilt.shared_response().clone(),
        );
        rebuilt
    }

    fn extract(
        &self,
        route: &Route,
        input: &SelectionContext,
        parent: Option<&ResultBox>,
    ) -> Vec<ResultBox> {
        let stored = self.store.get(input);
        let Some(parent) = parent else {
            return stored.to_vec();
        };

        let related: Vec<ResultBox> = stored
            .iter()
            .filter(|current| route.matches(parent, current))
            .cloned()
            .collect();
        tracing::debug!(
            route = route.coordinate(),
            path = input.path(),
            "kept {} of {} stored results",
            related.len(),
            stored.len()
        );
        related
    }
}
