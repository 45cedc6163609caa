//! Resolves requested field trees through declared routes.
//!
//! A route binds an action to a `Type.field` coordinate. Within one
//! execution, a routed field nested under a list runs its action once for
//! every parent of that list, and each parent then receives the results
//! related to it through the route's relations.

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::panic))]

pub mod error;
pub mod json_ext;
pub mod operation;
pub mod schema;

mod configuration;
mod context;
mod execution;
mod resolver;
mod route;
mod selection;
mod store;

pub use configuration::Configuration;
pub use configuration::ConfigurationError;
pub use context::ArgumentHook;
pub use context::ExecutionParameters;
pub use context::FieldPosition;
pub use context::Relations;
pub use context::SelectionContext;
pub use context::identity_hook;
pub use context::resolve_arguments;
pub use error::BoxError;
pub use error::ResolveError;
pub use execution::Executor;
pub use resolver::Resolver;
pub use route::Action;
pub use route::Relation;
pub use route::Route;
pub use route::Router;
pub use selection::SelectionNode;
pub use selection::SelectionSet;
pub use store::ResultBox;
pub use store::Store;
