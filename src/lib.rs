//! rest-core: a single-endpoint polymorphic command dispatcher.
//!
//! Requests to `/api/rest` carry an `index` discriminator. The body is validated against the
//! schema that discriminator selects, routed by (verb, index) to a registered handler, or,
//! when nothing is registered, answered by a scope-filtered listing.

pub mod access;
pub mod codec;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod model;
pub mod response;
pub mod routes;
pub mod routing;
pub mod service;
pub mod state;

pub use access::{Access, AccessScope, ApiKeyAuthorizer, AuthorizationService};
pub use config::{load_schema, PolymorphicSchema, Settings};
pub use dispatch::Dispatcher;
pub use error::{ApiError, ConfigError, FieldErrors, ServiceError};
pub use routes::{app, common_routes, rest_routes};
pub use routing::{command_table, RoutingTable, Verb};
pub use state::AppState;
