//! Collaborators behind the dispatcher: entity store, criteria search, domain operations.

mod config_store;
mod query;
mod rest;
mod store;

pub use config_store::ConfigStore;
pub use query::{Criteria, QueryService};
pub use rest::{OperationPatch, PotentialLinksQuery, RestService, TaskRequest, DELETE_COMPLETED};
pub use store::ObjectStore;
