//! Shared application state for all routes. Everything in it is immutable after startup.

use crate::access::{ApiKeyAuthorizer, AuthorizationService};
use crate::config::{PolymorphicSchema, Settings};
use crate::dispatch::Dispatcher;
use crate::error::ConfigError;
use crate::routing::command_table;
use crate::service::{ConfigStore, ObjectStore, RestService};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub authorizer: Arc<dyn AuthorizationService>,
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    pub fn new(authorizer: Arc<dyn AuthorizationService>, dispatcher: Arc<Dispatcher>) -> Self {
        AppState { authorizer, dispatcher }
    }

    /// Wire the in-memory collaborators: seeded store, domain service, command table, API-key authorizer.
    pub fn from_settings(settings: &Settings, schema: PolymorphicSchema) -> Result<Self, ConfigError> {
        let store = Arc::new(ObjectStore::seeded().map_err(|e| ConfigError::Load(e.to_string()))?);
        let rest = Arc::new(RestService::new(store.clone(), ConfigStore::from_settings(settings)));
        let schema = Arc::new(schema);
        let routes = command_table(rest, &schema)?;
        tracing::info!(routes = routes.len(), kinds = schema.kinds().count(), "dispatcher ready");
        let dispatcher = Dispatcher::new(schema, routes, store);
        Ok(AppState::new(
            Arc::new(ApiKeyAuthorizer::from_settings(settings)),
            Arc::new(dispatcher),
        ))
    }
}
