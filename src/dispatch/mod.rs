//! Per-request orchestration: decode, route or fall back, encode.

mod fallback;

pub use fallback::FallbackResolver;

use crate::access::AccessScope;
use crate::codec::{self, Mode};
use crate::config::PolymorphicSchema;
use crate::error::ApiError;
use crate::model::Payload;
use crate::routing::{Handler, Outcome, RoutingTable, Verb};
use crate::service::QueryService;
use serde_json::Value;
use std::sync::Arc;

/// Shared by all requests; holds only immutable state and collaborator handles.
pub struct Dispatcher {
    schema: Arc<PolymorphicSchema>,
    routes: RoutingTable,
    fallback: FallbackResolver,
}

impl Dispatcher {
    pub fn new(schema: Arc<PolymorphicSchema>, routes: RoutingTable, query: Arc<dyn QueryService>) -> Self {
        Dispatcher {
            schema,
            routes,
            fallback: FallbackResolver::new(query),
        }
    }

    pub fn routes(&self) -> &RoutingTable {
        &self.routes
    }

    /// Run one already-authorized request. The discriminator is checked before anything else runs;
    /// a routed request is decoded in full, a fallback listing only partially.
    pub async fn dispatch(&self, verb: Verb, scope: &AccessScope, body: Value) -> Result<Value, ApiError> {
        let index = codec::discriminator(&self.schema, &body)?;
        match self.routes.resolve(verb, &index) {
            Some(handler) => {
                let decoded = codec::decode(&self.schema, body, Mode::Full)?;
                tracing::debug!(verb = %verb, index = %decoded.index, "routed");
                let outcome = execute(handler, decoded.payload, scope.clone()).await?;
                codec::encode_outcome(&self.schema, outcome)
            }
            None => {
                let decoded = codec::decode(&self.schema, body, Mode::Partial)?;
                tracing::debug!(verb = %verb, index = %decoded.index, "no route, listing");
                let found = self.fallback.list(&decoded.index, decoded.payload, scope).await?;
                codec::encode_many(&self.schema, &found)
            }
        }
    }
}

/// Handlers run on their own task so a panic surfaces as an internal error instead of a dropped connection.
async fn execute(handler: Arc<dyn Handler>, payload: Payload, scope: AccessScope) -> Result<Outcome, ApiError> {
    tokio::spawn(async move { handler.call(payload, scope).await })
        .await
        .map_err(|e| ApiError::internal(format!("handler task failed: {}", e)))?
}
