use crate::config::PolymorphicSchema;
use crate::error::ConfigError;
use crate::routing::{Handler, RouteKey, Verb};
use std::collections::HashMap;
use std::sync::Arc;

/// Immutable after `build`; lookups take no locks.
pub struct RoutingTable {
    routes: HashMap<RouteKey, Arc<dyn Handler>>,
}

impl RoutingTable {
    pub fn builder() -> RoutingTableBuilder {
        RoutingTableBuilder::default()
    }

    /// None is the signal for the fallback listing path.
    pub fn resolve(&self, verb: Verb, index: &str) -> Option<Arc<dyn Handler>> {
        self.routes.get(&RouteKey::new(verb, index)).cloned()
    }

    pub fn keys(&self) -> impl Iterator<Item = &RouteKey> {
        self.routes.keys()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[derive(Default)]
pub struct RoutingTableBuilder {
    routes: HashMap<RouteKey, Arc<dyn Handler>>,
}

impl RoutingTableBuilder {
    pub fn register(mut self, verb: Verb, index: &str, handler: Arc<dyn Handler>) -> Result<Self, ConfigError> {
        let key = RouteKey::new(verb, index);
        if self.routes.contains_key(&key) {
            return Err(ConfigError::DuplicateRoute {
                verb: verb.to_string(),
                index: index.to_string(),
            });
        }
        self.routes.insert(key, handler);
        Ok(self)
    }

    /// Fails when a registered discriminator is not a kind of `schema`.
    pub fn build(self, schema: &PolymorphicSchema) -> Result<RoutingTable, ConfigError> {
        let mut keys: Vec<&RouteKey> = self.routes.keys().collect();
        keys.sort_by(|a, b| a.1.cmp(&b.1));
        if let Some(key) = keys.into_iter().find(|k| !schema.contains(&k.1)) {
            return Err(ConfigError::MissingReference {
                kind: "discriminator",
                id: key.1.clone(),
            });
        }
        tracing::debug!(routes = self.routes.len(), schema = %schema.name, "routing table built");
        Ok(RoutingTable { routes: self.routes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{builtin_config, PolymorphicSchema};
    use crate::error::ServiceError;
    use crate::routing::payload_only;
    use serde_json::json;

    fn schema() -> PolymorphicSchema {
        PolymorphicSchema::resolve(builtin_config().unwrap()).unwrap()
    }

    fn noop() -> Arc<dyn Handler> {
        payload_only(&[], |_p| async { Ok::<_, ServiceError>(json!(null)) })
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let err = RoutingTable::builder()
            .register(Verb::Put, "schedule", noop())
            .unwrap()
            .register(Verb::Put, "schedule", noop())
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::DuplicateRoute { ref index, .. } if index == "schedule"));
    }

    #[test]
    fn same_index_under_different_verbs_is_allowed() {
        let table = RoutingTable::builder()
            .register(Verb::Put, "link", noop())
            .and_then(|b| b.register(Verb::Post, "link", noop()))
            .and_then(|b| b.build(&schema()))
            .unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.resolve(Verb::Put, "link").is_some());
        assert!(table.resolve(Verb::Get, "link").is_none());
    }

    #[test]
    fn unknown_discriminator_fails_build() {
        let err = RoutingTable::builder()
            .register(Verb::Post, "not_a_kind", noop())
            .and_then(|b| b.build(&schema()))
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::MissingReference { ref id, .. } if id == "not_a_kind"));
    }
}
