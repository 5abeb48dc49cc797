use crate::access::AccessScope;
use crate::error::ApiError;
use crate::model::{Payload, Resource};
use crate::service::{Criteria, QueryService};
use std::sync::Arc;

/// Scope-filtered listing used when no explicit route matches.
#[derive(Clone)]
pub struct FallbackResolver {
    query: Arc<dyn QueryService>,
}

impl FallbackResolver {
    pub fn new(query: Arc<dyn QueryService>) -> Self {
        FallbackResolver { query }
    }

    /// Entities of `index` matching `filters`, never outside `scope` whatever the filters say.
    pub async fn list(&self, index: &str, filters: Payload, scope: &AccessScope) -> Result<Vec<Resource>, ApiError> {
        let criteria = Criteria::new(filters, scope.clone());
        let mut found = self.query.search(index, &criteria).await?;
        found.retain(|r| r.index() == index && scope.allows(r.access()));
        Ok(found)
    }
}
