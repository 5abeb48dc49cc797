//! Criteria search over stored entities, used by the fallback listing path.

use crate::access::AccessScope;
use crate::error::ServiceError;
use crate::model::{Payload, Resource};
use crate::service::ObjectStore;
use async_trait::async_trait;
use serde_json::Value;

/// Exact-match field filters plus the scope the caller is confined to.
#[derive(Clone, Debug)]
pub struct Criteria {
    pub fields: Payload,
    pub scope: AccessScope,
}

impl Criteria {
    /// Merge the scope into the filters; it replaces any `access` the caller supplied.
    pub fn new(mut fields: Payload, scope: AccessScope) -> Self {
        fields.insert("access".into(), scope.to_value());
        Criteria { fields, scope }
    }

    pub fn matches(&self, resource: &Resource) -> Result<bool, ServiceError> {
        if !self.scope.allows(resource.access()) {
            return Ok(false);
        }
        let stored = resource.to_fields()?;
        Ok(self.fields.iter().all(|(name, wanted)| match stored.get(name) {
            // A list filter matches any of its members (the merged access filter is one).
            Some(have) if name == "access" => match wanted {
                Value::Array(options) => options.contains(have),
                other => other == have,
            },
            Some(have) => field_eq(have, wanted),
            None => wanted.is_null(),
        }))
    }
}

fn field_eq(have: &Value, wanted: &Value) -> bool {
    match (have, wanted) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => have == wanted,
    }
}

#[async_trait]
pub trait QueryService: Send + Sync {
    async fn search(&self, kind: &str, criteria: &Criteria) -> Result<Vec<Resource>, ServiceError>;
}

#[async_trait]
impl QueryService for ObjectStore {
    async fn search(&self, kind: &str, criteria: &Criteria) -> Result<Vec<Resource>, ServiceError> {
        let mut out = Vec::new();
        for resource in self.all(kind)? {
            if criteria.matches(&resource)? {
                out.push(resource);
            }
        }
        Ok(out)
    }
}
