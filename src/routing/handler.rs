use crate::access::AccessScope;
use crate::error::ApiError;
use crate::model::{Payload, Resource};
use async_trait::async_trait;
use serde_json::Value;

/// What a handler produced, before encoding.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// A single entity, encoded through its kind's schema.
    One(Resource),
    /// A heterogeneous sequence, encoded element by element.
    Many(Vec<Resource>),
    /// An operation-specific result returned as is.
    Value(Value),
}

impl From<Resource> for Outcome {
    fn from(r: Resource) -> Self {
        Outcome::One(r)
    }
}

impl From<Vec<Resource>> for Outcome {
    fn from(rs: Vec<Resource>) -> Self {
        Outcome::Many(rs)
    }
}

impl From<Value> for Outcome {
    fn from(v: Value) -> Self {
        Outcome::Value(v)
    }
}

/// Uniform handler signature. Operations with other shapes are wrapped by the adapters.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn call(&self, payload: Payload, scope: AccessScope) -> Result<Outcome, ApiError>;
}
