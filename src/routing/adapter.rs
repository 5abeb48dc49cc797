//! Adapters that normalize heterogeneous operations to the `Handler` signature.
//!
//! Each adapter checks the fields its operation requires before calling it, so a
//! route can demand more than the kind's schema marks as required.

use crate::access::AccessScope;
use crate::codec;
use crate::error::ApiError;
use crate::model::{decode_payload, Payload};
use crate::routing::{Handler, Outcome};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

type CallFuture = Pin<Box<dyn Future<Output = Result<Outcome, ApiError>> + Send>>;
type BoxedCall = Box<dyn Fn(Payload, AccessScope) -> CallFuture + Send + Sync>;

/// Keyword-style argument structs decoded from the payload.
pub trait Arguments: DeserializeOwned + Send + 'static {
    /// Fields that must be present and non-null.
    const REQUIRED: &'static [&'static str];
}

struct FnHandler {
    required: &'static [&'static str],
    call: BoxedCall,
}

#[async_trait]
impl Handler for FnHandler {
    async fn call(&self, payload: Payload, scope: AccessScope) -> Result<Outcome, ApiError> {
        require(self.required, &payload)?;
        (self.call)(payload, scope).await
    }
}

fn require(required: &[&str], payload: &Payload) -> Result<(), ApiError> {
    let absent: Vec<&str> = required
        .iter()
        .copied()
        .filter(|f| payload.get(*f).map_or(true, Value::is_null))
        .collect();
    if absent.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(codec::missing(&absent)))
    }
}

fn finish<Fut, O, E>(fut: Fut) -> CallFuture
where
    Fut: Future<Output = Result<O, E>> + Send + 'static,
    O: Into<Outcome>,
    E: Into<ApiError>,
{
    Box::pin(async move {
        fut.await
            .map(Into::<Outcome>::into)
            .map_err(Into::<ApiError>::into)
    })
}

/// Operation takes the payload only.
pub fn payload_only<F, Fut, O, E>(required: &'static [&'static str], f: F) -> Arc<dyn Handler>
where
    F: Fn(Payload) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O, E>> + Send + 'static,
    O: Into<Outcome> + 'static,
    E: Into<ApiError> + 'static,
{
    Arc::new(FnHandler {
        required,
        call: Box::new(move |payload: Payload, _scope: AccessScope| finish(f(payload))),
    })
}

/// Operation takes the payload and the caller's scope.
pub fn scoped<F, Fut, O, E>(required: &'static [&'static str], f: F) -> Arc<dyn Handler>
where
    F: Fn(Payload, AccessScope) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O, E>> + Send + 'static,
    O: Into<Outcome> + 'static,
    E: Into<ApiError> + 'static,
{
    Arc::new(FnHandler {
        required,
        call: Box::new(move |payload: Payload, scope: AccessScope| finish(f(payload, scope))),
    })
}

/// Operation takes a typed argument struct decoded from the payload, plus the caller's scope.
pub fn arguments<A, F, Fut, O, E>(f: F) -> Arc<dyn Handler>
where
    A: Arguments,
    F: Fn(A, AccessScope) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O, E>> + Send + 'static,
    O: Into<Outcome> + 'static,
    E: Into<ApiError> + 'static,
{
    Arc::new(FnHandler {
        required: A::REQUIRED,
        call: Box::new(move |payload: Payload, scope: AccessScope| -> CallFuture {
            match decode_payload::<A>(payload) {
                Ok(args) => finish(f(args, scope)),
                Err(e) => Box::pin(async move { Err::<Outcome, _>(ApiError::from(e)) }),
            }
        }),
    })
}
