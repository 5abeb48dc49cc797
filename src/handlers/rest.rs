//! The single polymorphic endpoint.

use crate::access::AccessScope;
use crate::error::{ApiError, SCHEMA_KEY};
use crate::response::ok;
use crate::routing::Verb;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::{Method, StatusCode},
    Extension, Json,
};
use serde_json::{Map, Value};

/// GET/POST/PUT/DELETE `/api/rest`. The access gate has already stored the caller's scope.
pub async fn rest_core(
    State(state): State<AppState>,
    Extension(scope): Extension<AccessScope>,
    method: Method,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let verb = Verb::from_method(&method).ok_or_else(|| ApiError::NotFound(format!("method {}", method)))?;
    let body = parse_body(&body)?;
    let result = state.dispatcher.dispatch(verb, &scope, body).await?;
    Ok(ok(result))
}

/// Empty bodies read as `{}`; anything else must be a JSON object.
fn parse_body(bytes: &[u8]) -> Result<Value, ApiError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    let value: Value =
        serde_json::from_slice(bytes).map_err(|_| ApiError::field(SCHEMA_KEY, "Invalid JSON body."))?;
    if !value.is_object() {
        return Err(ApiError::field(SCHEMA_KEY, "Invalid input type."));
    }
    Ok(value)
}
