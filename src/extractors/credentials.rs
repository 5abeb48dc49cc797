//! Extract caller credentials from the request (the `KEY` header).

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use std::convert::Infallible;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "KEY";

/// The presented API key, if any. Keys never contain whitespace, so padding around the
/// header value is ignored and a blank header counts as absent.
#[derive(Clone, Debug)]
pub struct Credentials(pub Option<String>);

#[async_trait]
impl<S> FromRequestParts<S> for Credentials
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let key = match parts.headers.get(API_KEY_HEADER).map(|v| v.to_str()) {
            Some(Ok(raw)) if !raw.trim().is_empty() => Some(raw.trim().to_owned()),
            _ => None,
        };
        Ok(Credentials(key))
    }
}
