//! Middleware that authorizes the caller before the body is read.

use crate::error::ApiError;
use crate::extractors::Credentials;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

/// Rejects with 401 when the caller has no valid credentials; otherwise stores the
/// resolved `AccessScope` in request extensions for the dispatcher.
pub async fn require_access(
    State(state): State<AppState>,
    credentials: Credentials,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let scope = match state.authorizer.authorize(&credentials).await {
        Ok(scope) => scope,
        Err(e) => {
            tracing::warn!(method = %request.method(), uri = %request.uri(), "rejected: {}", e);
            return Err(e);
        }
    };
    request.extensions_mut().insert(scope);
    Ok(next.run(request).await)
}
