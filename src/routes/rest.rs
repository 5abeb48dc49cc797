//! `/api/rest` with its middleware chain: body limit, then access gate, then dispatch.

use crate::access::require_access;
use crate::handlers::rest_core;
use crate::state::AppState;
use axum::{extract::DefaultBodyLimit, middleware, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;

pub const REST_PATH: &str = "/api/rest";

pub fn rest_routes(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .route(
            REST_PATH,
            get(rest_core).post(rest_core).put(rest_core).delete(rest_core),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_access))
        .layer(
            ServiceBuilder::new()
                .layer(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(body_limit)),
        )
        .with_state(state)
}
