mod common;
mod rest;

pub use common::common_routes;
pub use rest::{rest_routes, REST_PATH};

use crate::config::Settings;
use crate::state::AppState;
use axum::Router;

/// The full application router.
pub fn app(state: AppState, settings: &Settings) -> Router {
    common_routes().merge(rest_routes(state, settings.body_limit))
}
