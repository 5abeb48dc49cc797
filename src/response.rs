//! Success response helpers. Error bodies live with `ApiError`.

use axum::{http::StatusCode, Json};
use serde::Serialize;

/// Every verb answers 200 on success; the body is the encoded result as is.
pub fn ok<T: Serialize>(data: T) -> (StatusCode, Json<T>) {
    (StatusCode::OK, Json(data))
}
