//! HTTP handlers.

pub mod rest;
pub use rest::rest_core;
