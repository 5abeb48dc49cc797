//! Request extractors.

pub mod credentials;

pub use credentials::{Credentials, API_KEY_HEADER};
