//! Resolve caller credentials to an access scope.

use crate::access::{Access, AccessScope};
use crate::config::Settings;
use crate::error::ApiError;
use crate::extractors::Credentials;
use async_trait::async_trait;

#[async_trait]
pub trait AuthorizationService: Send + Sync {
    /// Scope for the caller, or `ApiError::Unauthorized` when credentials are missing or invalid.
    async fn authorize(&self, credentials: &Credentials) -> Result<AccessScope, ApiError>;
}

/// Static API keys: the red key grants `[red, app]`, the blue key grants `[blue, app]`.
#[derive(Clone)]
pub struct ApiKeyAuthorizer {
    keys: Vec<(String, AccessScope)>,
}

impl ApiKeyAuthorizer {
    pub fn new(api_key_red: &str, api_key_blue: &str) -> Self {
        let mut keys = Vec::new();
        if !api_key_red.is_empty() {
            keys.push((api_key_red.to_string(), AccessScope::new([Access::Red, Access::App])));
        }
        if !api_key_blue.is_empty() {
            keys.push((api_key_blue.to_string(), AccessScope::new([Access::Blue, Access::App])));
        }
        ApiKeyAuthorizer { keys }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.api_key_red, &settings.api_key_blue)
    }
}

#[async_trait]
impl AuthorizationService for ApiKeyAuthorizer {
    async fn authorize(&self, credentials: &Credentials) -> Result<AccessScope, ApiError> {
        let presented = credentials
            .0
            .as_deref()
            .ok_or_else(|| ApiError::Unauthorized("missing credentials".into()))?;
        self.keys
            .iter()
            .find(|(key, _)| keys_match(key, presented))
            .map(|(_, scope)| scope.clone())
            .ok_or_else(|| ApiError::Unauthorized("invalid credentials".into()))
    }
}

fn keys_match(expected: &str, presented: &str) -> bool {
    let (a, b) = (expected.as_bytes(), presented.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
