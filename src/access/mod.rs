//! Access tags, caller scopes, and the authorization gate in front of the dispatcher.

pub mod authorizer;
pub mod gate;

pub use authorizer::{ApiKeyAuthorizer, AuthorizationService};
pub use gate::require_access;

use serde::{Deserialize, Serialize};

/// Permission tag carried by callers and by every stored entity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    App,
    Red,
    Blue,
    #[default]
    Hidden,
}

impl Access {
    pub fn as_str(&self) -> &'static str {
        match self {
            Access::App => "app",
            Access::Red => "red",
            Access::Blue => "blue",
            Access::Hidden => "hidden",
        }
    }
}

impl std::fmt::Display for Access {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered, de-duplicated set of access tags resolved once per request.
/// The first tag is the caller's primary access.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessScope(Vec<Access>);

impl AccessScope {
    pub fn new(tags: impl IntoIterator<Item = Access>) -> Self {
        let mut out: Vec<Access> = Vec::new();
        for tag in tags {
            if !out.contains(&tag) {
                out.push(tag);
            }
        }
        AccessScope(out)
    }

    pub fn primary(&self) -> Option<Access> {
        self.0.first().copied()
    }

    pub fn allows(&self, access: Access) -> bool {
        self.0.contains(&access)
    }

    pub fn tags(&self) -> &[Access] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// JSON form used when the scope is merged into query criteria.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::Value::Array(
            self.0
                .iter()
                .map(|a| serde_json::Value::String(a.as_str().to_string()))
                .collect(),
        )
    }
}
