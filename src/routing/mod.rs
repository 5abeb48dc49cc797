//! Command routing: (verb, discriminator) to handler, fixed at startup.

pub mod adapter;
pub mod commands;
mod handler;
mod table;

pub use adapter::{arguments, payload_only, scoped, Arguments};
pub use commands::command_table;
pub use handler::{Handler, Outcome};
pub use table::{RoutingTable, RoutingTableBuilder};

use axum::http::Method;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
}

impl Verb {
    /// None for methods the endpoint does not serve.
    pub fn from_method(method: &Method) -> Option<Verb> {
        match *method {
            Method::GET => Some(Verb::Get),
            Method::POST => Some(Verb::Post),
            Method::PUT => Some(Verb::Put),
            Method::DELETE => Some(Verb::Delete),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Verb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// At most one handler exists per key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RouteKey(pub Verb, pub String);

impl RouteKey {
    pub fn new(verb: Verb, index: impl Into<String>) -> Self {
        RouteKey(verb, index.into())
    }
}

impl std::fmt::Display for RouteKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.0, self.1)
    }
}
