//! Typed entity kinds served through the discriminated envelope.

mod ability;
mod adversary;
mod agent;
mod operation;
mod planner;
mod schedule;
mod source;

pub use ability::{Ability, Executor};
pub use adversary::Adversary;
pub use agent::Agent;
pub use operation::{Link, LinkStatus, Operation, OperationState};
pub use planner::Planner;
pub use schedule::Schedule;
pub use source::{Fact, Source};

use crate::access::Access;
use crate::error::{ServiceError, SCHEMA_KEY};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// Request fields after the discriminator has been removed.
pub type Payload = Map<String, Value>;

/// Discriminator values of the stored entity kinds.
pub mod kinds {
    pub const AGENTS: &str = "agents";
    pub const ADVERSARIES: &str = "adversaries";
    pub const ABILITIES: &str = "abilities";
    pub const OPERATIONS: &str = "operations";
    pub const SOURCES: &str = "sources";
    pub const PLANNERS: &str = "planners";
    pub const LINKS: &str = "links";
    pub const SCHEDULE: &str = "schedule";
}

/// Tagged union over every stored kind. Serializes as the bare inner object;
/// the codec adds the discriminator.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Resource {
    Agent(Agent),
    Adversary(Adversary),
    Ability(Ability),
    Operation(Operation),
    Source(Source),
    Planner(Planner),
    Link(Link),
    Schedule(Schedule),
}

impl Resource {
    pub fn index(&self) -> &'static str {
        match self {
            Resource::Agent(_) => kinds::AGENTS,
            Resource::Adversary(_) => kinds::ADVERSARIES,
            Resource::Ability(_) => kinds::ABILITIES,
            Resource::Operation(_) => kinds::OPERATIONS,
            Resource::Source(_) => kinds::SOURCES,
            Resource::Planner(_) => kinds::PLANNERS,
            Resource::Link(_) => kinds::LINKS,
            Resource::Schedule(_) => kinds::SCHEDULE,
        }
    }

    /// Store key: `paw` for agents, the kind's id field otherwise.
    pub fn id(&self) -> &str {
        match self {
            Resource::Agent(a) => &a.paw,
            Resource::Adversary(a) => &a.adversary_id,
            Resource::Ability(a) => &a.ability_id,
            Resource::Operation(o) => &o.id,
            Resource::Source(s) => &s.id,
            Resource::Planner(p) => &p.id,
            Resource::Link(l) => &l.id,
            Resource::Schedule(s) => &s.id,
        }
    }

    pub fn access(&self) -> Access {
        match self {
            Resource::Agent(a) => a.access,
            Resource::Adversary(a) => a.access,
            Resource::Ability(a) => a.access,
            Resource::Operation(o) => o.access,
            Resource::Source(s) => s.access,
            Resource::Planner(p) => p.access,
            Resource::Link(l) => l.access,
            Resource::Schedule(s) => s.access,
        }
    }

    /// Decode a payload as the concrete type behind `index`.
    pub fn from_payload(index: &str, payload: Payload) -> Result<Resource, ServiceError> {
        Ok(match index {
            kinds::AGENTS => Resource::Agent(decode_payload(payload)?),
            kinds::ADVERSARIES => Resource::Adversary(decode_payload(payload)?),
            kinds::ABILITIES => Resource::Ability(decode_payload(payload)?),
            kinds::OPERATIONS => Resource::Operation(decode_payload(payload)?),
            kinds::SOURCES => Resource::Source(decode_payload(payload)?),
            kinds::PLANNERS => Resource::Planner(decode_payload(payload)?),
            kinds::LINKS => Resource::Link(decode_payload(payload)?),
            kinds::SCHEDULE => Resource::Schedule(decode_payload(payload)?),
            other => return Err(ServiceError::invalid(SCHEMA_KEY, format!("Unsupported value: {}.", other))),
        })
    }

    pub fn to_fields(&self) -> Result<Payload, ServiceError> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(ServiceError::Internal(format!("{} did not serialize to an object", self.index()))),
            Err(e) => Err(ServiceError::Internal(e.to_string())),
        }
    }
}

/// Typed decode of an already-validated payload. Serde failures surface under `_schema`.
pub fn decode_payload<T: DeserializeOwned>(payload: Payload) -> Result<T, ServiceError> {
    serde_json::from_value(Value::Object(payload)).map_err(|e| ServiceError::invalid(SCHEMA_KEY, e.to_string()))
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
