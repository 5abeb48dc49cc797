use crate::access::Access;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationState {
    #[default]
    Running,
    Paused,
    RunOneLink,
    Finished,
    Cleanup,
    OutOfTime,
}

/// Link status codes as reported by agents.
pub struct LinkStatus;

impl LinkStatus {
    pub const SUCCESS: i64 = 0;
    pub const PAUSE: i64 = -1;
    pub const DISCARD: i64 = -2;
    pub const EXECUTE: i64 = -3;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Link {
    #[serde(default)]
    pub id: String,
    pub paw: String,
    pub ability_id: String,
    #[serde(default)]
    pub command: String,
    /// Owning operation id; absent for links tasked directly to an agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    #[serde(default = "default_status")]
    pub status: i64,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub cleanup: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decide: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish: Option<DateTime<Utc>>,
    #[serde(default)]
    pub access: Access,
}

fn default_status() -> i64 {
    LinkStatus::EXECUTE
}

impl Link {
    pub fn new(paw: impl Into<String>, ability_id: impl Into<String>, command: impl Into<String>, access: Access) -> Self {
        Link {
            id: crate::model::new_id(),
            paw: paw.into(),
            ability_id: ability_id.into(),
            command: command.into(),
            operation: None,
            status: default_status(),
            score: 0,
            cleanup: 0,
            output: None,
            decide: Some(Utc::now()),
            finish: None,
            access,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub adversary_id: String,
    #[serde(default = "default_planner")]
    pub planner: String,
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default = "default_group")]
    pub group: String,
    #[serde(default)]
    pub state: OperationState,
    #[serde(default = "default_jitter")]
    pub jitter: String,
    #[serde(default = "default_autonomous")]
    pub autonomous: bool,
    #[serde(default = "default_obfuscator")]
    pub obfuscator: String,
    #[serde(default = "default_visibility")]
    pub visibility: u32,
    #[serde(default)]
    pub chain: Vec<Link>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish: Option<DateTime<Utc>>,
    #[serde(default)]
    pub access: Access,
}

fn default_planner() -> String {
    "atomic".into()
}

fn default_source() -> String {
    "basic".into()
}

fn default_group() -> String {
    "red".into()
}

fn default_jitter() -> String {
    "2/8".into()
}

fn default_autonomous() -> bool {
    true
}

fn default_obfuscator() -> String {
    "plain-text".into()
}

fn default_visibility() -> u32 {
    50
}

impl Operation {
    /// Whether `paw` already ran (or was queued for) `ability_id` in this operation.
    pub fn has_link(&self, paw: &str, ability_id: &str) -> bool {
        self.chain.iter().any(|l| l.paw == paw && l.ability_id == ability_id)
    }
}
