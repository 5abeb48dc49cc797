use crate::access::Access;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Executor {
    pub name: String,
    pub platform: String,
    #[serde(default)]
    pub command: String,
    #[serde(default = "default_timeout")]
    pub timeout: u32,
}

fn default_timeout() -> u32 {
    60
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ability {
    #[serde(default)]
    pub ability_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tactic: String,
    #[serde(default)]
    pub technique_id: String,
    #[serde(default)]
    pub technique_name: String,
    #[serde(default)]
    pub executors: Vec<Executor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privilege: Option<String>,
    #[serde(default)]
    pub repeatable: bool,
    #[serde(default)]
    pub access: Access,
}

impl Ability {
    /// Command for the first executor matching one of the agent's platforms/executors.
    pub fn command_for(&self, platform: &str, executors: &[String]) -> Option<&Executor> {
        self.executors
            .iter()
            .find(|e| e.platform == platform && (executors.is_empty() || executors.contains(&e.name)))
    }
}
