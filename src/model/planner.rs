use crate::access::Access;
use crate::model::Fact;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Planner {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub module: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default)]
    pub stopping_conditions: Vec<Fact>,
    #[serde(default)]
    pub allow_repeatable_abilities: bool,
    #[serde(default)]
    pub access: Access,
}
