use crate::access::Access;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    #[serde(rename = "trait")]
    pub trait_: String,
    #[serde(default)]
    pub value: String,
    #[serde(default = "default_score")]
    pub score: i64,
}

fn default_score() -> i64 {
    1
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Source {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub facts: Vec<Fact>,
    #[serde(default)]
    pub access: Access,
}
