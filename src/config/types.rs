//! Raw schema-document types: the discriminator, named definitions and one object schema per kind.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Value type a field must carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    List,
    Any,
}

/// What to do with fields a kind does not declare.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownPolicy {
    #[default]
    Raise,
    Exclude,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldRule {
    #[serde(rename = "type")]
    pub type_: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub allow_null: bool,
    /// Populated by the server; dropped when decoding requests.
    #[serde(default)]
    pub dump_only: bool,
    /// Accepted in requests but never written to responses.
    #[serde(default)]
    pub load_only: bool,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub max_length: Option<u32>,
    #[serde(default)]
    pub min_length: Option<u32>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub allowed: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub minimum: Option<f64>,
    #[serde(default)]
    pub maximum: Option<f64>,
    /// Rule applied to every element of a list.
    #[serde(default)]
    pub items: Option<Box<FieldRule>>,
    /// Inline nested object.
    #[serde(default)]
    pub fields: Option<BTreeMap<String, FieldRule>>,
    /// Named definition for a nested object.
    #[serde(default, rename = "ref")]
    pub ref_: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ObjectConfig {
    #[serde(default)]
    pub fields: BTreeMap<String, FieldRule>,
    #[serde(default)]
    pub unknown: UnknownPolicy,
}

/// Whole schema document as loaded from JSON.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SchemaConfig {
    pub name: String,
    pub discriminator: String,
    #[serde(default)]
    pub definitions: BTreeMap<String, ObjectConfig>,
    pub kinds: BTreeMap<String, ObjectConfig>,
}
