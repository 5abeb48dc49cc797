//! Resolved polymorphic schema: a validated document ready for request/response use.

use crate::config::{validate, ObjectConfig, Patterns, SchemaConfig};
use crate::error::ConfigError;
use regex::Regex;
use std::collections::BTreeMap;

/// Discriminator field plus a mapping from discriminator value to object schema.
/// Shared by the decode and encode directions so the set of valid kinds has one source.
#[derive(Clone, Debug)]
pub struct PolymorphicSchema {
    pub name: String,
    pub discriminator: String,
    kinds: BTreeMap<String, ObjectConfig>,
    definitions: BTreeMap<String, ObjectConfig>,
    patterns: Patterns,
}

impl PolymorphicSchema {
    /// Build from a raw document (validates first, compiling every pattern).
    pub fn resolve(config: SchemaConfig) -> Result<Self, ConfigError> {
        let patterns = validate(&config)?;
        Ok(PolymorphicSchema {
            name: config.name,
            discriminator: config.discriminator,
            kinds: config.kinds,
            definitions: config.definitions,
            patterns,
        })
    }

    pub fn kind(&self, index: &str) -> Option<&ObjectConfig> {
        self.kinds.get(index)
    }

    pub fn contains(&self, index: &str) -> bool {
        self.kinds.contains_key(index)
    }

    pub fn definition(&self, name: &str) -> Option<&ObjectConfig> {
        self.definitions.get(name)
    }

    /// Compiled form of a `pattern` declared anywhere in the document.
    pub fn pattern(&self, source: &str) -> Option<&Regex> {
        self.patterns.get(source)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.kinds.keys().map(String::as_str)
    }
}
