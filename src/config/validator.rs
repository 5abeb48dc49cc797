//! Schema-document validation: references, patterns and discriminator consistency.

use crate::config::{FieldRule, FieldType, ObjectConfig, SchemaConfig};
use crate::error::ConfigError;
use regex::Regex;
use std::collections::HashMap;

/// Compiled `pattern` rules keyed by their source text.
pub type Patterns = HashMap<String, Regex>;

/// Check the document and compile every pattern it declares.
pub fn validate(config: &SchemaConfig) -> Result<Patterns, ConfigError> {
    if config.discriminator.trim().is_empty() {
        return Err(ConfigError::Validation("discriminator must not be empty".into()));
    }
    if config.kinds.is_empty() {
        return Err(ConfigError::Validation("at least one kind required".into()));
    }
    let mut patterns = Patterns::new();
    for (name, object) in &config.definitions {
        validate_object(config, name, object, &mut patterns)?;
    }
    for (kind, object) in &config.kinds {
        if kind.trim().is_empty() {
            return Err(ConfigError::Validation("kind names must not be empty".into()));
        }
        if object.fields.contains_key(&config.discriminator) {
            return Err(ConfigError::Validation(format!(
                "kind {} declares the discriminator '{}' as a field",
                kind, config.discriminator
            )));
        }
        validate_object(config, kind, object, &mut patterns)?;
    }
    Ok(patterns)
}

fn validate_object(
    config: &SchemaConfig,
    owner: &str,
    object: &ObjectConfig,
    patterns: &mut Patterns,
) -> Result<(), ConfigError> {
    for (field, rule) in &object.fields {
        validate_rule(config, &format!("{}.{}", owner, field), rule, patterns)?;
    }
    Ok(())
}

fn validate_rule(config: &SchemaConfig, path: &str, rule: &FieldRule, patterns: &mut Patterns) -> Result<(), ConfigError> {
    if let Some(pattern) = &rule.pattern {
        if !patterns.contains_key(pattern) {
            let re = Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
                field: path.to_string(),
                message: e.to_string(),
            })?;
            patterns.insert(pattern.clone(), re);
        }
    }
    if rule.required && rule.dump_only {
        return Err(ConfigError::Validation(format!("{} cannot be both required and dump_only", path)));
    }
    if let Some(name) = &rule.ref_ {
        if !config.definitions.contains_key(name) {
            return Err(ConfigError::MissingReference {
                kind: "definition",
                id: name.clone(),
            });
        }
    }
    if rule.ref_.is_some() && rule.fields.is_some() {
        return Err(ConfigError::Validation(format!("{} sets both ref and fields", path)));
    }
    if (rule.ref_.is_some() || rule.fields.is_some()) && rule.type_ != FieldType::Object {
        return Err(ConfigError::Validation(format!("{} has nested fields but is not an object", path)));
    }
    if let Some(fields) = &rule.fields {
        for (name, nested) in fields {
            validate_rule(config, &format!("{}.{}", path, name), nested, patterns)?;
        }
    }
    match (&rule.items, rule.type_) {
        (Some(items), FieldType::List) => validate_rule(config, &format!("{}[]", path), items, patterns)?,
        (Some(_), _) => {
            return Err(ConfigError::Validation(format!("{} has items but is not a list", path)));
        }
        (None, _) => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn rule(type_: FieldType) -> FieldRule {
        serde_json::from_value(json!({ "type": type_ })).unwrap()
    }

    fn config_with(kind_fields: BTreeMap<String, FieldRule>) -> SchemaConfig {
        let mut kinds = BTreeMap::new();
        kinds.insert(
            "agents".to_string(),
            ObjectConfig {
                fields: kind_fields,
                ..Default::default()
            },
        );
        SchemaConfig {
            name: "CoreRequest".into(),
            discriminator: "index".into(),
            definitions: BTreeMap::new(),
            kinds,
        }
    }

    #[test]
    fn rejects_dangling_ref() {
        let mut facts = rule(FieldType::Object);
        facts.ref_ = Some("fact".into());
        let config = config_with(BTreeMap::from([("facts".to_string(), facts)]));
        assert!(matches!(
            validate(&config),
            Err(ConfigError::MissingReference { kind: "definition", .. })
        ));
    }

    #[test]
    fn rejects_bad_pattern() {
        let mut paw = rule(FieldType::String);
        paw.pattern = Some("([a-z".into());
        let config = config_with(BTreeMap::from([("paw".to_string(), paw)]));
        assert!(matches!(validate(&config), Err(ConfigError::InvalidPattern { .. })));
    }

    #[test]
    fn rejects_discriminator_as_field() {
        let config = config_with(BTreeMap::from([("index".to_string(), rule(FieldType::String))]));
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn accepts_well_formed_document() {
        let config = config_with(BTreeMap::from([("paw".to_string(), rule(FieldType::String))]));
        assert!(validate(&config).unwrap().is_empty());
    }

    #[test]
    fn compiles_nested_and_item_patterns_once() {
        let mut host = rule(FieldType::String);
        host.pattern = Some("^[a-z]+$".into());
        let mut tags = rule(FieldType::List);
        tags.items = Some(Box::new(host.clone()));
        let mut nested = rule(FieldType::Object);
        nested.fields = Some(BTreeMap::from([("name".to_string(), host.clone())]));
        let config = config_with(BTreeMap::from([
            ("host".to_string(), host),
            ("tags".to_string(), tags),
            ("nested".to_string(), nested),
        ]));
        let patterns = validate(&config).unwrap();
        assert_eq!(patterns.len(), 1);
        assert!(patterns["^[a-z]+$"].is_match("abc"));
    }
}
