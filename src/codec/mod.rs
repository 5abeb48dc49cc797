//! Discriminated schema codec: request bodies in, tagged results out, both through
//! the same `PolymorphicSchema`.

mod validation;

use crate::config::PolymorphicSchema;
use crate::error::{ApiError, FieldErrors, SCHEMA_KEY};
use crate::model::{Payload, Resource};
use crate::routing::Outcome;
use serde_json::{Map, Value};
use validation::{Validator, INVALID_TYPE, MISSING};

/// Whether required fields are enforced. Filters for listings are decoded `Partial`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Full,
    Partial,
}

/// A validated request: its discriminator value and the remaining fields.
#[derive(Clone, Debug, PartialEq)]
pub struct Decoded {
    pub index: String,
    pub payload: Payload,
}

/// Read and check the discriminator without validating the rest of the body.
pub fn discriminator(schema: &PolymorphicSchema, body: &Value) -> Result<String, ApiError> {
    let obj = body
        .as_object()
        .ok_or_else(|| ApiError::field(SCHEMA_KEY, INVALID_TYPE))?;
    let field = schema.discriminator.as_str();
    match obj.get(field) {
        None | Some(Value::Null) => Err(ApiError::field(field, MISSING)),
        Some(Value::String(index)) if schema.contains(index) => Ok(index.clone()),
        Some(Value::String(index)) => Err(ApiError::field(field, format!("Unsupported value: {}.", index))),
        Some(_) => Err(ApiError::field(field, "Not a valid string.")),
    }
}

/// Validate `body` against the kind its discriminator selects, listing every violated field.
pub fn decode(schema: &PolymorphicSchema, body: Value, mode: Mode) -> Result<Decoded, ApiError> {
    let index = discriminator(schema, &body)?;
    let mut payload = match body {
        Value::Object(map) => map,
        _ => return Err(ApiError::field(SCHEMA_KEY, INVALID_TYPE)),
    };
    payload.remove(&schema.discriminator);
    let kind = schema
        .kind(&index)
        .ok_or_else(|| ApiError::field(&schema.discriminator, format!("Unsupported value: {}.", index)))?;
    let mut validator = Validator::new(schema);
    validator.object(kind, &mut payload, "", mode);
    validator.errors.into_result().map_err(ApiError::Validation)?;
    Ok(Decoded { index, payload })
}

/// Serialize one resource through its kind's schema and tag it with its discriminator.
/// Undeclared and `load_only` fields are left out.
pub fn encode(schema: &PolymorphicSchema, resource: &Resource) -> Result<Value, ApiError> {
    let index = resource.index();
    let kind = schema
        .kind(index)
        .ok_or_else(|| ApiError::internal(format!("no schema for kind {}", index)))?;
    let fields = resource.to_fields()?;
    let mut out = Map::new();
    for (name, value) in fields {
        match kind.fields.get(&name) {
            Some(rule) if !rule.load_only => {
                out.insert(name, value);
            }
            _ => {}
        }
    }
    out.insert(schema.discriminator.clone(), Value::String(index.to_string()));
    Ok(Value::Object(out))
}

/// Encode a heterogeneous sequence element by element, keeping order.
pub fn encode_many(schema: &PolymorphicSchema, resources: &[Resource]) -> Result<Value, ApiError> {
    resources
        .iter()
        .map(|r| encode(schema, r))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

/// Encode a handler result; operation-specific values pass through untouched.
pub fn encode_outcome(schema: &PolymorphicSchema, outcome: Outcome) -> Result<Value, ApiError> {
    match outcome {
        Outcome::One(resource) => encode(schema, &resource),
        Outcome::Many(resources) => encode_many(schema, &resources),
        Outcome::Value(value) => Ok(value),
    }
}

/// Helper for callers that build field errors outside the codec.
pub fn missing(fields: &[&str]) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for f in fields {
        errors.add(*f, MISSING);
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::Access;
    use crate::config::builtin_config;
    use crate::model::{Agent, Executor, Ability, Link};
    use serde_json::json;

    fn schema() -> PolymorphicSchema {
        PolymorphicSchema::resolve(builtin_config().unwrap()).unwrap()
    }

    fn errors_of(result: Result<Decoded, ApiError>) -> FieldErrors {
        match result {
            Err(ApiError::Validation(errors)) => errors,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn missing_discriminator() {
        let errors = errors_of(decode(&schema(), json!({"paw": "p1"}), Mode::Full));
        assert_eq!(errors.get("index"), Some(&[MISSING.to_string()][..]));
    }

    #[test]
    fn unknown_discriminator() {
        let errors = errors_of(decode(&schema(), json!({"index": "unknown_kind"}), Mode::Partial));
        assert_eq!(errors.get("index"), Some(&["Unsupported value: unknown_kind.".to_string()][..]));
    }

    #[test]
    fn non_string_discriminator() {
        let errors = errors_of(decode(&schema(), json!({"index": 3}), Mode::Full));
        assert_eq!(errors.get("index"), Some(&["Not a valid string.".to_string()][..]));
    }

    #[test]
    fn non_object_body() {
        let errors = errors_of(decode(&schema(), json!(["agents"]), Mode::Full));
        assert_eq!(errors.get(SCHEMA_KEY), Some(&[INVALID_TYPE.to_string()][..]));
    }

    #[test]
    fn lists_every_violated_field() {
        let body = json!({
            "index": "task",
            "ability_id": 12,
            "facts": [{"value": "x"}, "nope"],
            "color": "red"
        });
        let errors = errors_of(decode(&schema(), body, Mode::Full));
        let fields: Vec<&str> = errors.fields().collect();
        assert_eq!(fields, vec!["ability_id", "color", "facts.0.trait", "facts.1", "paw"]);
        assert_eq!(errors.get("paw"), Some(&[MISSING.to_string()][..]));
        assert_eq!(errors.get("color"), Some(&["Unknown field.".to_string()][..]));
    }

    #[test]
    fn partial_mode_skips_required_but_checks_types() {
        let decoded = decode(&schema(), json!({"index": "schedule"}), Mode::Partial).unwrap();
        assert!(decoded.payload.is_empty());
        let errors = errors_of(decode(&schema(), json!({"index": "schedule", "cron": 5}), Mode::Partial));
        assert_eq!(errors.get("cron"), Some(&["Not a valid string.".to_string()][..]));
        let errors = errors_of(decode(&schema(), json!({"index": "schedule"}), Mode::Full));
        assert_eq!(errors.get("cron"), Some(&[MISSING.to_string()][..]));
    }

    #[test]
    fn pattern_allowed_and_bounds() {
        let body = json!({
            "index": "operations",
            "jitter": "fast",
            "state": "sleeping",
            "visibility": 500
        });
        let errors = errors_of(decode(&schema(), body, Mode::Full));
        assert_eq!(errors.get("jitter"), Some(&["String does not match expected pattern.".to_string()][..]));
        assert!(errors.get("state").unwrap()[0].starts_with("Must be one of: running, paused"));
        assert_eq!(errors.get("visibility"), Some(&["Must be less than or equal to 100.".to_string()][..]));
    }

    #[test]
    fn dump_only_fields_are_dropped_on_decode() {
        let body = json!({"index": "agents", "paw": "p1", "created": "2024-01-01T00:00:00Z"});
        let decoded = decode(&schema(), body, Mode::Full).unwrap();
        assert_eq!(decoded.index, "agents");
        assert!(!decoded.payload.contains_key("created"));
        assert!(!decoded.payload.contains_key("index"));
    }

    #[test]
    fn partial_filter_on_server_populated_field_is_unknown() {
        let body = json!({"index": "operations", "start": "2024-01-01T00:00:00Z", "name": "op"});
        let errors = errors_of(decode(&schema(), body, Mode::Partial));
        assert_eq!(errors.get("start"), Some(&["Unknown field.".to_string()][..]));
        assert!(errors.get("name").is_none());
    }

    #[test]
    fn encode_tags_and_filters() {
        let agent = Agent::new("p1", Access::Red);
        let encoded = encode(&schema(), &Resource::Agent(agent)).unwrap();
        assert_eq!(encoded["index"], json!("agents"));
        assert_eq!(encoded["paw"], json!("p1"));
        assert_eq!(encoded["access"], json!("red"));
    }

    #[test]
    fn encode_heterogeneous_sequence_keeps_order() {
        let items = vec![
            Resource::Link(Link::new("p1", "a1", "whoami", Access::Red)),
            Resource::Agent(Agent::new("p1", Access::Red)),
        ];
        let encoded = encode_many(&schema(), &items).unwrap();
        let tags: Vec<&str> = encoded
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["index"].as_str().unwrap())
            .collect();
        assert_eq!(tags, vec!["links", "agents"]);
    }

    #[test]
    fn encode_then_decode_round_trips_client_fields() {
        let schema = schema();
        let ability = Ability {
            ability_id: "a1".into(),
            name: "whoami".into(),
            description: "Identify the user".into(),
            tactic: "discovery".into(),
            technique_id: "T1033".into(),
            technique_name: "System Owner/User Discovery".into(),
            executors: vec![Executor {
                name: "sh".into(),
                platform: "linux".into(),
                command: "whoami".into(),
                timeout: 60,
            }],
            privilege: None,
            repeatable: false,
            access: Access::Red,
        };
        let agent = Agent::new("p1", Access::Blue);
        for resource in [Resource::Ability(ability), Resource::Agent(agent)] {
            let encoded = encode(&schema, &resource).unwrap();
            let decoded = decode(&schema, encoded, Mode::Full).unwrap();
            let mut expected = resource.to_fields().unwrap();
            let kind = schema.kind(resource.index()).unwrap();
            expected.retain(|k, _| kind.fields.get(k).map(|r| !r.dump_only).unwrap_or(false));
            assert_eq!(decoded.payload, expected);
            assert_eq!(Resource::from_payload(&decoded.index, decoded.payload).unwrap().id(), resource.id());
        }
    }

    #[test]
    fn passthrough_values() {
        let value = encode_outcome(&schema(), Outcome::Value(json!("Delete action completed"))).unwrap();
        assert_eq!(value, json!("Delete action completed"));
    }
}
