//! Field validation against the rules of one kind (or a nested definition).
//! Every violation is recorded; nothing stops at the first error.

use crate::codec::Mode;
use crate::config::{FieldRule, FieldType, ObjectConfig, PolymorphicSchema, UnknownPolicy};
use crate::error::FieldErrors;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub(crate) const MISSING: &str = "Missing data for required field.";
pub(crate) const UNKNOWN: &str = "Unknown field.";
pub(crate) const INVALID_TYPE: &str = "Invalid input type.";

pub(crate) struct Validator<'a> {
    schema: &'a PolymorphicSchema,
    pub(crate) errors: FieldErrors,
}

impl<'a> Validator<'a> {
    pub(crate) fn new(schema: &'a PolymorphicSchema) -> Self {
        Validator {
            schema,
            errors: FieldErrors::new(),
        }
    }

    /// Validate `value` in place; server-populated fields (and excluded unknowns) are removed.
    pub(crate) fn object(&mut self, object: &ObjectConfig, value: &mut Map<String, Value>, path: &str, mode: Mode) {
        self.fields(&object.fields, object.unknown, value, path, mode);
    }

    fn fields(
        &mut self,
        rules: &BTreeMap<String, FieldRule>,
        unknown: UnknownPolicy,
        value: &mut Map<String, Value>,
        path: &str,
        mode: Mode,
    ) {
        let present: Vec<String> = value.keys().cloned().collect();
        for key in present {
            match rules.get(&key) {
                // A listing cannot filter on what clients never send.
                Some(rule) if rule.dump_only && mode == Mode::Partial => self.errors.add(join(path, &key), UNKNOWN),
                Some(rule) if rule.dump_only => {
                    value.remove(&key);
                }
                Some(_) => {}
                None => match unknown {
                    UnknownPolicy::Raise => self.errors.add(join(path, &key), UNKNOWN),
                    UnknownPolicy::Exclude => {
                        value.remove(&key);
                    }
                },
            }
        }
        for (name, rule) in rules {
            if rule.dump_only {
                continue;
            }
            let field_path = join(path, name);
            match value.get_mut(name) {
                None => {
                    if rule.required && mode == Mode::Full {
                        self.errors.add(field_path, MISSING);
                    }
                }
                Some(Value::Null) => {
                    if !rule.allow_null {
                        self.errors.add(field_path, "Field may not be null.");
                    }
                }
                Some(v) => self.value(rule, v, &field_path),
            }
        }
    }

    fn value(&mut self, rule: &FieldRule, v: &mut Value, path: &str) {
        match rule.type_ {
            FieldType::String => match v.as_str() {
                Some(s) => self.string(rule, s, path),
                None => self.errors.add(path, "Not a valid string."),
            },
            FieldType::Integer => {
                if v.is_i64() || v.is_u64() {
                    self.number(rule, v, path);
                } else {
                    self.errors.add(path, "Not a valid integer.");
                }
            }
            FieldType::Number => {
                if v.is_number() {
                    self.number(rule, v, path);
                } else {
                    self.errors.add(path, "Not a valid number.");
                }
            }
            FieldType::Boolean => {
                if !v.is_boolean() {
                    self.errors.add(path, "Not a valid boolean.");
                }
            }
            FieldType::List => match v.as_array_mut() {
                Some(items) => {
                    if let Some(item_rule) = &rule.items {
                        for (i, item) in items.iter_mut().enumerate() {
                            let item_path = join(path, &i.to_string());
                            if item.is_null() {
                                if !item_rule.allow_null {
                                    self.errors.add(item_path, "Field may not be null.");
                                }
                            } else {
                                self.value(item_rule, item, &item_path);
                            }
                        }
                    }
                }
                None => self.errors.add(path, "Not a valid list."),
            },
            FieldType::Object => match v.as_object_mut() {
                Some(map) => {
                    // Nested objects are validated whole, even when the outer request is partial.
                    if let Some(name) = &rule.ref_ {
                        let schema = self.schema;
                        if let Some(definition) = schema.definition(name) {
                            self.object(definition, map, path, Mode::Full);
                        }
                    } else if let Some(fields) = &rule.fields {
                        self.fields(fields, UnknownPolicy::Raise, map, path, Mode::Full);
                    }
                }
                None => self.errors.add(path, INVALID_TYPE),
            },
            FieldType::Any => {}
        }
        if let Some(allowed) = &rule.allowed {
            if !allowed.iter().any(|a| value_eq(v, a)) {
                let listed: Vec<String> = allowed
                    .iter()
                    .map(|a| match a {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect();
                self.errors.add(path, format!("Must be one of: {}.", listed.join(", ")));
            }
        }
    }

    fn string(&mut self, rule: &FieldRule, s: &str, path: &str) {
        if let Some(format) = &rule.format {
            if format.eq_ignore_ascii_case("uuid") && uuid::Uuid::parse_str(s).is_err() {
                self.errors.add(path, "Not a valid UUID.");
            }
        }
        let len = s.chars().count();
        if let Some(max) = rule.max_length {
            if len > max as usize {
                self.errors.add(path, format!("Longer than maximum length {}.", max));
            }
        }
        if let Some(min) = rule.min_length {
            if len < min as usize {
                self.errors.add(path, format!("Shorter than minimum length {}.", min));
            }
        }
        if let Some(pattern) = &rule.pattern {
            if !self.schema.pattern(pattern).is_some_and(|re| re.is_match(s)) {
                self.errors.add(path, "String does not match expected pattern.");
            }
        }
    }

    fn number(&mut self, rule: &FieldRule, v: &Value, path: &str) {
        let Some(n) = v.as_f64() else {
            return;
        };
        if let Some(min) = rule.minimum {
            if n < min {
                self.errors.add(path, format!("Must be greater than or equal to {}.", min));
            }
        }
        if let Some(max) = rule.maximum {
            if n > max {
                self.errors.add(path, format!("Must be less than or equal to {}.", max));
            }
        }
    }
}

fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", path, name)
    }
}

fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::String(s), Value::String(t)) => s == t,
        (Value::Number(n), Value::Number(m)) => n.as_f64() == m.as_f64(),
        _ => a == b,
    }
}
