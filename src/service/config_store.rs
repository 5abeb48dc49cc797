//! Runtime configuration editable through the `configuration` command.

use crate::config::Settings;
use crate::error::ServiceError;
use serde_json::{json, Map, Value};
use std::sync::RwLock;

/// Prefix of properties that can only be set through the environment.
const PROTECTED_PREFIX: &str = "api_key";

pub struct ConfigStore {
    values: RwLock<Map<String, Value>>,
}

impl ConfigStore {
    pub fn new(values: Map<String, Value>) -> Self {
        ConfigStore {
            values: RwLock::new(values),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let mut values = Map::new();
        values.insert("host".into(), json!(settings.host));
        values.insert("port".into(), json!(settings.port));
        values.insert("plugins".into(), json!([]));
        values.insert("reports_dir".into(), json!("/tmp"));
        values.insert("exfil_dir".into(), json!("/tmp"));
        Self::new(values)
    }

    /// Set one property and return the whole configuration.
    pub fn set(&self, prop: &str, value: Value) -> Result<Value, ServiceError> {
        if prop.starts_with(PROTECTED_PREFIX) {
            return Err(ServiceError::invalid("prop", format!("Property {} may not be changed.", prop)));
        }
        let mut values = self
            .values
            .write()
            .map_err(|e| ServiceError::Internal(format!("config lock poisoned: {}", e)))?;
        values.insert(prop.to_string(), value);
        Ok(Value::Object(values.clone()))
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_returns_full_config() {
        let config = ConfigStore::default();
        let out = config.set("reports_dir", json!("/var/reports")).unwrap();
        assert_eq!(out["reports_dir"], json!("/var/reports"));
        assert_eq!(out["port"], json!(8888));
    }

    #[test]
    fn api_keys_are_protected() {
        let config = ConfigStore::default();
        let err = config.set("api_key_red", json!("x")).unwrap_err();
        assert!(matches!(err, ServiceError::Invalid { ref field, .. } if field == "prop"));
        let out = config.set("plugins", json!([])).unwrap();
        assert!(out.get("api_key_red").is_none());
    }
}
