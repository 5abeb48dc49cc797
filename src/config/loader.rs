//! Load the schema document from a JSON file or from the copy embedded at build time.

use crate::config::{PolymorphicSchema, SchemaConfig, Settings};
use crate::error::ConfigError;
use std::path::Path;

const BUILTIN_SCHEMA: &str = include_str!("core_schema.json");

/// Parse the embedded default document.
pub fn builtin_config() -> Result<SchemaConfig, ConfigError> {
    parse(BUILTIN_SCHEMA, "builtin schema")
}

pub async fn load_from_path(path: &Path) -> Result<SchemaConfig, ConfigError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    parse(&content, &path.display().to_string())
}

/// Schema selected by settings: `schema_path` when set, the builtin document otherwise.
pub async fn load_schema(settings: &Settings) -> Result<PolymorphicSchema, ConfigError> {
    let config = match &settings.schema_path {
        Some(path) => load_from_path(path).await?,
        None => builtin_config()?,
    };
    tracing::info!(schema = %config.name, kinds = config.kinds.len(), "schema loaded");
    PolymorphicSchema::resolve(config)
}

fn parse(content: &str, origin: &str) -> Result<SchemaConfig, ConfigError> {
    serde_json::from_str(content).map_err(|e| ConfigError::Load(format!("invalid {}: {}", origin, e)))
}
