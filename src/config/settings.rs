//! Process settings read from the environment (after an optional `.env`).

use crate::error::ConfigError;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 8888;
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

#[derive(Clone, Debug)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    /// Key granting the red scope. Empty disables it.
    pub api_key_red: String,
    /// Key granting the blue scope. Empty disables it.
    pub api_key_blue: String,
    pub body_limit: usize,
    pub schema_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            host: "0.0.0.0".into(),
            port: DEFAULT_PORT,
            api_key_red: String::new(),
            api_key_blue: String::new(),
            body_limit: DEFAULT_BODY_LIMIT,
            schema_path: None,
        }
    }
}

impl Settings {
    /// Load `.env` if present, then read `REST_CORE_*` variables.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source; unset variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();
        let port = match lookup("REST_CORE_PORT") {
            Some(v) => v
                .trim()
                .parse()
                .map_err(|_| ConfigError::Load(format!("REST_CORE_PORT must be a port number, got '{}'", v)))?,
            None => defaults.port,
        };
        let body_limit = match lookup("REST_CORE_BODY_LIMIT") {
            Some(v) => v
                .trim()
                .parse()
                .map_err(|_| ConfigError::Load(format!("REST_CORE_BODY_LIMIT must be a byte count, got '{}'", v)))?,
            None => defaults.body_limit,
        };
        Ok(Settings {
            host: lookup("REST_CORE_HOST").unwrap_or(defaults.host),
            port,
            api_key_red: lookup("REST_CORE_API_KEY_RED").unwrap_or_default(),
            api_key_blue: lookup("REST_CORE_API_KEY_BLUE").unwrap_or_default(),
            body_limit,
            schema_path: lookup("REST_CORE_SCHEMA_PATH")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
