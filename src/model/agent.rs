use crate::access::Access;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub paw: String,
    #[serde(default = "default_group")]
    pub group: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub executors: Vec<String>,
    #[serde(default = "default_sleep_min")]
    pub sleep_min: u32,
    #[serde(default = "default_sleep_max")]
    pub sleep_max: u32,
    #[serde(default)]
    pub watchdog: u32,
    #[serde(default = "default_trusted")]
    pub trusted: bool,
    /// Channel the agent beacons over (e.g. "HTTP").
    #[serde(default)]
    pub contact: String,
    /// Link ids handed to the agent but not yet collected.
    #[serde(default)]
    pub pending_links: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(default)]
    pub access: Access,
}

fn default_group() -> String {
    "red".into()
}

fn default_sleep_min() -> u32 {
    30
}

fn default_sleep_max() -> u32 {
    60
}

fn default_trusted() -> bool {
    true
}

impl Agent {
    pub fn new(paw: impl Into<String>, access: Access) -> Self {
        Agent {
            paw: paw.into(),
            group: default_group(),
            host: String::new(),
            platform: String::new(),
            executors: Vec::new(),
            sleep_min: default_sleep_min(),
            sleep_max: default_sleep_max(),
            watchdog: 0,
            trusted: default_trusted(),
            contact: String::new(),
            pending_links: Vec::new(),
            created: Some(Utc::now()),
            last_seen: None,
            access,
        }
    }
}
