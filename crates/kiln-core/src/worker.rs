//! Build workers and web users.
//!
//! Credentials live in JSON files kept out of version control. They are
//! loaded into values owned by the master configuration and redacted
//! whenever they are formatted.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// A registered build worker.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    pub name: String,
    pub password: String,
    /// Maximum concurrent builds on this worker.
    #[serde(default)]
    pub max_builds: Option<u32>,
    /// Seconds of silence before the worker is considered lost.
    #[serde(default)]
    pub missing_timeout: Option<u64>,
    #[serde(default)]
    pub properties: BTreeMap<String, serde_json::Value>,
}

impl fmt::Debug for Worker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Worker")
            .field("name", &self.name)
            .field("password", &"***")
            .field("max_builds", &self.max_builds)
            .field("missing_timeout", &self.missing_timeout)
            .field("properties", &self.properties)
            .finish()
    }
}

/// A web interface account, stored as a `[username, password]` pair.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebUser(pub String, pub String);

impl WebUser {
    pub fn username(&self) -> &str {
        &self.0
    }

    pub fn password(&self) -> &str {
        &self.1
    }
}

impl fmt::Debug for WebUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WebUser").field(&self.0).field(&"***").finish()
    }
}

/// Read worker definitions from a JSON array.
pub fn read_workers(path: &Path) -> Result<Vec<Worker>> {
    let content = std::fs::read_to_string(path)?;
    let workers: Vec<Worker> = serde_json::from_str(&content)?;
    tracing::info!(path = %path.display(), count = workers.len(), "Loaded workers");
    Ok(workers)
}

/// Read web users from a JSON array of `[username, password]` pairs.
pub fn read_users(path: &Path) -> Result<Vec<WebUser>> {
    let content = std::fs::read_to_string(path)?;
    let users: Vec<WebUser> = serde_json::from_str(&content)?;
    tracing::info!(path = %path.display(), count = users.len(), "Loaded web users");
    Ok(users)
}
