//! Master locks.
//!
//! A master lock serialises steps across every builder on the build master,
//! e.g. only one builder may merge into the runtime distribution at a time.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterLock {
    name: String,
}

impl MasterLock {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn exclusive(&self) -> LockAccess {
        LockAccess {
            lock: self.name.clone(),
            mode: LockMode::Exclusive,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockMode {
    Exclusive,
}

/// A step's claim on a master lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockAccess {
    pub lock: String,
    pub mode: LockMode,
}
