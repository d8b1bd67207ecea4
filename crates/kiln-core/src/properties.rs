//! Build properties.
//!
//! A build carries a bag of named properties: fixed ones declared on the
//! builder, ones supplied by the scheduler (`revision`, `branch`), and ones
//! captured from commands during the build (`version`, `merge-base`).
//! Values captured from command output arrive as strings, so the typed
//! getters accept both native JSON values and their string spellings.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties(BTreeMap<String, Value>);

impl Properties {
    /// Create an empty property bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load properties from a JSON object file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Builder-style setter.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    /// Overlay `other` onto `self`; values in `other` win.
    pub fn merge(&mut self, other: &Properties) {
        for (name, value) in &other.0 {
            self.0.insert(name.clone(), value.clone());
        }
    }

    /// Raw value lookup. `null` counts as absent.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|v| !v.is_null())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// True when the property is present and its string form equals `expected`.
    pub fn is(&self, name: &str, expected: &str) -> bool {
        self.get_string(name).is_some_and(|v| v == expected)
    }

    /// String value, only when the property holds a JSON string.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// String value that must be present.
    pub fn require_str(&self, name: &str) -> Result<&str> {
        match self.get(name) {
            None => Err(Error::MissingProperty(name.to_string())),
            Some(Value::String(s)) => Ok(s),
            Some(other) => Err(Error::invalid_property(
                name,
                format!("expected a string, got {other}"),
            )),
        }
    }

    /// String form of a scalar property, the way it would be substituted
    /// into a command line.
    pub fn get_string(&self, name: &str) -> Option<String> {
        match self.get(name)? {
            Value::String(s) => Some(s.clone()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(n.to_string()),
            other => Some(other.to_string()),
        }
    }

    pub fn require_string(&self, name: &str) -> Result<String> {
        self.get_string(name)
            .ok_or_else(|| Error::MissingProperty(name.to_string()))
    }

    /// Non-negative integer property. Numeric strings are accepted.
    pub fn get_u64(&self, name: &str) -> Result<Option<u64>> {
        let Some(value) = self.get(name) else {
            return Ok(None);
        };
        match value {
            Value::Number(n) => n.as_u64().map(Some).ok_or_else(|| {
                Error::invalid_property(name, format!("expected a non-negative integer, got {n}"))
            }),
            Value::String(s) if s.trim().is_empty() => Ok(None),
            Value::String(s) => s.trim().parse::<u64>().map(Some).map_err(|_| {
                Error::invalid_property(name, format!("expected a non-negative integer, got {s:?}"))
            }),
            other => Err(Error::invalid_property(
                name,
                format!("expected a non-negative integer, got {other}"),
            )),
        }
    }

    pub fn require_u64(&self, name: &str) -> Result<u64> {
        self.get_u64(name)?
            .ok_or_else(|| Error::MissingProperty(name.to_string()))
    }

    /// Boolean property. Accepts `true`/`false`, `1`/`0`, `yes`/`no` spellings.
    pub fn get_bool(&self, name: &str) -> Result<Option<bool>> {
        let Some(value) = self.get(name) else {
            return Ok(None);
        };
        match value {
            Value::Bool(b) => Ok(Some(*b)),
            Value::Number(n) => match n.as_u64() {
                Some(0) => Ok(Some(false)),
                Some(1) => Ok(Some(true)),
                _ => Err(Error::invalid_property(name, format!("expected a boolean, got {n}"))),
            },
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "" | "0" | "false" | "no" => Ok(Some(false)),
                "1" | "true" | "yes" => Ok(Some(true)),
                _ => Err(Error::invalid_property(name, format!("expected a boolean, got {s:?}"))),
            },
            other => Err(Error::invalid_property(
                name,
                format!("expected a boolean, got {other}"),
            )),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
