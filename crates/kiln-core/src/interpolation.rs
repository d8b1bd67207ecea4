use crate::error::{Error, Result};
use crate::properties::Properties;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static EXPRESSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{\{\s*([^}]+?)\s*\}\}").expect("valid interpolation regex"));

/// Context for property interpolation.
#[derive(Debug, Clone)]
pub struct InterpolationContext<'a> {
    /// Build properties
    pub properties: &'a Properties,
    /// Step environment variables
    pub variables: HashMap<String, String>,
}

impl<'a> InterpolationContext<'a> {
    pub fn new(properties: &'a Properties) -> Self {
        Self {
            properties,
            variables: HashMap::new(),
        }
    }

    /// Interpolate properties in a string.
    ///
    /// Supports:
    /// - `${{ prop.name }}` - build property
    /// - `${{ env.VAR }}` - step variable, then process environment
    /// - `${{ name }}` - shorthand for `prop.name`
    ///
    /// Unknown names resolve to the empty string.
    pub fn interpolate(&self, input: &str) -> String {
        EXPRESSION
            .replace_all(input, |caps: &regex::Captures| {
                let expr = caps.get(1).map_or("", |m| m.as_str());
                self.resolve_expression(expr).unwrap_or_default()
            })
            .to_string()
    }

    /// Interpolate, failing on the first property that is not set.
    pub fn interpolate_strict(&self, input: &str) -> Result<String> {
        let mut missing = None;
        let output = EXPRESSION.replace_all(input, |caps: &regex::Captures| {
            let expr = caps.get(1).map_or("", |m| m.as_str());
            match self.resolve_expression(expr) {
                Some(value) => value,
                None => {
                    if missing.is_none() {
                        missing = Some(expr.strip_prefix("prop.").unwrap_or(expr).to_string());
                    }
                    String::new()
                }
            }
        });
        match missing {
            Some(name) => Err(Error::MissingProperty(name)),
            None => Ok(output.to_string()),
        }
    }

    fn resolve_expression(&self, expr: &str) -> Option<String> {
        if let Some(var_name) = expr.strip_prefix("env.") {
            return self
                .variables
                .get(var_name)
                .cloned()
                .or_else(|| std::env::var(var_name).ok());
        }

        let name = expr.strip_prefix("prop.").unwrap_or(expr);
        self.properties.get_string(name)
    }

    /// Evaluate a condition expression (equality, inequality, contains).
    pub fn evaluate_condition(&self, expr: &str) -> bool {
        let interpolated = self.interpolate(expr);
        let trimmed = interpolated.trim();

        if trimmed == "true" {
            return true;
        }
        if trimmed == "false" {
            return false;
        }

        if let Some((left, right)) = trimmed.split_once("!=") {
            return left.trim() != right.trim();
        }
        if let Some((left, right)) = trimmed.split_once("==") {
            return left.trim() == right.trim();
        }
        if let Some((left, right)) = trimmed.split_once(" contains ") {
            return left.trim().contains(right.trim());
        }

        false
    }
}
