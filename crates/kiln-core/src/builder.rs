//! Builder declarations.

use crate::error::Result;
use crate::properties::Properties;
use crate::step::{BuildFactory, RenderedStep};
use std::sync::Arc;

/// A named builder: a factory bound to a set of workers and fixed properties.
#[derive(Debug, Clone)]
pub struct BuilderConfig {
    pub name: String,
    pub workers: Vec<String>,
    pub factory: Arc<BuildFactory>,
    pub properties: Properties,
}

impl BuilderConfig {
    pub fn new(name: impl Into<String>, workers: Vec<String>, factory: Arc<BuildFactory>) -> Self {
        Self {
            name: name.into(),
            workers,
            factory,
            properties: Properties::new(),
        }
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    /// Properties a build of this builder starts with: the builder's fixed
    /// properties, overlaid by `overrides`, plus `buildername`.
    pub fn build_properties(&self, overrides: &Properties) -> Properties {
        let mut props = self.properties.clone();
        props.merge(overrides);
        props.set("buildername", self.name.clone());
        props
    }

    /// Dry-run the factory for a build with the given properties.
    pub fn render(&self, overrides: &Properties) -> Result<Vec<RenderedStep>> {
        let props = self.build_properties(overrides);
        tracing::debug!(builder = %self.name, steps = self.factory.len(), "Rendering builder");
        self.factory.render(&props)
    }
}
