//! Error types for Kiln CI.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Property errors
    #[error("Missing build property: {0}")]
    MissingProperty(String),

    #[error("Invalid build property {name}: {reason}")]
    InvalidProperty { name: String, reason: String },

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Builder not found: {0}")]
    UnknownBuilder(String),

    #[error("Unknown worker {worker} referenced by {referenced_by}")]
    UnknownWorker {
        worker: String,
        referenced_by: String,
    },

    // Rendering errors
    #[error("Render failed for {renderer}: {reason}")]
    Render { renderer: String, reason: String },

    // Infrastructure errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_property(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidProperty {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn render(renderer: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Render {
            renderer: renderer.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
