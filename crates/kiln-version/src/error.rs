//! Error types for version resolution.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VersionError {
    /// The project version could not be read as `major.minor.patch`.
    #[error("Malformed version metadata: {0:?}")]
    MalformedVersionMetadata(String),

    /// A describe string whose tag is not `v<major>.<minor>.<patch>`.
    #[error("Ambiguous describe output: {0:?}")]
    AmbiguousDescribeOutput(String),

    #[error(transparent)]
    Property(#[from] kiln_core::Error),
}

pub type Result<T> = std::result::Result<T, VersionError>;
