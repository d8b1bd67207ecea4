//! Kiln CI version resolution.
//!
//! Maps the git metadata of a build ([`CommitContext`]) to the version
//! string embedded in every artifact it produces. Two dialects are
//! supported: Python wheels (`1.11.0.dev42+feature.foo.7`) and Debian
//! packages (`1.11.0~dev42+feature.foo.7`).

pub mod base;
pub mod context;
pub mod describe;
pub mod dialect;
pub mod error;
pub mod resolver;

pub use base::BaseVersion;
pub use context::{CommitContext, abbreviate_commit};
pub use describe::Describe;
pub use dialect::VersionDialect;
pub use error::{Result, VersionError};
pub use resolver::{BuildKind, ResolvedVersion, VersionResolver};
