//! Platform build factories for Kiln CI.
//!
//! Each platform module declares the steps its builders run. The values
//! that depend on build properties (flags, version strings, artifact names)
//! are plain functions, wired into step arguments through [`RenderKind`].

pub mod artifacts;
pub mod catalog;
pub mod common;
pub mod docker;
pub mod env;
pub mod flags;
pub mod macosx;
pub mod manylinux;
pub mod renderer;
pub mod version;
pub mod windows;

pub use catalog::Catalog;
pub use env::BuildEnv;
pub use renderer::{RenderKind, Renderer};
