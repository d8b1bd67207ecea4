//! Kiln CI Core
//!
//! Core domain types, traits, and error handling for Kiln CI.
//! This crate defines the shared vocabulary used by the version resolver,
//! the platform factories and the CLI: build properties, interpolation,
//! step and factory declarations, master locks, workers and the master
//! configuration.

pub mod builder;
pub mod config;
pub mod error;
pub mod interpolation;
pub mod lock;
pub mod properties;
pub mod step;
pub mod worker;

pub use builder::BuilderConfig;
pub use config::{BuildType, BuilderSpec, MasterConfig};
pub use error::{Error, Result};
pub use properties::Properties;
pub use step::{Arg, BuildFactory, Render, RenderedStep, StepDefinition, StepKind};
