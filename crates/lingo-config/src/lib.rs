//! # Lingo Config
//!
//! Type-safe configuration management for Lingo.
//!
//! This crate provides configuration loading (YAML or TOML), environment
//! overrides, and validation.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod defaults;
pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::*;
pub use schema::*;
