//! # Lingo Common
//!
//! Shared types, utilities, and common functionality for Lingo.
//!
//! This crate provides the identifiers, error type, and logging bootstrap
//! used across all other crates in the Lingo workspace.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod logging;
pub mod types;
pub mod utils;

#[cfg(any(test, feature = "testing"))]
pub mod test_utils;

pub use error::{LingoError, Result};
pub use logging::{init_logging, LogFormat, LoggingConfig, LoggingGuard};
pub use types::*;
pub use utils::*;
