//! # Lingo Store
//!
//! SQLite persistence for the localized entity model: base entities,
//! per-language translation rows, the language reference table and the
//! consent record with its append-only history.
//!
//! All access goes through [`SqliteStore`], which implements the
//! [`EntityStore`], [`TranslationStore`], [`LanguageStore`] and
//! [`ConsentStore`] traits.

pub mod consent;
pub mod entity;
pub mod error;
pub mod language;
pub mod models;
pub mod pool;
pub mod schema;
pub mod store;
pub mod translation;

pub use error::{StoreError, StoreResult};
pub use models::*;
pub use pool::SqliteStore;
pub use store::{ConsentStore, EntityStore, LanguageStore, TranslationStore};
