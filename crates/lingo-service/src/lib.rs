//! # Lingo Service
//!
//! The read and write paths of localized entities.
//!
//! - [`ProjectionResolver`] turns a base record and its translation rows into
//!   a [`LocalizedView`] for a requested language, following the registry's
//!   fallback chain.
//! - [`LocalizationService`] stores base records and schedules population
//!   without waiting for it.
//! - [`ConsentService`] records consent decisions with their history.
//! - [`ServiceContext`] wires all of it from a [`lingo_config::Config`].

pub mod consent;
pub mod context;
pub mod error;
pub mod localization;
pub mod resolver;
pub mod store;

pub use consent::ConsentService;
pub use context::ServiceContext;
pub use error::{ServiceError, ServiceResult};
pub use localization::{EntityWrite, LocalizationService, LocalizedEntityUpdate, NewLocalizedEntity};
pub use resolver::{LocalizedView, ProjectionResolver};
pub use store::LocalizedStore;
