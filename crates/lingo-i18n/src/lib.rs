//! # Lingo I18n
//!
//! The locale registry: which languages exist, which are supported, and the
//! order in which they are tried when content in the requested language is
//! missing.

pub mod error;
pub mod language;
pub mod negotiation;
pub mod registry;

pub use error::{I18nError, I18nResult};
pub use language::Language;
pub use negotiation::{canonicalize_tag, parse_accept_language, LanguageRange};
pub use registry::LocaleRegistry;
