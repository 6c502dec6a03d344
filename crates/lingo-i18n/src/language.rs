//! Language reference data

use lingo_common::LanguageCode;
use lingo_config::LanguageConfig;
use serde::{Deserialize, Serialize};

use crate::error::{I18nError, I18nResult};
use crate::negotiation::canonicalize_tag;

/// A language content can be stored and served in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    /// Canonical language tag.
    pub code: LanguageCode,
    /// Name of the language in the language itself.
    pub display_name: String,
    /// Right-to-left script.
    pub rtl: bool,
    /// Whether content is populated and served in this language.
    pub supported: bool,
}

impl Language {
    /// A supported, left-to-right language.
    pub fn new(code: LanguageCode, display_name: impl Into<String>) -> Self {
        Self {
            code,
            display_name: display_name.into(),
            rtl: false,
            supported: true,
        }
    }

    /// Builds a language from its configuration entry.
    pub fn from_config(config: &LanguageConfig) -> I18nResult<Self> {
        let code = canonicalize_tag(&config.code)
            .ok_or_else(|| I18nError::InvalidLanguageId(config.code.clone()))?;

        Ok(Self {
            code,
            display_name: config.display_name.clone(),
            rtl: config.rtl,
            supported: config.supported,
        })
    }
}
